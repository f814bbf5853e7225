//! Red Square - dodge the bouncing enemies for as long as you can
//!
//! Core modules:
//! - `sim`: Simulation core (rectangles, collisions, enemy bounce, player drag, score)
//! - `platform`: Cooperative timer queue standing in for the toolkit event loop
//! - `settings`: Layered JSON configuration and the typed session settings
//! - `highscores`: Leaderboard storage
//! - `ui`: Screen state machine (Menu, Game, GameEnd, Highscore, Options)

pub mod error;
pub mod highscores;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod ui;

pub use error::{ConfigError, GameError, SessionError, StoreError};
pub use highscores::{FileScoreStore, Leaderboard, ScoreEntry, ScoreId, ScoreOrder, ScoreStore};
pub use settings::{ConfigStore, Difficulty, Settings};
pub use ui::{App, AppEvent, Input, Screen, ScreenKind};

use glam::Vec2;

/// Game timing and layout constants
pub mod consts {
    /// Default enemy tick period (milliseconds)
    pub const ENEMY_TICK_MS: u64 = 20;
    /// Score increments once per second
    pub const SCORE_TICK_MS: u64 = 1000;

    /// Default arena dimensions
    pub const ARENA_WIDTH: f32 = 450.0;
    pub const ARENA_HEIGHT: f32 = 450.0;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 40.0;
    pub const PLAYER_BORDER: f32 = 50.0;
}

/// Conjugate of a vector: (x, -y)
#[inline]
pub fn conjugate(v: Vec2) -> Vec2 {
    Vec2::new(v.x, -v.y)
}

/// Bounce off a horizontal wall (top/bottom): the vertical component flips
#[inline]
pub fn reflect_vertical(v: Vec2) -> Vec2 {
    conjugate(v)
}

/// Bounce off a vertical wall (left/right): the horizontal component flips
#[inline]
pub fn reflect_horizontal(v: Vec2) -> Vec2 {
    -conjugate(v)
}
