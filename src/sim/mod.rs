//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module draws or reads input
//! devices; it is driven by timer payloads and pointer positions:
//! - Time only advances through the scheduler
//! - Enemies are addressed by index, never by reference
//! - Stable iteration order (by enemy id)

pub mod collision;
pub mod rect;
pub mod score;
pub mod state;
pub mod tick;

pub use collision::{WallContact, overlaps, wall_contact, within_border};
pub use rect::Rect;
pub use score::{Score, to_readable};
pub use state::{
    Arena, Enemy, EnemyId, GameOverCause, Player, Session, SessionPhase, Sprite, TimerEvent,
};
pub use tick::{Outcome, enemy_tick, on_drag, on_press};
