//! Error types for the game.
//!
//! Gameplay events (hitting a wall or an enemy) are not errors; they end the
//! session through the normal Game -> GameEnd transition. Everything here is a
//! collaborator failure or a broken invariant.

use std::io;

/// Top-level error returned by the screen state machine.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Score store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session aborted: {0}")]
    Session(#[from] SessionError),
}

/// Failures while reading or validating the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration key: {0}")]
    MissingKey(String),

    #[error("Invalid value at {path}: {reason}")]
    Invalid { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the leaderboard storage.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown score id: {0}")]
    UnknownScore(u64),
}

/// Broken session invariants. These are programming errors and abort the session.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Score timer already started")]
    ScoreAlreadyStarted,

    #[error("Unknown enemy: {0}")]
    UnknownEnemy(usize),
}
