//! Platform abstraction layer
//!
//! The game runs on a single logical thread. Everything that would be an
//! `after(ms, callback)` in a windowing toolkit goes through the timer queue
//! here instead, so it can be cancelled and driven by a virtual clock.

pub mod timer;

pub use timer::{CancelHandle, Scheduler};
