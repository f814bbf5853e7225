//! Survival timer: one point per second alive

use crate::consts::SCORE_TICK_MS;
use crate::error::SessionError;
use crate::platform::{CancelHandle, Scheduler};

/// Elapsed-seconds score of a session
#[derive(Debug, Default)]
pub struct Score {
    pub value: u64,
    started: bool,
    timer: Option<CancelHandle>,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the one-second timer is still armed
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Arm the one-second timer. A score can only ever be started once.
    pub fn start<T>(
        &mut self,
        scheduler: &mut Scheduler<T>,
        payload: T,
    ) -> Result<(), SessionError> {
        if self.started {
            return Err(SessionError::ScoreAlreadyStarted);
        }
        self.started = true;
        self.timer = Some(scheduler.schedule_repeating(SCORE_TICK_MS, payload));
        Ok(())
    }

    /// Count one elapsed second. Ignored once stopped so the value stays frozen.
    pub fn increment(&mut self) {
        if self.timer.is_some() {
            self.value += 1;
        }
    }

    /// Cancel the timer, freezing `value`
    pub fn stop<T>(&mut self, scheduler: &mut Scheduler<T>) {
        if let Some(handle) = self.timer.take() {
            scheduler.cancel(handle);
        }
    }

    pub fn readable(&self) -> String {
        to_readable(self.value)
    }
}

/// Format seconds as `MM:SS`. Minutes are not wrapped: 6000s is "100:00".
pub fn to_readable(value: u64) -> String {
    format!("{:02}:{:02}", value / 60, value % 60)
}
