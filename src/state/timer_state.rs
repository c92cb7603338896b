//! Timer state structure and its read-only view

use serde::{Deserialize, Serialize};

use crate::timer::{DisplayFormat, FormattedTime};

/// Mutable state of one countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    /// Current budget in whole seconds
    pub remaining_seconds: u64,
    /// Duration the current budget was configured with
    pub total_seconds: u64,
    pub running: bool,
    pub completed: bool,
    /// Epoch milliseconds at which the current run started
    pub start_reference_millis: i64,
    /// Budget held when the current run started; elapsed time is taken off this
    pub budget_at_start: u64,
}

impl TimerState {
    /// Create a stopped, not completed state
    pub fn idle(total_seconds: u64, remaining_seconds: u64) -> Self {
        Self {
            remaining_seconds: remaining_seconds.min(total_seconds),
            total_seconds,
            running: false,
            completed: false,
            start_reference_millis: 0,
            budget_at_start: remaining_seconds.min(total_seconds),
        }
    }
}

/// Read-only view of a countdown, as published to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    pub running: bool,
    pub completed: bool,
    pub format: DisplayFormat,
    pub formatted: FormattedTime,
    /// Whole minutes left
    pub minutes: u64,
    /// Seconds left within the current minute
    pub raw_seconds: u64,
}

impl TimerSnapshot {
    pub fn new(state: &TimerState, format: DisplayFormat) -> Self {
        Self {
            remaining_seconds: state.remaining_seconds,
            total_seconds: state.total_seconds,
            running: state.running,
            completed: state.completed,
            format,
            formatted: format.format(state.remaining_seconds),
            minutes: state.remaining_seconds / 60,
            raw_seconds: state.remaining_seconds % 60,
        }
    }
}
