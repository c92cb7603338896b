//! Countdown timer module
//!
//! This module contains the resumable countdown core, its persisted
//! deadline record and display formatting.

pub mod countdown;
pub mod format;
pub mod persistence;

// Re-export main types
pub use countdown::{CountdownTimer, TimerError, TimerOptions, Visibility};
pub use format::{DisplayFormat, FormattedTime};
pub use persistence::PersistedDeadline;
