//! State management module
//!
//! This module contains the countdown state, the resend gate and the shared
//! application state built around them.

pub mod app_state;
pub mod resend_state;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, ResendOutcome};
pub use resend_state::{ResendButtonState, ResendError, ResendGate, ResendPolicy};
pub use timer_state::{TimerSnapshot, TimerState};
