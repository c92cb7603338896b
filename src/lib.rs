//! Resumable Countdown - a countdown timer that survives restarts and suspension
//!
//! This library provides a countdown whose remaining time is always derived
//! from wall-clock time, persists its deadline in a key-value store, and
//! catches up after its view has been hidden. The binary serves one such
//! countdown, gating code resends, over HTTP.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
pub use api::create_router;
pub use timer::{CountdownTimer, TimerOptions, Visibility};
pub use utils::signals::shutdown_signal;
