//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod frame_driver;
pub mod visibility_recovery;

// Re-export main functions
pub use frame_driver::frame_driver_task;
pub use visibility_recovery::visibility_recovery_task;
