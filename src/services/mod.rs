//! External collaborators module
//!
//! This module contains the capabilities the countdown timer depends on:
//! a wall clock, a durable key-value store and a frame scheduler.

pub mod clock;
pub mod scheduler;
pub mod store;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{FrameQueue, FrameScheduler, FrameToken};
pub use store::{FileStore, KeyValueStore, MemoryStore};
