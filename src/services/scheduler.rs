//! Frame scheduling primitives

use std::sync::{Arc, Mutex};
use tracing::warn;

/// Handle to one requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Requests a callback on the next display/update frame
///
/// The host delivers a requested frame by handing its token back to the
/// requester. Cancelled tokens must never be delivered, although the
/// requester still has to tolerate a late one.
pub trait FrameScheduler: Send + Sync {
    fn schedule_next(&self) -> FrameToken;
    fn cancel(&self, token: FrameToken);
}

#[derive(Debug, Default)]
struct QueueInner {
    next_id: u64,
    pending: Option<FrameToken>,
}

/// Single-slot frame queue shared between a timer and whoever drives frames
///
/// Only the most recent request is kept; scheduling again replaces it.
#[derive(Debug, Clone, Default)]
pub struct FrameQueue {
    inner: Arc<Mutex<QueueInner>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the pending frame, if any
    pub fn take_pending(&self) -> Option<FrameToken> {
        self.inner.lock().ok()?.pending.take()
    }

    /// Peek at the pending frame
    pub fn pending(&self) -> Option<FrameToken> {
        self.inner.lock().ok()?.pending
    }
}

impl FrameScheduler for FrameQueue {
    fn schedule_next(&self) -> FrameToken {
        match self.inner.lock() {
            Ok(mut inner) => {
                inner.next_id += 1;
                let token = FrameToken(inner.next_id);
                inner.pending = Some(token);
                token
            }
            Err(e) => {
                // Never delivered, so the requester just stops receiving frames
                warn!("Failed to lock frame queue: {}", e);
                FrameToken(0)
            }
        }
    }

    fn cancel(&self, token: FrameToken) {
        if let Ok(mut inner) = self.inner.lock() {
            if inner.pending == Some(token) {
                inner.pending = None;
            }
        }
    }
}
