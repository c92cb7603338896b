//! Resumable countdown timer
//!
//! The remaining budget is always derived from wall-clock time elapsed since
//! the run started, never from the number of frames seen, so delayed or
//! suspended frames cannot make the countdown drift. Every recomputation
//! (frame or visibility driven) goes through one update-and-check path,
//! which is also the only place completion is detected.

use std::{fmt, sync::Arc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::{
    format::{DisplayFormat, FormattedTime},
    persistence::PersistedDeadline,
};
use crate::{
    services::{Clock, FrameScheduler, FrameToken, KeyValueStore},
    state::{TimerSnapshot, TimerState},
};

/// Countdown configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("countdown duration must be at least one second")]
    ZeroDuration,
}

/// Whether the hosting view is currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Construction options for [`CountdownTimer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerOptions {
    pub initial_seconds: u64,
    pub auto_start: bool,
    /// Store key under which the deadline survives a restart
    pub persist_key: Option<String>,
    pub format: DisplayFormat,
}

impl TimerOptions {
    pub fn new(initial_seconds: u64) -> Self {
        Self {
            initial_seconds,
            auto_start: true,
            persist_key: None,
            format: DisplayFormat::default(),
        }
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn persist_key(mut self, key: impl Into<String>) -> Self {
        self.persist_key = Some(key.into());
        self
    }

    pub fn format(mut self, format: DisplayFormat) -> Self {
        self.format = format;
        self
    }
}

type CompletionCallback = Box<dyn FnMut() + Send>;

pub struct CountdownTimer {
    options: TimerOptions,
    state: TimerState,
    /// Frame this timer is waiting for; any other token is stale
    pending_frame: Option<FrameToken>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn KeyValueStore>,
    scheduler: Arc<dyn FrameScheduler>,
    on_complete: Option<CompletionCallback>,
}

impl fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownTimer")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("pending_frame", &self.pending_frame)
            .field("has_on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl CountdownTimer {
    /// Create a timer, resuming a persisted deadline when one is still in the future.
    ///
    /// Starts immediately when `auto_start` is set.
    pub fn new(
        options: TimerOptions,
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
        scheduler: Arc<dyn FrameScheduler>,
    ) -> Result<Self, TimerError> {
        if options.initial_seconds == 0 {
            return Err(TimerError::ZeroDuration);
        }

        let state = restore_state(&options, clock.as_ref(), store.as_ref());
        let mut timer = Self {
            options,
            state,
            pending_frame: None,
            clock,
            store,
            scheduler,
            on_complete: None,
        };

        if timer.options.auto_start {
            timer.start();
        }

        Ok(timer)
    }

    /// Install the callback invoked once per run when the budget reaches zero
    pub fn with_on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn start(&mut self) {
        if self.state.running || self.state.remaining_seconds == 0 {
            debug!(
                "Ignoring start: running={}, remaining={}",
                self.state.running, self.state.remaining_seconds
            );
            return;
        }

        let now = self.clock.now_millis();
        self.state.running = true;
        self.state.start_reference_millis = now;
        self.state.budget_at_start = self.state.remaining_seconds;

        info!("Countdown started with {}s remaining", self.state.remaining_seconds);
        self.persist(now);
        self.schedule_frame();
    }

    pub fn stop(&mut self) {
        self.cancel_frame();
        if self.state.running {
            self.state.running = false;
            info!("Countdown stopped with {}s remaining", self.state.remaining_seconds);
        }
    }

    /// Reset to the initial duration, restarting only if `auto_start` is set
    pub fn reset(&mut self) {
        self.reset_to(self.options.initial_seconds);
    }

    pub fn reset_to(&mut self, seconds: u64) {
        info!("Resetting countdown to {}s", seconds);
        self.rearm(seconds);
        if self.options.auto_start {
            self.start();
        }
    }

    /// Restart from the initial duration regardless of `auto_start`
    pub fn restart(&mut self) {
        self.restart_with(self.options.initial_seconds);
    }

    pub fn restart_with(&mut self, seconds: u64) {
        info!("Restarting countdown with {}s", seconds);
        self.rearm(seconds);
        self.start();
    }

    /// Deliver a frame requested from the scheduler
    pub fn on_frame(&mut self, token: FrameToken) {
        if self.pending_frame != Some(token) {
            debug!("Ignoring stale frame {:?}, waiting for {:?}", token, self.pending_frame);
            return;
        }

        self.pending_frame = None;
        self.recompute();
    }

    pub fn on_visibility_change(&mut self, visibility: Visibility) {
        match visibility {
            Visibility::Hidden => debug!("View hidden, frames may be throttled"),
            Visibility::Visible if self.state.running => {
                debug!("View visible again, recomputing remaining time");
                self.cancel_frame();
                self.recompute();
            }
            Visibility::Visible => {}
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.state.remaining_seconds
    }

    pub fn total_seconds(&self) -> u64 {
        self.state.total_seconds
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_complete(&self) -> bool {
        self.state.completed
    }

    pub fn formatted(&self) -> FormattedTime {
        self.options.format.format(self.state.remaining_seconds)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::new(&self.state, self.options.format)
    }

    /// Stop and load a fresh budget. Zero is treated as already completed.
    fn rearm(&mut self, seconds: u64) {
        self.stop();
        self.state = TimerState::idle(seconds, seconds);
        self.state.completed = seconds == 0;
        self.clear_persisted();
    }

    fn recompute(&mut self) {
        if !self.state.running {
            return;
        }

        let now = self.clock.now_millis();
        // A clock that moved backwards counts as no time elapsed
        let elapsed_millis = now.saturating_sub(self.state.start_reference_millis).max(0);
        let elapsed = u64::try_from(elapsed_millis / 1000).unwrap_or(0);
        let remaining = self.state.budget_at_start.saturating_sub(elapsed);

        debug!("Recomputed countdown: elapsed={}s, remaining={}s", elapsed, remaining);
        self.state.remaining_seconds = remaining;

        if remaining == 0 {
            self.complete();
        } else {
            self.persist(now);
            self.schedule_frame();
        }
    }

    fn complete(&mut self) {
        if self.state.completed {
            return;
        }

        self.state.completed = true;
        self.state.running = false;
        self.cancel_frame();
        self.clear_persisted();

        info!("Countdown completed");
        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
    }

    fn schedule_frame(&mut self) {
        self.cancel_frame();
        self.pending_frame = Some(self.scheduler.schedule_next());
    }

    fn cancel_frame(&mut self) {
        if let Some(token) = self.pending_frame.take() {
            self.scheduler.cancel(token);
        }
    }

    fn persist(&self, now_millis: i64) {
        if let Some(key) = &self.options.persist_key {
            PersistedDeadline::new(now_millis, self.state.remaining_seconds, self.options.initial_seconds)
                .save(self.store.as_ref(), key);
        }
    }

    fn clear_persisted(&self) {
        if let Some(key) = &self.options.persist_key {
            PersistedDeadline::clear(self.store.as_ref(), key);
        }
    }
}

/// Initial state: the persisted deadline if it still has time left, else a fresh budget
fn restore_state(options: &TimerOptions, clock: &dyn Clock, store: &dyn KeyValueStore) -> TimerState {
    let fresh = TimerState::idle(options.initial_seconds, options.initial_seconds);

    let Some(key) = &options.persist_key else {
        return fresh;
    };
    let Some(deadline) = PersistedDeadline::load(store, key) else {
        return fresh;
    };

    let remaining = deadline.remaining_at(clock.now_millis());
    if remaining == 0 {
        debug!("Persisted deadline '{}' already passed, starting fresh", key);
        PersistedDeadline::clear(store, key);
        return fresh;
    }

    info!("Resuming persisted countdown '{}' with {}s remaining", key, remaining);
    TimerState::idle(deadline.duration.max(remaining), remaining)
}
