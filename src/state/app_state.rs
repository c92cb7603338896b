//! Main application state management

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use super::{ResendError, ResendGate, ResendPolicy, TimerSnapshot};
use crate::{
    services::{Clock, FrameQueue, FrameToken, KeyValueStore},
    timer::{CountdownTimer, TimerError, TimerOptions, Visibility},
};

/// Result of a resend request that reached the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResendOutcome {
    Sent(TimerSnapshot),
    Refused(ResendError),
}

/// Shared state of the server: one countdown, its frame queue and the resend gate
#[derive(Debug)]
pub struct AppState {
    pub timer: Arc<Mutex<CountdownTimer>>,
    /// Frames requested by the timer, drained by the frame driver task
    pub frames: FrameQueue,
    pub resend_gate: Arc<Mutex<ResendGate>>,
    /// Number of countdowns that ran to zero
    pub completions: Arc<AtomicU64>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Current visibility of the simulated view
    pub visibility_tx: watch::Sender<Visibility>,
    /// Channel for timer updates
    pub timer_update_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receivers alive to prevent channel closure
    pub _visibility_rx: watch::Receiver<Visibility>,
    pub _timer_update_rx: watch::Receiver<TimerSnapshot>,
}

impl AppState {
    /// Create the state and its countdown, resuming a persisted deadline if present
    pub fn new(
        port: u16,
        host: String,
        options: TimerOptions,
        policy: ResendPolicy,
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, TimerError> {
        let frames = FrameQueue::new();
        let completions = Arc::new(AtomicU64::new(0));

        let completed = Arc::clone(&completions);
        let timer = CountdownTimer::new(options, clock, store, Arc::new(frames.clone()))?
            .with_on_complete(move || {
                let total = completed.fetch_add(1, Ordering::SeqCst) + 1;
                info!("Code has expired, a new one may be requested (completion #{})", total);
            });

        let initial = timer.snapshot();
        let (timer_update_tx, timer_update_rx) = watch::channel(initial);
        let (visibility_tx, visibility_rx) = watch::channel(Visibility::Visible);

        Ok(Self {
            timer: Arc::new(Mutex::new(timer)),
            frames,
            resend_gate: Arc::new(Mutex::new(ResendGate::new(policy))),
            completions,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            visibility_tx,
            timer_update_tx,
            _visibility_rx: visibility_rx,
            _timer_update_rx: timer_update_rx,
        })
    }

    /// Apply an operation to the timer and publish the resulting snapshot
    pub fn update_timer<F>(&self, action: Option<&str>, updater: F) -> Result<TimerSnapshot, String>
    where
        F: FnOnce(&mut CountdownTimer),
    {
        let mut timer = self.timer.lock()
            .map_err(|e| format!("Failed to lock timer: {}", e))?;

        updater(&mut *timer);
        let snapshot = timer.snapshot();
        drop(timer); // Release the lock early

        if let Some(action) = action {
            self.record_action(action);
        }

        // Notify timer snapshot watchers
        self.timer_update_tx.send_replace(snapshot.clone());

        Ok(snapshot)
    }

    pub fn start_timer(&self) -> Result<TimerSnapshot, String> {
        self.update_timer(Some("start"), CountdownTimer::start)
    }

    pub fn stop_timer(&self) -> Result<TimerSnapshot, String> {
        self.update_timer(Some("stop"), CountdownTimer::stop)
    }

    /// Reset to `seconds`, or to the configured duration when absent
    pub fn reset_timer(&self, seconds: Option<u64>) -> Result<TimerSnapshot, String> {
        self.update_timer(Some("reset"), |timer| match seconds {
            Some(seconds) => timer.reset_to(seconds),
            None => timer.reset(),
        })
    }

    /// Restart with `seconds`, or with the configured duration when absent
    pub fn restart_timer(&self, seconds: Option<u64>) -> Result<TimerSnapshot, String> {
        self.update_timer(Some("restart"), |timer| match seconds {
            Some(seconds) => timer.restart_with(seconds),
            None => timer.restart(),
        })
    }

    /// Hand a scheduled frame to the timer
    pub fn deliver_frame(&self, token: FrameToken) -> Result<TimerSnapshot, String> {
        self.update_timer(None, |timer| timer.on_frame(token))
    }

    /// Forward a visibility notification to the timer
    pub fn recover_visibility(&self, visibility: Visibility) -> Result<TimerSnapshot, String> {
        self.update_timer(None, |timer| timer.on_visibility_change(visibility))
    }

    /// Change the simulated view visibility; watchers of the channel react to it
    pub fn set_visibility(&self, visibility: Visibility) {
        info!("Setting view visibility to: {:?}", visibility);
        self.visibility_tx.send_replace(visibility);
        self.record_action(match visibility {
            Visibility::Visible => "visible",
            Visibility::Hidden => "hidden",
        });
    }

    pub fn visibility(&self) -> Visibility {
        *self.visibility_tx.borrow()
    }

    /// Get current timer snapshot
    pub fn get_timer_snapshot(&self) -> Result<TimerSnapshot, String> {
        self.timer.lock()
            .map(|timer| timer.snapshot())
            .map_err(|e| format!("Failed to lock timer: {}", e))
    }

    pub fn get_resend_gate(&self) -> Result<ResendGate, String> {
        self.resend_gate.lock()
            .map(|gate| gate.clone())
            .map_err(|e| format!("Failed to lock resend gate: {}", e))
    }

    /// Run the resend gate and, when it opens, restart the countdown with the resend window
    pub fn resend(&self) -> Result<ResendOutcome, String> {
        // Gate before timer, everywhere both are held
        let mut gate = self.resend_gate.lock()
            .map_err(|e| format!("Failed to lock resend gate: {}", e))?;

        let current = self.get_timer_snapshot()?;
        if let Err(refusal) = gate.begin_resend(&current) {
            warn!("Resend refused: {}", refusal);
            return Ok(ResendOutcome::Refused(refusal));
        }

        let window = gate.policy.window_seconds;
        let restarted = self.update_timer(Some("resend"), |timer| timer.restart_with(window));
        gate.finish_resend(restarted.is_ok());

        let snapshot = restarted?;
        info!("Code resent ({} used), countdown restarted with {}s", gate.retry_count, window);
        Ok(ResendOutcome::Sent(snapshot))
    }

    pub fn completions(&self) -> u64 {
        self.completions.load(Ordering::SeqCst)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::services::{ManualClock, MemoryStore};

    fn app(clock: &ManualClock, max_retries: Option<u32>) -> AppState {
        AppState::new(
            0,
            "127.0.0.1".to_string(),
            TimerOptions::new(5).persist_key("otp-timer"),
            ResendPolicy { window_seconds: 10, max_retries },
            Arc::new(clock.clone()),
            Arc::new(MemoryStore::new()),
        )
        .expect("valid options")
    }

    fn drive(state: &AppState, clock: &ManualClock, seconds: u64) -> Result<(), String> {
        for _ in 0..seconds {
            clock.advance(Duration::from_secs(1));
            if let Some(token) = state.frames.take_pending() {
                state.deliver_frame(token)?;
            }
        }
        Ok(())
    }

    #[test]
    fn frames_publish_snapshots_and_count_completions() -> Result<(), String> {
        let clock = ManualClock::new(0);
        let state = app(&clock, Some(3));
        let mut updates = state.timer_update_tx.subscribe();

        drive(&state, &clock, 2)?;
        assert!(updates.has_changed().unwrap_or(false));
        assert_eq!(updates.borrow_and_update().remaining_seconds, 3);

        drive(&state, &clock, 10)?;
        assert!(state.get_timer_snapshot()?.completed);
        assert_eq!(state.completions(), 1);
        Ok(())
    }

    #[test]
    fn resend_is_gated_by_countdown_and_retries() -> Result<(), String> {
        let clock = ManualClock::new(0);
        let state = app(&clock, Some(1));

        assert!(matches!(
            state.resend()?,
            ResendOutcome::Refused(ResendError::CooldownActive { remaining_seconds: 5 })
        ));

        drive(&state, &clock, 5)?;
        match state.resend()? {
            ResendOutcome::Sent(snapshot) => {
                assert_eq!(snapshot.remaining_seconds, 10);
                assert!(snapshot.running);
            }
            other => panic!("expected resend to go through, got {:?}", other),
        }

        drive(&state, &clock, 10)?;
        assert!(matches!(
            state.resend()?,
            ResendOutcome::Refused(ResendError::RetriesExhausted { max_retries: 1 })
        ));
        assert_eq!(state.completions(), 2);
        Ok(())
    }

    #[test]
    fn actions_are_recorded() -> Result<(), String> {
        let clock = ManualClock::new(0);
        let state = app(&clock, None);

        state.stop_timer()?;
        state.set_visibility(Visibility::Hidden);

        let (action, time) = state.get_last_action();
        assert_eq!(action.as_deref(), Some("hidden"));
        assert!(time.is_some());
        assert_eq!(state.visibility(), Visibility::Hidden);
        Ok(())
    }

    #[test]
    fn reset_without_seconds_uses_configured_duration() -> Result<(), String> {
        let clock = ManualClock::new(0);
        let state = app(&clock, None);

        assert_eq!(state.restart_timer(Some(42))?.remaining_seconds, 42);
        assert_eq!(state.reset_timer(None)?.remaining_seconds, 5);
        Ok(())
    }
}
