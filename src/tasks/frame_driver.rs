//! Frame driver background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::{state::AppState, timer::Visibility};

/// Background task that delivers requested frames to the countdown
///
/// While the view is hidden no frames are delivered, the way a browser
/// throttles a background tab; the visibility recovery task catches up.
pub async fn frame_driver_task(state: Arc<AppState>, frame_interval: Duration) {
    info!("Starting frame driver task ({}ms frames)", frame_interval.as_millis());

    let mut ticker = interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_remaining = None;

    loop {
        ticker.tick().await;

        if state.visibility() == Visibility::Hidden {
            continue;
        }

        let Some(token) = state.frames.take_pending() else {
            continue;
        };

        match state.deliver_frame(token) {
            Ok(snapshot) => {
                if last_remaining != Some(snapshot.remaining_seconds) {
                    debug!("Countdown at {}", snapshot.formatted.display);
                    last_remaining = Some(snapshot.remaining_seconds);
                }
            }
            Err(e) => error!("Failed to deliver frame {:?}: {}", token, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{MemoryStore, SystemClock},
        state::ResendPolicy,
        timer::TimerOptions,
    };

    fn app(seconds: u64) -> Arc<AppState> {
        Arc::new(
            AppState::new(
                0,
                "127.0.0.1".to_string(),
                TimerOptions::new(seconds),
                ResendPolicy { window_seconds: seconds, max_retries: None },
                Arc::new(SystemClock),
                Arc::new(MemoryStore::new()),
            )
            .expect("valid options"),
        )
    }

    #[tokio::test]
    async fn delivers_frames_until_completion() -> anyhow::Result<()> {
        let state = app(1);
        let mut updates = state.timer_update_tx.subscribe();
        let driver = tokio::spawn(frame_driver_task(Arc::clone(&state), Duration::from_millis(10)));

        let completed = tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|snapshot| snapshot.completed),
        )
        .await??
        .clone();

        driver.abort();
        assert_eq!(completed.remaining_seconds, 0);
        assert_eq!(state.completions(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn hidden_view_receives_no_frames() {
        let state = app(60);
        state.set_visibility(Visibility::Hidden);
        let pending = state.frames.pending();
        assert!(pending.is_some());

        let driver = tokio::spawn(frame_driver_task(Arc::clone(&state), Duration::from_millis(5)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        driver.abort();

        assert_eq!(state.frames.pending(), pending);
    }
}
