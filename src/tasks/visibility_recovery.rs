//! Visibility recovery background task

use std::sync::Arc;
use tracing::{info, warn};

use crate::{state::AppState, timer::Visibility};

/// Background task that forwards visibility changes to the countdown
///
/// Becoming visible forces an immediate recomputation, so time spent hidden
/// shows up at once instead of on the next frame.
pub async fn visibility_recovery_task(state: Arc<AppState>) {
    info!("Starting visibility recovery task");

    let mut visibility_rx = state.visibility_tx.subscribe();

    loop {
        if visibility_rx.changed().await.is_err() {
            warn!("Visibility channel closed, stopping recovery task");
            break;
        }

        let visibility = *visibility_rx.borrow_and_update();
        match state.recover_visibility(visibility) {
            Ok(snapshot) if visibility == Visibility::Visible && snapshot.running => {
                info!("View visible again, countdown recovered at {}", snapshot.formatted.display);
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to recover countdown after visibility change: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::{
        services::{ManualClock, MemoryStore},
        state::ResendPolicy,
        timer::TimerOptions,
    };

    #[tokio::test]
    async fn visible_again_catches_up_hidden_time() -> anyhow::Result<()> {
        let clock = ManualClock::new(0);
        let state = Arc::new(
            AppState::new(
                0,
                "127.0.0.1".to_string(),
                TimerOptions::new(60),
                ResendPolicy { window_seconds: 60, max_retries: None },
                Arc::new(clock.clone()),
                Arc::new(MemoryStore::new()),
            )?,
        );
        let mut updates = state.timer_update_tx.subscribe();
        let task = tokio::spawn(visibility_recovery_task(Arc::clone(&state)));
        // Let the task subscribe before toggling
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        state.set_visibility(Visibility::Hidden);
        clock.advance(Duration::from_secs(30));
        state.set_visibility(Visibility::Visible);

        let recovered = tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|snapshot| snapshot.remaining_seconds == 30),
        )
        .await??
        .clone();

        task.abort();
        assert!(recovered.running);
        Ok(())
    }
}
