//! Resend gate: decides when a new code may be requested

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TimerSnapshot;

/// How often and how soon a code may be resent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendPolicy {
    /// Countdown length started after each successful resend
    pub window_seconds: u64,
    /// `None` means unlimited resends
    pub max_retries: Option<u32>,
}

/// State of the resend control, derived from the gate and the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResendButtonState {
    Loading,
    Active,
    Expired,
    Ready,
}

/// Reasons a resend request is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResendError {
    #[error("resend available in {remaining_seconds}s")]
    CooldownActive { remaining_seconds: u64 },
    #[error("maximum resend attempts ({max_retries}) reached, please try again later")]
    RetriesExhausted { max_retries: u32 },
    #[error("a resend is already in progress")]
    InProgress,
}

/// Retry bookkeeping for resend requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendGate {
    pub policy: ResendPolicy,
    pub retry_count: u32,
    pub loading: bool,
}

impl ResendGate {
    pub fn new(policy: ResendPolicy) -> Self {
        Self {
            policy,
            retry_count: 0,
            loading: false,
        }
    }

    pub fn retries_exhausted(&self) -> bool {
        self.policy
            .max_retries
            .is_some_and(|max| self.retry_count >= max)
    }

    pub fn button_state(&self, timer: &TimerSnapshot) -> ResendButtonState {
        if self.loading {
            ResendButtonState::Loading
        } else if timer.running && !timer.completed {
            ResendButtonState::Active
        } else if timer.completed {
            ResendButtonState::Expired
        } else {
            ResendButtonState::Ready
        }
    }

    pub fn label(&self, timer: &TimerSnapshot) -> String {
        match self.button_state(timer) {
            ResendButtonState::Loading => "Sending...".to_string(),
            ResendButtonState::Active => format!("Resend in {}", timer.formatted.display),
            ResendButtonState::Expired if self.retries_exhausted() => "Max attempts reached".to_string(),
            _ => "Resend Code".to_string(),
        }
    }

    pub fn is_disabled(&self, timer: &TimerSnapshot) -> bool {
        matches!(
            self.button_state(timer),
            ResendButtonState::Active | ResendButtonState::Loading
        ) || self.retries_exhausted()
    }

    /// Claim the gate for one resend attempt
    pub fn begin_resend(&mut self, timer: &TimerSnapshot) -> Result<(), ResendError> {
        if self.loading {
            return Err(ResendError::InProgress);
        }
        if timer.running && !timer.completed {
            return Err(ResendError::CooldownActive {
                remaining_seconds: timer.remaining_seconds,
            });
        }
        if let Some(max_retries) = self.policy.max_retries {
            if self.retry_count >= max_retries {
                return Err(ResendError::RetriesExhausted { max_retries });
            }
        }

        self.loading = true;
        Ok(())
    }

    /// Release the gate. A successful attempt uses up one retry.
    pub fn finish_resend(&mut self, success: bool) {
        self.loading = false;
        if success {
            self.retry_count += 1;
        }
    }
}
