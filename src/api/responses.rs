//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    state::{ResendButtonState, ResendGate, TimerSnapshot},
    timer::Visibility,
};

/// Optional body of reset/restart requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DurationRequest {
    pub seconds: Option<u64>,
}

/// API response structure for timer operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, timer: TimerSnapshot) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    /// Create a response whose status reflects the countdown
    pub fn from_timer(message: String, timer: TimerSnapshot) -> Self {
        let status = if timer.completed {
            "completed"
        } else if timer.running {
            "running"
        } else {
            "stopped"
        };
        Self::new(status.to_string(), message, timer)
    }

    /// Create an error response
    pub fn error(message: String, timer: TimerSnapshot) -> Self {
        Self::new("error".to_string(), message, timer)
    }
}

/// Resend control as a client would render it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendStatus {
    pub state: ResendButtonState,
    pub label: String,
    pub disabled: bool,
    pub retry_count: u32,
    pub max_retries: Option<u32>,
}

impl ResendStatus {
    pub fn new(gate: &ResendGate, timer: &TimerSnapshot) -> Self {
        Self {
            state: gate.button_state(timer),
            label: gate.label(timer),
            disabled: gate.is_disabled(timer),
            retry_count: gate.retry_count,
            max_retries: gate.policy.max_retries,
        }
    }
}

/// Status response with countdown, visibility and resend information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub visibility: Visibility,
    pub resend: ResendStatus,
    pub completions: u64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
