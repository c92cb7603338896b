//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info};

use crate::{
    state::{AppState, ResendOutcome, TimerSnapshot},
    timer::Visibility,
};
use super::responses::{ApiResponse, DurationRequest, HealthResponse, ResendStatus, StatusResponse};

/// Map a timer operation result to the JSON response or a 500
fn respond(
    result: Result<TimerSnapshot, String>,
    action: &str,
    message: &str,
) -> Result<Json<ApiResponse>, StatusCode> {
    match result {
        Ok(timer) => {
            info!("{} endpoint called - {}s remaining", action, timer.remaining_seconds);
            Ok(Json(ApiResponse::from_timer(message.to_string(), timer)))
        }
        Err(e) => {
            error!("Failed to {} timer: {}", action, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timer/start - Start the countdown if it has budget left
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    respond(state.start_timer(), "start", "Countdown started")
}

/// Handle POST /timer/stop - Pause the countdown
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    respond(state.stop_timer(), "stop", "Countdown stopped")
}

/// Handle POST /timer/reset - Reset, restarting only when auto-start is configured
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<DurationRequest>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let seconds = body.and_then(|Json(request)| request.seconds);
    respond(state.reset_timer(seconds), "reset", "Countdown reset")
}

/// Handle POST /timer/restart - Reset and start unconditionally
pub async fn restart_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<DurationRequest>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let seconds = body.and_then(|Json(request)| request.seconds);
    respond(state.restart_timer(seconds), "restart", "Countdown restarted")
}

/// Handle POST /visibility/:visibility - Simulate the view being hidden or shown
pub async fn visibility_handler(
    State(state): State<Arc<AppState>>,
    Path(visibility): Path<Visibility>,
) -> Result<Json<ApiResponse>, StatusCode> {
    state.set_visibility(visibility);
    let message = match visibility {
        Visibility::Visible => "View visible",
        Visibility::Hidden => "View hidden",
    };
    // Recompute here so the response already reflects time spent hidden
    respond(state.recover_visibility(visibility), "visibility", message)
}

/// Handle POST /resend - Request a new code if the resend gate allows it
pub async fn resend_handler(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    match state.resend() {
        Ok(ResendOutcome::Sent(timer)) => {
            info!("Resend endpoint called - countdown restarted");
            Ok(Json(ApiResponse::from_timer(
                "New code has been sent".to_string(),
                timer,
            ))
            .into_response())
        }
        Ok(ResendOutcome::Refused(refusal)) => {
            let timer = state.get_timer_snapshot().map_err(|e| {
                error!("Failed to get timer snapshot: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            Ok((
                StatusCode::TOO_MANY_REQUESTS,
                Json(ApiResponse::error(refusal.to_string(), timer)),
            )
                .into_response())
        }
        Err(e) => {
            error!("Failed to resend code: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return current countdown status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.get_timer_snapshot() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to get timer snapshot: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let gate = match state.get_resend_gate() {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to get resend gate: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        resend: ResendStatus::new(&gate, &timer),
        timer,
        visibility: state.visibility(),
        completions: state.completions(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
