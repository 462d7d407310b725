use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// `GET /-/readiness`
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.db().health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(err) => {
            tracing::error!(error = %err, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}
