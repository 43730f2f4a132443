use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::error;

use super::{error::ApiError, models::StatsResponse, state::AppState};

/// Reporting endpoint (any method on `/`)
///
/// Records one hit stamped with the store's clock and answers with the
/// number of hits inside the window, this one included.
pub async fn hit(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let at = state.store.now();
    state.recorder.add(at).map_err(|e| {
        error!(error = %e, "Failed to record hit");
        ApiError::from(e)
    })?;

    Ok(state.recorder.len().to_string())
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        window_secs: state.store.window().as_secs_f64(),
        in_window: state.store.len(),
        stored: state.store.stored(),
        durability: state.durability.as_str(),
        metrics: state.metrics.snapshot(),
    })
}
