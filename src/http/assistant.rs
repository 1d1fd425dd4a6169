use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::assistant::{PanelView, RefreshOutcome};
use crate::http::server::AppState;

pub async fn panel(State(state): State<AppState>) -> Json<PanelView> {
    Json(state.app.assistant().view())
}

/// Re-run the analysis. A refresh already underway answers `202`.
pub async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.app.assistant().refresh().await;
    let status = match outcome {
        RefreshOutcome::Refreshed { .. } => StatusCode::OK,
        RefreshOutcome::AlreadyAnalyzing => StatusCode::ACCEPTED,
    };
    (status, Json(outcome))
}
