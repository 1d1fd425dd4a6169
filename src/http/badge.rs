//! Badge progress and minting.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::badge::BadgeProgress;
use crate::http::response::ApiError;
use crate::http::server::AppState;

pub async fn progress(State(state): State<AppState>) -> Json<BadgeProgress> {
    Json(state.app.badge_progress())
}

pub async fn mint(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.app.mint_badge().await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
