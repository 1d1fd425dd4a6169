//! Swap endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::swap::{SwapQuote, SwapReceipt, SwapRequest, TokenInfo};

pub async fn list_tokens(State(state): State<AppState>) -> Json<&'static [TokenInfo]> {
    Json(state.app.swaps().tokens())
}

pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> Result<Json<SwapQuote>, ApiError> {
    Ok(Json(state.app.swaps().quote(&request)?))
}

pub async fn flip(
    State(state): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> Result<Json<SwapQuote>, ApiError> {
    Ok(Json(state.app.swaps().flip(&request)?))
}

pub async fn execute(
    State(state): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.app.swap(&request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn get_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SwapReceipt>, ApiError> {
    state
        .app
        .swaps()
        .get_receipt(id)
        .map(Json)
        .ok_or(ApiError::NotFound("Swap receipt"))
}
