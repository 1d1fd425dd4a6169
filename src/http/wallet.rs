//! Wallet and network endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::wallet::{ConnectOutcome, NetworkDescriptor, NetworkStatus, WalletSnapshot};

/// Network status after a reconcile, plus the full wallet state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkResponse {
    pub status: NetworkStatus,
    pub wallet: WalletSnapshot,
}

pub async fn get_network(State(state): State<AppState>) -> Json<NetworkDescriptor> {
    Json(state.app.wallet().network().clone())
}

pub async fn get_wallet(State(state): State<AppState>) -> Json<WalletSnapshot> {
    Json(state.app.wallet().snapshot())
}

pub async fn check_connection(State(state): State<AppState>) -> Json<WalletSnapshot> {
    Json(state.app.wallet().check_existing_connection().await)
}

pub async fn connect(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.app.wallet().connect().await?;
    let status = match outcome {
        ConnectOutcome::Connected { .. } => StatusCode::OK,
        ConnectOutcome::AlreadyConnecting => StatusCode::ACCEPTED,
    };
    Ok((status, Json(outcome)))
}

pub async fn reconcile(State(state): State<AppState>) -> Result<Json<NetworkResponse>, ApiError> {
    let wallet = state.app.wallet();
    let status = wallet.reconcile_network().await?;
    Ok(Json(NetworkResponse {
        status,
        wallet: wallet.snapshot(),
    }))
}

pub async fn add_network(State(state): State<AppState>) -> Result<Json<NetworkResponse>, ApiError> {
    let wallet = state.app.wallet();
    let status = wallet.add_target_network().await?;
    Ok(Json(NetworkResponse {
        status,
        wallet: wallet.snapshot(),
    }))
}

pub async fn disconnect(State(state): State<AppState>) -> Json<WalletSnapshot> {
    Json(state.app.wallet().disconnect())
}
