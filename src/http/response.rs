//! Error responses.
//!
//! Every subsystem error maps to a status code and a JSON body
//! `{ "error": <code>, "message": <text> }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::badge::BadgeError;
use crate::swap::SwapError;
use crate::wallet::WalletError;

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error(transparent)]
    Badge(#[from] BadgeError),

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Wallet(e) => match e {
                WalletError::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                WalletError::ConnectionRejected(_) => StatusCode::FORBIDDEN,
                WalletError::NetworkQueryFailed(_)
                | WalletError::NetworkRegistrationFailed(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Swap(e) => match e {
                SwapError::WalletNotConnected | SwapError::SwapInProgress => StatusCode::CONFLICT,
                SwapError::InvalidAmount(_)
                | SwapError::UnknownToken(_)
                | SwapError::SameToken(_) => StatusCode::BAD_REQUEST,
            },
            ApiError::Badge(e) => match e {
                BadgeError::WalletNotConnected | BadgeError::MintInProgress => StatusCode::CONFLICT,
                BadgeError::NotEligible { .. } => StatusCode::FORBIDDEN,
                BadgeError::InvalidContract(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Wallet(e) => e.code(),
            ApiError::Swap(e) => e.code(),
            ApiError::Badge(e) => e.code(),
            ApiError::NotFound(_) => "not_found",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "Request failed");
        }
        let body = ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
