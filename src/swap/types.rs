//! Swap form types.

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A token offered by the swap form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub symbol: &'static str,
    pub name: &'static str,
    /// Display balance; the demo does not track real holdings.
    pub balance: &'static str,
}

/// Tokens available for swapping, in display order.
pub const TOKENS: [TokenInfo; 4] = [
    TokenInfo {
        symbol: "ZTC",
        name: "ZenChain Token",
        balance: "1,250.00",
    },
    TokenInfo {
        symbol: "USDT",
        name: "Tether USD",
        balance: "500.00",
    },
    TokenInfo {
        symbol: "WETH",
        name: "Wrapped Ethereum",
        balance: "0.75",
    },
    TokenInfo {
        symbol: "DAI",
        name: "Dai Stablecoin",
        balance: "750.00",
    },
];

/// Find a token by symbol (case-insensitive).
pub fn find_token(symbol: &str) -> Option<&'static TokenInfo> {
    TOKENS.iter().find(|t| t.symbol.eq_ignore_ascii_case(symbol))
}

/// The form's current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub from: String,
    pub to: String,
    /// Amount as typed by the user.
    #[serde(default)]
    pub amount: String,
}

impl Default for SwapRequest {
    fn default() -> Self {
        Self {
            from: TOKENS[0].symbol.to_string(),
            to: TOKENS[1].symbol.to_string(),
            amount: String::new(),
        }
    }
}

/// Displayed price information for a pair and amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub from: String,
    pub to: String,
    pub from_amount: String,
    /// Empty when no amount was entered.
    pub to_amount: String,
    pub rate: f64,
    pub rate_label: String,
    pub slippage_label: String,
    pub network_fee: String,
}

/// Result of a completed (simulated) swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub id: Uuid,
    /// Simulated transaction hash.
    pub tx_hash: B256,
    pub from: String,
    pub to: String,
    pub from_amount: String,
    pub to_amount: String,
    /// Completed swaps including this one.
    pub swap_count: u64,
    pub message: String,
}

/// Errors rejecting a swap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Cannot swap {0} for itself")]
    SameToken(String),

    #[error("A swap is already in progress")]
    SwapInProgress,
}

impl SwapError {
    pub fn code(&self) -> &'static str {
        match self {
            SwapError::WalletNotConnected => "wallet_not_connected",
            SwapError::InvalidAmount(_) => "invalid_amount",
            SwapError::UnknownToken(_) => "unknown_token",
            SwapError::SameToken(_) => "same_token",
            SwapError::SwapInProgress => "swap_in_progress",
        }
    }
}

/// Result type for swap operations.
pub type SwapResult<T> = Result<T, SwapError>;
