//! Wallet provider capability.
//!
//! A provider is whatever answers EIP-1193 style `request` calls on behalf
//! of the user's wallet and announces account/chain changes. The negotiator
//! only ever sees this trait, so a scripted provider can stand in for tests.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::wallet::types::{ProviderError, ProviderResult};

pub const ETH_ACCOUNTS: &str = "eth_accounts";
pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub const ETH_CHAIN_ID: &str = "eth_chainId";
pub const WALLET_ADD_ETHEREUM_CHAIN: &str = "wallet_addEthereumChain";

/// Change notifications a provider may emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The authorized account list changed. Empty means access was revoked.
    AccountsChanged(Vec<String>),
    /// The active chain changed; carries the chain id as reported (hex).
    ChainChanged(String),
    /// The provider lost its connection entirely.
    Disconnected,
}

/// Capability exposed by an injected wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Issue a request. `params` is `Value::Null` when the method takes none.
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value>;

    /// Subscribe to account and chain change events.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Decode an account list response (`["0x..", ...]`).
pub fn parse_accounts(value: Value) -> ProviderResult<Vec<String>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(address) => Ok(address),
                other => Err(ProviderError::new(
                    ProviderError::INTERNAL,
                    format!("Malformed account entry: {}", other),
                )),
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(ProviderError::new(
            ProviderError::INTERNAL,
            format!("Malformed accounts response: {}", other),
        )),
    }
}
