//! JSON-RPC backed wallet provider.
//!
//! Server-side stand-in for a browser wallet extension:
//! - Accounts come from a local signer (key from the environment only)
//! - Chain queries go to the active RPC endpoints with timeout and failover
//! - `wallet_addEthereumChain` switches the active endpoints to the new chain
//!
//! Keys are never logged or serialized.

use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::config::schema::WalletConfig;
use crate::wallet::provider::{
    ProviderEvent, WalletProvider, ETH_ACCOUNTS, ETH_CHAIN_ID, ETH_REQUEST_ACCOUNTS,
    WALLET_ADD_ETHEREUM_CHAIN,
};
use crate::wallet::types::{ChainId, ProviderError, ProviderResult};

/// Environment variable holding the wallet's private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "ZENRELAY_WALLET_PRIVATE_KEY";

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// One JSON-RPC endpoint of the active chain.
struct Endpoint {
    url: String,
    provider: Arc<dyn Provider + Send + Sync>,
}

/// `wallet_addEthereumChain` parameter object.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddChainParameter {
    chain_id: String,
    chain_name: String,
    rpc_urls: Vec<String>,
    #[serde(default)]
    block_explorer_urls: Vec<String>,
}

/// Wallet provider backed by a local key and JSON-RPC endpoints.
pub struct RpcWalletProvider {
    endpoints: ArcSwap<Vec<Endpoint>>,
    signer: Option<PrivateKeySigner>,
    authorized: AtomicBool,
    timeout_duration: Duration,
    events: broadcast::Sender<ProviderEvent>,
}

impl RpcWalletProvider {
    /// Create a provider starting on the given RPC endpoints.
    ///
    /// # Arguments
    /// * `config` - Wallet settings (timeouts, auto authorization)
    /// * `rpc_urls` - Endpoints of the chain the wallet starts on
    /// * `signer` - Account signer; `None` means every account request is rejected
    pub fn new(
        config: &WalletConfig,
        rpc_urls: &[String],
        signer: Option<PrivateKeySigner>,
    ) -> ProviderResult<Self> {
        let endpoints = build_endpoints(rpc_urls)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        if let Some(signer) = &signer {
            tracing::info!(address = %signer.address(), "Wallet signer loaded");
        } else {
            tracing::info!("No wallet signer configured, account requests will be rejected");
        }

        Ok(Self {
            endpoints: ArcSwap::from_pointee(endpoints),
            authorized: AtomicBool::new(config.auto_authorize && signer.is_some()),
            signer,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            events,
        })
    }

    /// Create a provider whose signer is read from `ZENRELAY_WALLET_PRIVATE_KEY`.
    pub fn from_env(config: &WalletConfig, rpc_urls: &[String]) -> ProviderResult<Self> {
        let signer = match std::env::var(PRIVATE_KEY_ENV_VAR) {
            Ok(key) => Some(parse_private_key(&key)?),
            Err(_) => None,
        };
        Self::new(config, rpc_urls, signer)
    }

    /// Drop account authorization, as a user revoking site access would.
    pub fn revoke(&self) {
        if self.authorized.swap(false, Ordering::AcqRel) {
            tracing::info!("Wallet authorization revoked");
            let _ = self.events.send(ProviderEvent::AccountsChanged(Vec::new()));
        }
    }

    /// URLs of the endpoints currently in use.
    pub fn active_rpc_urls(&self) -> Vec<String> {
        self.endpoints.load().iter().map(|e| e.url.clone()).collect()
    }

    fn accounts(&self) -> Vec<String> {
        match &self.signer {
            Some(signer) if self.authorized.load(Ordering::Acquire) => {
                vec![signer.address().to_string()]
            }
            _ => Vec::new(),
        }
    }

    fn request_accounts(&self) -> ProviderResult<Vec<String>> {
        if self.signer.is_none() {
            return Err(ProviderError::user_rejected());
        }
        if !self.authorized.swap(true, Ordering::AcqRel) {
            tracing::info!("Wallet account access granted");
            let _ = self.events.send(ProviderEvent::AccountsChanged(self.accounts()));
        }
        Ok(self.accounts())
    }

    /// Query the chain id from the active endpoints, in order.
    async fn chain_id(&self) -> ProviderResult<ChainId> {
        let endpoints = self.endpoints.load_full();
        query_chain_id(&endpoints, self.timeout_duration).await
    }

    async fn add_chain(&self, params: Value) -> ProviderResult<()> {
        let parameter = parse_add_chain_params(params)?;
        let expected = ChainId::from_reported(&Value::String(parameter.chain_id.clone()))
            .map_err(ProviderError::invalid_params)?;

        let endpoints = build_endpoints(&parameter.rpc_urls)?;
        let actual = query_chain_id(&endpoints, self.timeout_duration).await?;
        if actual != expected {
            return Err(ProviderError::invalid_params(format!(
                "Chain ID returned by RPC ({}) does not match {}",
                actual, expected
            )));
        }

        tracing::info!(
            chain_id = %expected,
            chain_name = %parameter.chain_name,
            explorers = parameter.block_explorer_urls.len(),
            "Switched wallet to network"
        );
        self.endpoints.store(Arc::new(endpoints));
        let _ = self.events.send(ProviderEvent::ChainChanged(expected.to_hex()));
        Ok(())
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        tracing::debug!(method, "Wallet provider request");
        match method {
            ETH_ACCOUNTS => Ok(json!(self.accounts())),
            ETH_REQUEST_ACCOUNTS => self.request_accounts().map(|a| json!(a)),
            ETH_CHAIN_ID => self.chain_id().await.map(|id| Value::String(id.to_hex())),
            WALLET_ADD_ETHEREUM_CHAIN => self.add_chain(params).await.map(|_| Value::Null),
            other => Err(ProviderError::unsupported_method(other)),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for RpcWalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcWalletProvider")
            .field("rpc_urls", &self.active_rpc_urls())
            .field("has_signer", &self.signer.is_some())
            .field("authorized", &self.authorized.load(Ordering::Relaxed))
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}

/// Parse a hex private key, with or without `0x`.
pub fn parse_private_key(private_key_hex: &str) -> ProviderResult<PrivateKeySigner> {
    let key_hex = private_key_hex
        .trim()
        .strip_prefix("0x")
        .unwrap_or(private_key_hex.trim());
    key_hex.parse().map_err(|e| {
        ProviderError::new(
            ProviderError::INTERNAL,
            format!("Invalid private key format: {}", e),
        )
    })
}

fn build_endpoints(rpc_urls: &[String]) -> ProviderResult<Vec<Endpoint>> {
    if rpc_urls.is_empty() {
        return Err(ProviderError::invalid_params("At least one RPC URL is required"));
    }

    rpc_urls
        .iter()
        .map(|raw| {
            let url: url::Url = raw.parse().map_err(|e| {
                ProviderError::invalid_params(format!("Invalid RPC URL '{}': {}", raw, e))
            })?;
            Ok(Endpoint {
                url: raw.clone(),
                provider: Arc::new(ProviderBuilder::new().connect_http(url))
                    as Arc<dyn Provider + Send + Sync>,
            })
        })
        .collect()
}

async fn query_chain_id(endpoints: &[Endpoint], limit: Duration) -> ProviderResult<ChainId> {
    for (i, endpoint) in endpoints.iter().enumerate() {
        match timeout(limit, endpoint.provider.get_chain_id()).await {
            Ok(Ok(id)) => return Ok(ChainId(id)),
            Ok(Err(e)) => {
                tracing::warn!(endpoint_idx = i, url = %endpoint.url, error = %e, "RPC error, trying next endpoint");
            }
            Err(_) => {
                tracing::warn!(endpoint_idx = i, url = %endpoint.url, "RPC timeout, trying next endpoint");
            }
        }
    }
    Err(ProviderError::new(
        ProviderError::CHAIN_DISCONNECTED,
        "All RPC endpoints failed",
    ))
}

fn parse_add_chain_params(params: Value) -> ProviderResult<AddChainParameter> {
    let first = match params {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        _ => {
            return Err(ProviderError::invalid_params(
                "Expected a single chain parameter object",
            ))
        }
    };
    serde_json::from_value(first)
        .map_err(|e| ProviderError::invalid_params(format!("Invalid chain parameter: {}", e)))
}
