//! Wallet session, network and error types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Parse a chain id as reported by a wallet provider.
    ///
    /// Providers answer `eth_chainId` with a `0x`-prefixed hex string. Bare
    /// strings are read as hex as well; JSON numbers are taken as-is.
    pub fn from_reported(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => {
                let trimmed = s.trim();
                let digits = trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                    .unwrap_or(trimmed);
                // from_str_radix tolerates a leading '+'; chain ids never carry a sign.
                if digits.starts_with(['+', '-']) {
                    return Err(format!("Invalid chain id '{}': unexpected sign", s));
                }
                u64::from_str_radix(digits, 16)
                    .map(Self)
                    .map_err(|e| format!("Invalid chain id '{}': {}", s, e))
            }
            Value::Number(n) => n
                .as_u64()
                .map(Self)
                .ok_or_else(|| format!("Invalid chain id {}", n)),
            other => Err(format!("Unexpected chain id payload: {}", other)),
        }
    }

    /// Hex form used on the provider wire (`0x20d8`).
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Native currency of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Target chain the application requires.
///
/// Fixed to [`NetworkDescriptor::zenchain_testnet`]; not configurable.
/// Shared behind an `Arc` and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl NetworkDescriptor {
    /// ZenChain Testnet, the network the demo runs against.
    pub fn zenchain_testnet() -> Self {
        Self {
            chain_id: 8408,
            chain_name: "ZenChain Testnet".to_string(),
            native_currency: NativeCurrency {
                name: "ZTC".to_string(),
                symbol: "ZTC".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://zenchain-testnet.api.onfinality.io/public".to_string()],
            block_explorer_urls: vec!["https://zenchain-testnet.blockscout.com/".to_string()],
        }
    }

    pub fn chain_id(&self) -> ChainId {
        ChainId(self.chain_id)
    }

    /// Parameter object for `wallet_addEthereumChain` (EIP-3085 layout).
    pub fn to_add_chain_params(&self) -> Value {
        json!({
            "chainId": self.chain_id().to_hex(),
            "chainName": self.chain_name,
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "rpcUrls": self.rpc_urls,
            "blockExplorerUrls": self.block_explorer_urls,
        })
    }

    /// First explorer URL, if any.
    pub fn explorer_url(&self) -> Option<&str> {
        self.block_explorer_urls.first().map(String::as_str)
    }
}

/// Network state relative to the target chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkStatus {
    Connected,
    Disconnected,
    WrongNetwork,
}

impl NetworkStatus {
    /// `Connected` only for a connected session on the expected chain.
    pub fn derive(session_connected: bool, reported: ChainId, expected: ChainId) -> Self {
        if !session_connected {
            NetworkStatus::Disconnected
        } else if reported == expected {
            NetworkStatus::Connected
        } else {
            NetworkStatus::WrongNetwork
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkStatus::Connected => "connected",
            NetworkStatus::Disconnected => "disconnected",
            NetworkStatus::WrongNetwork => "wrong-network",
        }
    }
}

impl std::fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local record of the connected wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    pub address: Option<String>,
    pub connected: bool,
}

impl WalletSession {
    pub fn connected(address: String) -> Self {
        Self {
            address: Some(address),
            connected: true,
        }
    }
}

/// Read-only view of the negotiator state handed to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub session: WalletSession,
    pub status: NetworkStatus,
    /// Last chain id the provider reported, if any.
    pub chain_id: Option<u64>,
    /// A `connect()` is currently awaiting the provider.
    pub connecting: bool,
}

impl Default for WalletSnapshot {
    fn default() -> Self {
        Self {
            session: WalletSession::default(),
            status: NetworkStatus::Disconnected,
            chain_id: None,
            connecting: false,
        }
    }
}

/// Result of a `connect()` call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConnectOutcome {
    /// Accounts were granted and the network reconciled.
    Connected { snapshot: WalletSnapshot },
    /// Another connect request is still pending; this one was ignored.
    AlreadyConnecting,
}

/// Error object returned by a wallet provider (EIP-1193 shape).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(Self::USER_REJECTED, "User rejected the request.")
    }

    pub fn unsupported_method(method: &str) -> Self {
        Self::new(
            Self::UNSUPPORTED_METHOD,
            format!("The provider does not support the requested method: {}", method),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, message)
    }
}

/// Failures surfaced by the wallet negotiator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No wallet provider is present in the environment.
    #[error("No wallet provider detected")]
    ProviderUnavailable,

    /// The user or provider declined the account request.
    #[error("Connection rejected: {0}")]
    ConnectionRejected(String),

    /// The active chain could not be queried.
    #[error("Network query failed: {0}")]
    NetworkQueryFailed(String),

    /// The provider refused to register the target network.
    #[error("Network registration failed: {0}")]
    NetworkRegistrationFailed(String),
}

impl WalletError {
    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::ProviderUnavailable => "provider_unavailable",
            WalletError::ConnectionRejected(_) => "connection_rejected",
            WalletError::NetworkQueryFailed(_) => "network_query_failed",
            WalletError::NetworkRegistrationFailed(_) => "network_registration_failed",
        }
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

/// Result type for raw provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Shorten an address for display: `0x4d22...Ad09`.
pub fn shorten_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}
