//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the demo
//! server. All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};

/// Root configuration.
///
/// The target network is not part of it: the wallet must always be on
/// ZenChain Testnet.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub listener: ListenerConfig,

    /// Wallet provider settings.
    pub wallet: WalletConfig,

    /// Simulated swap settings.
    pub swap: SwapConfig,

    /// NFT badge settings.
    pub badge: BadgeConfig,

    /// Suggestion panel settings.
    pub assistant: AssistantConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Wallet provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Install a wallet provider. `false` behaves like a browser without
    /// any wallet extension.
    pub enabled: bool,

    /// RPC endpoints of the chain the wallet starts on. Empty means the
    /// target network's own endpoints.
    pub rpc_urls: Vec<String>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Treat the account as already authorized at startup.
    pub auto_authorize: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rpc_urls: Vec::new(),
            rpc_timeout_secs: 10,
            auto_authorize: false,
        }
    }
}

/// Simulated swap configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SwapConfig {
    /// Fixed exchange rate applied to every pair.
    pub rate: f64,

    /// Displayed slippage tolerance, in percent.
    pub slippage_percent: f64,

    /// Displayed network fee.
    pub network_fee: String,

    /// Simulated execution time in milliseconds.
    pub execution_delay_ms: u64,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            rate: 0.98,
            slippage_percent: 2.0,
            network_fee: "~0.001 ZTC".to_string(),
            execution_delay_ms: 2000,
        }
    }
}

/// NFT badge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BadgeConfig {
    /// Badge contract address.
    pub contract_address: String,

    /// Completed swaps required before minting.
    pub required_swaps: u64,

    /// Simulated mint time in milliseconds.
    pub mint_delay_ms: u64,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            contract_address: "0x4d22778d0EBfc692fbE6D08a3268421c9DfBAd09".to_string(),
            required_swaps: 3,
            mint_delay_ms: 3000,
        }
    }
}

/// Suggestion panel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Simulated analysis time in milliseconds.
    pub analysis_delay_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            analysis_delay_ms: 1500,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
