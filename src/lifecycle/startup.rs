//! Startup orchestration.
//!
//! Order: wallet provider → application subsystems → provider event
//! listener → existing-connection check. Any failure here is fatal.

use std::sync::Arc;
use thiserror::Error;

use crate::app::DemoApp;
use crate::badge::BadgeError;
use crate::config::{AppConfig, ConfigError};
use crate::lifecycle::shutdown::Shutdown;
use crate::wallet::{NetworkDescriptor, ProviderError, RpcWalletProvider, WalletProvider};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Wallet provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Badge(#[from] BadgeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the wallet provider described by the configuration.
///
/// Returns `None` when the wallet is disabled, which the negotiator treats
/// as "no wallet extension installed".
pub fn build_provider(config: &AppConfig) -> Result<Option<Arc<dyn WalletProvider>>, ProviderError> {
    if !config.wallet.enabled {
        tracing::info!("Wallet provider disabled");
        return Ok(None);
    }

    let default_urls = NetworkDescriptor::zenchain_testnet().rpc_urls;
    let rpc_urls = if config.wallet.rpc_urls.is_empty() {
        &default_urls
    } else {
        &config.wallet.rpc_urls
    };
    let provider = RpcWalletProvider::from_env(&config.wallet, rpc_urls)?;
    tracing::info!(rpc_urls = ?provider.active_rpc_urls(), "Wallet provider initialized");
    Ok(Some(Arc::new(provider)))
}

/// Create the application and restore any previously authorized session.
pub async fn initialize(
    config: AppConfig,
    provider: Option<Arc<dyn WalletProvider>>,
    shutdown: &Shutdown,
) -> Result<Arc<DemoApp>, StartupError> {
    let app = Arc::new(DemoApp::new(config, provider)?);

    if app.wallet().spawn_event_listener(shutdown.subscribe()).is_some() {
        tracing::debug!("Provider event listener started");
    }

    let snapshot = app.wallet().check_existing_connection().await;
    tracing::info!(
        connected = snapshot.session.connected,
        status = %snapshot.status,
        "Wallet state restored"
    );

    Ok(app)
}
