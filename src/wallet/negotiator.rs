//! Wallet connection lifecycle and network reconciliation.
//!
//! # States
//! ```text
//! Unconnected ──connect──▶ Connected+Matching
//!      ▲                 └▶ Connected+WrongNetwork ──add network──▶ Connected+Matching
//!      └────── disconnect / accounts removed ──────────────────────────┘
//! ```
//!
//! The negotiator is the only writer of the session/status pair. Readers
//! get snapshots or a `watch` receiver.

use serde_json::Value;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::events::{AppEvent, EventBus, Notice};
use crate::guard::InFlight;
use crate::observability::metrics;
use crate::wallet::provider::{
    parse_accounts, ProviderEvent, WalletProvider, ETH_ACCOUNTS, ETH_CHAIN_ID,
    ETH_REQUEST_ACCOUNTS, WALLET_ADD_ETHEREUM_CHAIN,
};
use crate::wallet::types::{
    ChainId, ConnectOutcome, NetworkDescriptor, NetworkStatus, WalletError, WalletResult,
    WalletSession, WalletSnapshot,
};

/// Mediates between the application and the user's wallet provider.
pub struct WalletNegotiator {
    provider: Option<Arc<dyn WalletProvider>>,
    network: Arc<NetworkDescriptor>,
    state: watch::Sender<WalletSnapshot>,
    connecting: AtomicBool,
    events: EventBus,
}

impl WalletNegotiator {
    /// Create a negotiator. `provider` is `None` when no wallet is installed.
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        network: Arc<NetworkDescriptor>,
        events: EventBus,
    ) -> Self {
        let (state, _) = watch::channel(WalletSnapshot::default());
        Self {
            provider,
            network,
            state,
            connecting: AtomicBool::new(false),
            events,
        }
    }

    /// Current session and network status.
    pub fn snapshot(&self) -> WalletSnapshot {
        self.state.borrow().clone()
    }

    /// Watch the session and network status for changes.
    pub fn watch(&self) -> watch::Receiver<WalletSnapshot> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().session.connected
    }

    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Adopt an already-authorized account without prompting the user.
    ///
    /// Absence of a provider or of accounts is the normal first-visit case
    /// and leaves the state untouched. Shares the single-flight slot with
    /// [`Self::connect`]; while either runs the other returns early.
    pub async fn check_existing_connection(&self) -> WalletSnapshot {
        let Some(provider) = self.provider.as_ref() else {
            tracing::debug!("No wallet provider, skipping existing connection check");
            return self.snapshot();
        };

        let Some(guard) = ConnectingGuard::enter(self) else {
            tracing::debug!("Connect in flight, skipping existing connection check");
            metrics::record_wallet_operation("check_existing", "in_flight");
            return self.snapshot();
        };

        let accounts = provider
            .request(ETH_ACCOUNTS, Value::Null)
            .await
            .and_then(parse_accounts);

        match accounts {
            Ok(accounts) => {
                if let Some(address) = accounts.into_iter().next() {
                    tracing::info!(address = %address, "Found authorized wallet account");
                    self.adopt_session(address);
                    metrics::record_wallet_operation("check_existing", "connected");
                    // Failures are already reported by reconcile_network.
                    let _ = self.reconcile_network().await;
                } else {
                    metrics::record_wallet_operation("check_existing", "none");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error checking existing wallet connection");
                metrics::record_wallet_operation("check_existing", "error");
            }
        }

        drop(guard);
        self.snapshot()
    }

    /// Ask the wallet for account access, prompting the user if needed.
    ///
    /// A second call while one is pending is ignored and reported as
    /// [`ConnectOutcome::AlreadyConnecting`].
    pub async fn connect(&self) -> WalletResult<ConnectOutcome> {
        let Some(provider) = self.provider.as_ref() else {
            tracing::warn!("Connect requested but no wallet provider is installed");
            metrics::record_wallet_operation("connect", "unavailable");
            self.events.notify(Notice::error(
                "Wallet not found",
                "Please install a wallet extension to continue",
            ));
            return Err(WalletError::ProviderUnavailable);
        };

        let Some(guard) = ConnectingGuard::enter(self) else {
            tracing::debug!("Connect already in flight, ignoring request");
            metrics::record_wallet_operation("connect", "in_flight");
            return Ok(ConnectOutcome::AlreadyConnecting);
        };

        let accounts = provider
            .request(ETH_REQUEST_ACCOUNTS, Value::Null)
            .await
            .and_then(parse_accounts);

        let address = match accounts {
            Ok(accounts) => accounts.into_iter().next(),
            Err(e) => {
                tracing::warn!(error = %e, code = ?e.code, "Wallet connection failed");
                return Err(self.connection_failed(e.message));
            }
        };

        let Some(address) = address else {
            tracing::warn!("Wallet granted access but returned no accounts");
            return Err(self.connection_failed(String::new()));
        };

        tracing::info!(address = %address, "Wallet connected");
        self.adopt_session(address);
        metrics::record_wallet_operation("connect", "success");
        let _ = self.reconcile_network().await;

        self.events.notify(Notice::success(
            "Wallet connected",
            "Successfully connected to your wallet",
        ));

        drop(guard);
        Ok(ConnectOutcome::Connected {
            snapshot: self.snapshot(),
        })
    }

    /// Compare the provider's active chain against the target network.
    pub async fn reconcile_network(&self) -> WalletResult<NetworkStatus> {
        let Some(provider) = self.provider.as_ref() else {
            self.clear_network();
            return Err(WalletError::ProviderUnavailable);
        };

        let reported = provider
            .request(ETH_CHAIN_ID, Value::Null)
            .await
            .map_err(|e| e.message)
            .and_then(|value| ChainId::from_reported(&value));

        match reported {
            Ok(chain_id) => {
                let status = self.apply_chain_id(chain_id);
                metrics::record_wallet_operation("reconcile", status.as_str());
                Ok(status)
            }
            Err(message) => {
                tracing::warn!(error = %message, "Error checking network");
                metrics::record_wallet_operation("reconcile", "error");
                self.clear_network();
                self.events.notify(Notice::error("Network check failed", message.clone()));
                Err(WalletError::NetworkQueryFailed(message))
            }
        }
    }

    /// Ask the wallet to register the target network, then reconcile.
    pub async fn add_target_network(&self) -> WalletResult<NetworkStatus> {
        let Some(provider) = self.provider.as_ref() else {
            return Err(WalletError::ProviderUnavailable);
        };

        let params = Value::Array(vec![self.network.to_add_chain_params()]);
        if let Err(e) = provider.request(WALLET_ADD_ETHEREUM_CHAIN, params).await {
            tracing::warn!(error = %e, chain_id = self.network.chain_id, "Error adding network");
            metrics::record_wallet_operation("add_network", "error");
            self.events.notify(Notice::error(
                "Failed to add network",
                format!("Please add {} manually in your wallet", self.network.chain_name),
            ));
            return Err(WalletError::NetworkRegistrationFailed(e.message));
        }

        tracing::info!(chain_id = self.network.chain_id, "Target network registered with wallet");
        metrics::record_wallet_operation("add_network", "success");
        self.events.notify(Notice::success(
            "Network added successfully",
            format!("{} has been added to your wallet", self.network.chain_name),
        ));

        self.reconcile_network().await
    }

    /// Forget the session locally. Wallets expose no programmatic revoke,
    /// so the provider is not contacted.
    pub fn disconnect(&self) -> WalletSnapshot {
        let _ = self.reset_session();
        metrics::record_wallet_operation("disconnect", "success");
        self.events.notify(Notice::success(
            "Wallet disconnected",
            "Successfully disconnected from your wallet",
        ));
        self.snapshot()
    }

    /// Apply an account or chain change reported by the provider.
    pub fn handle_provider_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                None => {
                    if self.reset_session() {
                        tracing::info!("Wallet accounts removed by provider");
                        self.events.notify(Notice::error(
                            "Wallet disconnected",
                            "Account access was revoked in your wallet",
                        ));
                    }
                }
                Some(address) => {
                    let log_address = address.clone();
                    if self.switch_account(address) {
                        tracing::info!(address = %log_address, "Active wallet account changed");
                    }
                }
            },
            ProviderEvent::ChainChanged(raw) => {
                match ChainId::from_reported(&Value::String(raw)) {
                    Ok(chain_id) => {
                        let status = self.apply_chain_id(chain_id);
                        tracing::info!(chain_id = %chain_id, status = %status, "Wallet chain changed");
                    }
                    Err(e) => tracing::warn!(error = %e, "Ignoring unparseable chain change"),
                }
            }
            ProviderEvent::Disconnected => {
                tracing::info!("Wallet provider disconnected");
                let _ = self.reset_session();
            }
        }
    }

    /// Forward provider events into [`Self::handle_provider_event`] until
    /// shutdown. Returns `None` when there is no provider to listen to.
    pub fn spawn_event_listener(
        self: &Arc<Self>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Option<JoinHandle<()>> {
        let mut events = self.provider.as_ref()?.subscribe();
        let negotiator = Arc::clone(self);

        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Ok(event) => negotiator.handle_provider_event(event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Provider event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = shutdown.recv() => break,
                }
            }
            tracing::debug!("Provider event listener stopped");
        }))
    }

    fn connection_failed(&self, message: String) -> WalletError {
        metrics::record_wallet_operation("connect", "rejected");
        let description = if message.is_empty() {
            "Failed to connect wallet".to_string()
        } else {
            message.clone()
        };
        self.events.notify(Notice::error("Connection failed", description.clone()));
        WalletError::ConnectionRejected(description)
    }

    fn adopt_session(&self, address: String) {
        let mut became_connected = false;
        self.state.send_if_modified(|s| {
            if s.session.address.as_deref() == Some(address.as_str()) && s.session.connected {
                return false;
            }
            became_connected = !s.session.connected;
            s.session = WalletSession::connected(address);
            true
        });
        if became_connected {
            self.events.publish(AppEvent::ConnectionChanged { connected: true });
        }
    }

    /// Move to the active account without ever creating a session.
    fn switch_account(&self, address: String) -> bool {
        self.state.send_if_modified(|s| {
            if !s.session.connected || s.session.address.as_deref() == Some(address.as_str()) {
                return false;
            }
            s.session = WalletSession::connected(address);
            true
        })
    }

    // Each state helper reads and writes inside one closure so a concurrent
    // disconnect cannot slip between deriving a status and storing it.

    /// Returns whether a session was actually ended.
    fn reset_session(&self) -> bool {
        let mut was_connected = false;
        let mut status_changed = false;
        self.state.send_modify(|s| {
            was_connected = s.session.connected;
            status_changed = s.status != NetworkStatus::Disconnected;
            s.session = WalletSession::default();
            s.chain_id = None;
            s.status = NetworkStatus::Disconnected;
        });
        if was_connected {
            self.events.publish(AppEvent::ConnectionChanged { connected: false });
        }
        self.publish_status(NetworkStatus::Disconnected, status_changed);
        was_connected
    }

    fn apply_chain_id(&self, chain_id: ChainId) -> NetworkStatus {
        let target = self.network.chain_id();
        let mut status = NetworkStatus::Disconnected;
        let mut status_changed = false;
        self.state.send_if_modified(|s| {
            status = NetworkStatus::derive(s.session.connected, chain_id, target);
            status_changed = s.status != status;
            let modified = status_changed || s.chain_id != Some(chain_id.0);
            s.chain_id = Some(chain_id.0);
            s.status = status;
            modified
        });
        self.publish_status(status, status_changed);
        status
    }

    fn clear_network(&self) {
        let mut status_changed = false;
        self.state.send_if_modified(|s| {
            status_changed = s.status != NetworkStatus::Disconnected;
            let modified = status_changed || s.chain_id.is_some();
            s.chain_id = None;
            s.status = NetworkStatus::Disconnected;
            modified
        });
        self.publish_status(NetworkStatus::Disconnected, status_changed);
    }

    fn publish_status(&self, status: NetworkStatus, changed: bool) {
        metrics::record_network_status(status);
        if changed {
            self.events.publish(AppEvent::NetworkStatusChanged { status });
        }
    }
}

impl std::fmt::Debug for WalletNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletNegotiator")
            .field("has_provider", &self.provider.is_some())
            .field("chain_id", &self.network.chain_id)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

/// Marks a connect attempt as pending in the snapshot until it ends,
/// however it ends.
struct ConnectingGuard<'a> {
    negotiator: &'a WalletNegotiator,
    _in_flight: InFlight<'a>,
}

impl<'a> ConnectingGuard<'a> {
    fn enter(negotiator: &'a WalletNegotiator) -> Option<Self> {
        let in_flight = InFlight::acquire(&negotiator.connecting)?;
        negotiator.state.send_modify(|s| s.connecting = true);
        Some(Self {
            negotiator,
            _in_flight: in_flight,
        })
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.negotiator.state.send_modify(|s| s.connecting = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::types::{ProviderError, ProviderResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Provider answering from fixed values.
    struct FixedProvider {
        accounts: Vec<String>,
        chain_id: Mutex<ProviderResult<Value>>,
        events: broadcast::Sender<ProviderEvent>,
    }

    impl FixedProvider {
        fn new(accounts: &[&str], chain_id: &str) -> Self {
            let (events, _) = broadcast::channel(8);
            Self {
                accounts: accounts.iter().map(|a| a.to_string()).collect(),
                chain_id: Mutex::new(Ok(json!(chain_id))),
                events,
            }
        }
    }

    #[async_trait]
    impl WalletProvider for FixedProvider {
        async fn request(&self, method: &str, _params: Value) -> ProviderResult<Value> {
            match method {
                ETH_ACCOUNTS | ETH_REQUEST_ACCOUNTS => Ok(json!(self.accounts)),
                ETH_CHAIN_ID => self.chain_id.lock().unwrap().clone(),
                WALLET_ADD_ETHEREUM_CHAIN => Ok(Value::Null),
                other => Err(ProviderError::unsupported_method(other)),
            }
        }

        fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
            self.events.subscribe()
        }
    }

    fn negotiator(provider: Option<FixedProvider>) -> WalletNegotiator {
        WalletNegotiator::new(
            provider.map(|p| Arc::new(p) as Arc<dyn WalletProvider>),
            Arc::new(NetworkDescriptor::zenchain_testnet()),
            EventBus::new(),
        )
    }

    #[tokio::test]
    async fn test_initial_state_is_unconnected() {
        let negotiator = negotiator(Some(FixedProvider::new(&[], "0x20d8")));
        let snapshot = negotiator.snapshot();
        assert!(!snapshot.session.connected);
        assert_eq!(snapshot.session.address, None);
        assert_eq!(snapshot.status, NetworkStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_on_target_chain() {
        let negotiator = negotiator(Some(FixedProvider::new(&["0xabc"], "0x20d8")));
        let outcome = negotiator.connect().await.unwrap();
        let ConnectOutcome::Connected { snapshot } = outcome else {
            panic!("expected a connected outcome");
        };
        assert_eq!(snapshot.session.address.as_deref(), Some("0xabc"));
        assert_eq!(snapshot.status, NetworkStatus::Connected);
        assert_eq!(snapshot.chain_id, Some(8408));
        assert!(!snapshot.connecting);
    }

    #[tokio::test]
    async fn test_reconcile_failure_marks_disconnected() {
        let provider = FixedProvider::new(&["0xabc"], "0x20d8");
        *provider.chain_id.lock().unwrap() = Err(ProviderError::new(-32603, "boom"));
        let negotiator = negotiator(Some(provider));
        negotiator.connect().await.unwrap();

        let err = negotiator.reconcile_network().await.unwrap_err();
        assert_eq!(err, WalletError::NetworkQueryFailed("boom".into()));
        assert_eq!(negotiator.snapshot().status, NetworkStatus::Disconnected);
        // The session itself survives a failed chain query.
        assert!(negotiator.is_connected());
    }

    #[tokio::test]
    async fn test_chain_changed_event_rederives_status() {
        let negotiator = negotiator(Some(FixedProvider::new(&["0xabc"], "0x20d8")));
        negotiator.connect().await.unwrap();

        negotiator.handle_provider_event(ProviderEvent::ChainChanged("0x1".into()));
        assert_eq!(negotiator.snapshot().status, NetworkStatus::WrongNetwork);

        negotiator.handle_provider_event(ProviderEvent::ChainChanged("0x20d8".into()));
        assert_eq!(negotiator.snapshot().status, NetworkStatus::Connected);
    }

    #[tokio::test]
    async fn test_chain_changed_while_unconnected_stays_disconnected() {
        let negotiator = negotiator(Some(FixedProvider::new(&[], "0x20d8")));
        negotiator.handle_provider_event(ProviderEvent::ChainChanged("0x20d8".into()));
        assert_eq!(negotiator.snapshot().status, NetworkStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_reconcile_without_provider() {
        let negotiator = negotiator(None);
        assert_eq!(
            negotiator.reconcile_network().await,
            Err(WalletError::ProviderUnavailable)
        );
        assert_eq!(
            negotiator.add_target_network().await,
            Err(WalletError::ProviderUnavailable)
        );
    }

    #[tokio::test]
    async fn test_watch_observes_connection() {
        let negotiator = negotiator(Some(FixedProvider::new(&["0xabc"], "0x20d8")));
        let mut rx = negotiator.watch();
        negotiator.connect().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().session.connected);
    }
}
