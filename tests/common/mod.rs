//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use zenrelay::config::AppConfig;
use zenrelay::events::AppEvent;
use zenrelay::lifecycle::startup;
use zenrelay::wallet::provider::{
    ETH_ACCOUNTS, ETH_CHAIN_ID, ETH_REQUEST_ACCOUNTS, WALLET_ADD_ETHEREUM_CHAIN,
};
use zenrelay::wallet::{ProviderError, ProviderEvent, WalletProvider};
use zenrelay::{DemoApp, HttpServer, Shutdown};

pub const ADDRESS: &str = "0xABCD000000000000000000000000000000001234";
pub const ZENCHAIN_HEX: &str = "0x20d8";
pub const MAINNET_HEX: &str = "0x1";

/// Scripted wallet provider that records every call.
pub struct MockWalletProvider {
    authorized: Mutex<Vec<String>>,
    grant: Mutex<Result<Vec<String>, ProviderError>>,
    chain: Mutex<Result<Value, ProviderError>>,
    add_chain: Mutex<Result<(), ProviderError>>,
    /// Chain reported after a successful `wallet_addEthereumChain`.
    switch_to: Mutex<Option<String>>,
    request_delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<String>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockWalletProvider {
    /// Not yet authorized; grants `ADDRESS` on request; on ZenChain.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            authorized: Mutex::new(Vec::new()),
            grant: Mutex::new(Ok(vec![ADDRESS.to_string()])),
            chain: Mutex::new(Ok(json!(ZENCHAIN_HEX))),
            add_chain: Mutex::new(Ok(())),
            switch_to: Mutex::new(None),
            request_delay: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn with_authorized(self, accounts: &[&str]) -> Self {
        *self.authorized.lock().unwrap() = accounts.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_grant(self, grant: Result<Vec<&str>, ProviderError>) -> Self {
        *self.grant.lock().unwrap() =
            grant.map(|accounts| accounts.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn with_chain(self, chain: Value) -> Self {
        self.set_chain(Ok(chain));
        self
    }

    pub fn with_chain_error(self, error: ProviderError) -> Self {
        self.set_chain(Err(error));
        self
    }

    pub fn with_add_chain(self, result: Result<(), ProviderError>, switch_to: Option<&str>) -> Self {
        *self.add_chain.lock().unwrap() = result;
        *self.switch_to.lock().unwrap() = switch_to.map(str::to_string);
        self
    }

    pub fn with_request_delay(self, delay: Duration) -> Self {
        *self.request_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn set_chain(&self, chain: Result<Value, ProviderError>) {
        *self.chain.lock().unwrap() = chain;
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|m| *m == method).count()
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    async fn request(&self, method: &str, _params: Value) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(method.to_string());
        let delay = *self.request_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match method {
            ETH_ACCOUNTS => Ok(json!(*self.authorized.lock().unwrap())),
            ETH_REQUEST_ACCOUNTS => {
                let grant = self.grant.lock().unwrap().clone();
                let accounts = grant?;
                *self.authorized.lock().unwrap() = accounts.clone();
                Ok(json!(accounts))
            }
            ETH_CHAIN_ID => self.chain.lock().unwrap().clone(),
            WALLET_ADD_ETHEREUM_CHAIN => {
                self.add_chain.lock().unwrap().clone()?;
                if let Some(chain) = self.switch_to.lock().unwrap().clone() {
                    *self.chain.lock().unwrap() = Ok(json!(chain));
                }
                Ok(Value::Null)
            }
            other => Err(ProviderError::unsupported_method(other)),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

/// Config with no artificial delays.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.swap.execution_delay_ms = 0;
    config.badge.mint_delay_ms = 0;
    config.assistant.analysis_delay_ms = 0;
    config
}

/// Build the application around an optional mock provider.
pub async fn build_app(
    config: AppConfig,
    provider: Option<Arc<MockWalletProvider>>,
) -> (Arc<DemoApp>, Arc<Shutdown>) {
    let shutdown = Arc::new(Shutdown::new());
    let provider = provider.map(|p| p as Arc<dyn WalletProvider>);
    let app = startup::initialize(config, provider, &shutdown).await.unwrap();
    (app, shutdown)
}

/// Serve the application on an ephemeral port.
pub async fn spawn_server(app: Arc<DemoApp>, shutdown: Arc<Shutdown>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(app, shutdown);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    addr
}

/// Drain every event currently buffered on a receiver.
pub fn drain(rx: &mut broadcast::Receiver<AppEvent>) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wait until `predicate` holds, polling briefly.
pub async fn eventually<F: Fn() -> bool>(predicate: F) {
    for _ in 0..100 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}
