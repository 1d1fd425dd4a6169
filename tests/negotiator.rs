//! Wallet negotiator behaviour against a scripted provider.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use zenrelay::events::{AppEvent, NoticeLevel};
use zenrelay::wallet::provider::{ETH_ACCOUNTS, ETH_CHAIN_ID, ETH_REQUEST_ACCOUNTS};
use zenrelay::wallet::{
    ConnectOutcome, NetworkStatus, ProviderError, ProviderEvent, WalletError,
};

mod common;
use common::{build_app, drain, eventually, fast_config, MockWalletProvider, ADDRESS, MAINNET_HEX};

const OTHER: &str = "0x1111000000000000000000000000000000002222";

#[tokio::test]
async fn test_existing_connection_adopts_first_account() {
    let provider = Arc::new(MockWalletProvider::new().with_authorized(&[ADDRESS, OTHER]));
    let (app, _shutdown) = build_app(fast_config(), Some(provider.clone())).await;

    let snapshot = app.wallet().snapshot();
    assert!(snapshot.session.connected);
    assert_eq!(snapshot.session.address.as_deref(), Some(ADDRESS));
    assert_eq!(snapshot.status, NetworkStatus::Connected);
    assert_eq!(provider.calls(), vec![ETH_ACCOUNTS, ETH_CHAIN_ID]);
}

#[tokio::test]
async fn test_no_existing_connection_leaves_state_untouched() {
    let provider = Arc::new(MockWalletProvider::new());
    let (app, _shutdown) = build_app(fast_config(), Some(provider.clone())).await;

    let snapshot = app.wallet().snapshot();
    assert!(!snapshot.session.connected);
    assert_eq!(snapshot.session.address, None);
    assert_eq!(snapshot.status, NetworkStatus::Disconnected);
    assert_eq!(provider.call_count(ETH_CHAIN_ID), 0);
}

#[tokio::test]
async fn test_status_matches_chain_id_exactly() {
    let cases = [
        (json!("0x20d8"), NetworkStatus::Connected),
        (json!("0x20D8"), NetworkStatus::Connected),
        (json!("20d8"), NetworkStatus::Connected),
        (json!(8408), NetworkStatus::Connected),
        (json!("0x1"), NetworkStatus::WrongNetwork),
        (json!("0x2105"), NetworkStatus::WrongNetwork),
        (json!("0x0"), NetworkStatus::WrongNetwork),
        (json!(1), NetworkStatus::WrongNetwork),
    ];

    for (reported, expected) in cases {
        let provider = Arc::new(
            MockWalletProvider::new()
                .with_authorized(&[ADDRESS])
                .with_chain(reported.clone()),
        );
        let (app, _shutdown) = build_app(fast_config(), Some(provider)).await;
        assert_eq!(
            app.wallet().snapshot().status,
            expected,
            "chain id {reported} should yield {expected:?}"
        );
    }
}

#[tokio::test]
async fn test_disconnect_always_clears_session() {
    let provider = Arc::new(MockWalletProvider::new().with_authorized(&[ADDRESS]));
    let (app, _shutdown) = build_app(fast_config(), Some(provider.clone())).await;
    assert!(app.wallet().is_connected());

    let snapshot = app.wallet().disconnect();
    assert!(!snapshot.session.connected);
    assert_eq!(snapshot.session.address, None);
    assert_eq!(snapshot.status, NetworkStatus::Disconnected);

    // Already disconnected
    let snapshot = app.wallet().disconnect();
    assert!(!snapshot.session.connected);
    assert_eq!(snapshot.status, NetworkStatus::Disconnected);

    // Purely local: nothing beyond the startup check reached the provider.
    assert_eq!(provider.calls(), vec![ETH_ACCOUNTS, ETH_CHAIN_ID]);
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    for chain in [json!("0x20d8"), json!(MAINNET_HEX)] {
        let provider = Arc::new(
            MockWalletProvider::new()
                .with_authorized(&[ADDRESS])
                .with_chain(chain),
        );
        let (app, _shutdown) = build_app(fast_config(), Some(provider)).await;
        let first = app.wallet().reconcile_network().await.unwrap();
        let second = app.wallet().reconcile_network().await.unwrap();
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn test_zenchain_hex_is_connected() {
    let provider = Arc::new(MockWalletProvider::new().with_chain(json!("0x20d8")));
    let (app, _shutdown) = build_app(fast_config(), Some(provider)).await;

    app.wallet().connect().await.unwrap();
    assert_eq!(app.wallet().snapshot().status, NetworkStatus::Connected);
    assert_eq!(app.wallet().snapshot().chain_id, Some(8408));
}

#[tokio::test]
async fn test_mainnet_is_wrong_network() {
    let provider = Arc::new(MockWalletProvider::new().with_chain(json!(MAINNET_HEX)));
    let (app, _shutdown) = build_app(fast_config(), Some(provider)).await;

    app.wallet().connect().await.unwrap();
    let snapshot = app.wallet().snapshot();
    assert!(snapshot.session.connected);
    assert_eq!(snapshot.status, NetworkStatus::WrongNetwork);
    assert_eq!(snapshot.chain_id, Some(1));
}

#[tokio::test]
async fn test_connect_without_provider() {
    let (app, _shutdown) = build_app(fast_config(), None).await;
    let mut events = app.events().subscribe();

    let result = app.wallet().connect().await;
    assert_eq!(result, Err(WalletError::ProviderUnavailable));
    assert!(!app.wallet().snapshot().session.connected);

    let notices: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::Notice(n) => Some(n),
            _ => None,
        })
        .collect();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Wallet not found");
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_connect_adopts_account_then_reconciles() {
    let provider = Arc::new(MockWalletProvider::new());
    let (app, _shutdown) = build_app(fast_config(), Some(provider.clone())).await;

    let outcome = app.wallet().connect().await.unwrap();
    let ConnectOutcome::Connected { snapshot } = outcome else {
        panic!("expected a connection");
    };
    assert!(snapshot.session.connected);
    assert_eq!(snapshot.session.address.as_deref(), Some(ADDRESS));
    assert!(!snapshot.connecting);
    assert_eq!(
        provider.calls(),
        vec![ETH_ACCOUNTS, ETH_REQUEST_ACCOUNTS, ETH_CHAIN_ID]
    );
}

#[tokio::test]
async fn test_connect_publishes_changes_and_notice() {
    let provider = Arc::new(MockWalletProvider::new());
    let (app, _shutdown) = build_app(fast_config(), Some(provider)).await;
    let mut events = app.events().subscribe();

    app.wallet().connect().await.unwrap();

    let events = drain(&mut events);
    assert!(events.contains(&AppEvent::ConnectionChanged { connected: true }));
    assert!(events.contains(&AppEvent::NetworkStatusChanged {
        status: NetworkStatus::Connected
    }));
    assert!(events.iter().any(|e| matches!(
        e,
        AppEvent::Notice(n) if n.title == "Wallet connected" && n.level == NoticeLevel::Success
    )));

    // Reconciling again changes nothing and publishes nothing.
    let mut events = app.events().subscribe();
    app.wallet().reconcile_network().await.unwrap();
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_rejected_connect_reports_provider_message() {
    let provider = Arc::new(MockWalletProvider::new().with_grant(Err(ProviderError::user_rejected())));
    let (app, _shutdown) = build_app(fast_config(), Some(provider.clone())).await;

    let result = app.wallet().connect().await;
    assert_eq!(
        result,
        Err(WalletError::ConnectionRejected("User rejected the request.".into()))
    );
    assert!(!app.wallet().is_connected());
    assert!(!app.wallet().snapshot().connecting);
    assert_eq!(provider.call_count(ETH_CHAIN_ID), 0);
}

#[tokio::test]
async fn test_empty_grant_is_rejected() {
    let provider = Arc::new(MockWalletProvider::new().with_grant(Ok(vec![])));
    let (app, _shutdown) = build_app(fast_config(), Some(provider)).await;

    let result = app.wallet().connect().await;
    assert_eq!(
        result,
        Err(WalletError::ConnectionRejected("Failed to connect wallet".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_connect_is_ignored() {
    let provider = Arc::new(MockWalletProvider::new().with_request_delay(Duration::from_millis(100)));
    let (app, _shutdown) = build_app(fast_config(), Some(provider.clone())).await;

    let wallet = app.wallet();
    let (first, second) = tokio::join!(wallet.connect(), async {
        tokio::task::yield_now().await;
        assert!(wallet.snapshot().connecting);
        wallet.connect().await
    });

    assert!(matches!(first, Ok(ConnectOutcome::Connected { .. })));
    assert_eq!(second, Ok(ConnectOutcome::AlreadyConnecting));
    assert_eq!(provider.call_count(ETH_REQUEST_ACCOUNTS), 1);
    assert!(!wallet.snapshot().connecting);
}

#[tokio::test(start_paused = true)]
async fn test_existing_connection_check_yields_to_pending_connect() {
    let provider = Arc::new(MockWalletProvider::new().with_request_delay(Duration::from_millis(100)));
    let (app, _shutdown) = build_app(fast_config(), Some(provider.clone())).await;
    assert_eq!(provider.call_count(ETH_ACCOUNTS), 1);

    let wallet = app.wallet();
    let (connected, checked) = tokio::join!(wallet.connect(), async {
        tokio::task::yield_now().await;
        wallet.check_existing_connection().await
    });

    assert!(matches!(connected, Ok(ConnectOutcome::Connected { .. })));
    assert!(checked.connecting);
    assert!(!checked.session.connected);
    assert_eq!(provider.call_count(ETH_ACCOUNTS), 1);
    assert_eq!(provider.call_count(ETH_REQUEST_ACCOUNTS), 1);
    assert!(wallet.is_connected());
    assert!(!wallet.snapshot().connecting);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disconnect_racing_chain_change_stays_disconnected() {
    let provider = Arc::new(MockWalletProvider::new());
    let (app, _shutdown) = build_app(fast_config(), Some(provider)).await;
    let wallet = app.wallet().clone();

    for _ in 0..2000 {
        wallet.connect().await.unwrap();

        let chain = {
            let wallet = wallet.clone();
            tokio::spawn(async move {
                wallet.handle_provider_event(ProviderEvent::ChainChanged("0x20d8".to_string()))
            })
        };
        let disconnect = {
            let wallet = wallet.clone();
            tokio::spawn(async move { wallet.disconnect() })
        };
        chain.await.unwrap();
        disconnect.await.unwrap();

        let snapshot = wallet.snapshot();
        assert!(!snapshot.session.connected);
        assert_eq!(snapshot.status, NetworkStatus::Disconnected);
    }
}

#[tokio::test]
async fn test_account_change_after_disconnect_does_not_reconnect() {
    let provider = Arc::new(MockWalletProvider::new().with_authorized(&[ADDRESS]));
    let (app, _shutdown) = build_app(fast_config(), Some(provider)).await;
    let wallet = app.wallet();

    wallet.disconnect();
    wallet.handle_provider_event(ProviderEvent::AccountsChanged(vec![OTHER.to_string()]));
    wallet.handle_provider_event(ProviderEvent::ChainChanged("0x20d8".to_string()));

    let snapshot = wallet.snapshot();
    assert!(!snapshot.session.connected);
    assert_eq!(snapshot.session.address, None);
    assert_eq!(snapshot.status, NetworkStatus::Disconnected);
}

#[tokio::test]
async fn test_add_network_switches_to_target() {
    let provider = Arc::new(
        MockWalletProvider::new()
            .with_chain(json!(MAINNET_HEX))
            .with_add_chain(Ok(()), Some("0x20d8")),
    );
    let (app, _shutdown) = build_app(fast_config(), Some(provider)).await;
    app.wallet().connect().await.unwrap();
    assert_eq!(app.wallet().snapshot().status, NetworkStatus::WrongNetwork);

    let mut events = app.events().subscribe();
    let status = app.wallet().add_target_network().await.unwrap();
    assert_eq!(status, NetworkStatus::Connected);

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        AppEvent::Notice(n) if n.title == "Network added successfully"
    )));
    assert!(events.contains(&AppEvent::NetworkStatusChanged {
        status: NetworkStatus::Connected
    }));
}

#[tokio::test]
async fn test_add_network_failure_keeps_status() {
    let provider = Arc::new(
        MockWalletProvider::new()
            .with_chain(json!(MAINNET_HEX))
            .with_add_chain(Err(ProviderError::user_rejected()), None),
    );
    let (app, _shutdown) = build_app(fast_config(), Some(provider)).await;
    app.wallet().connect().await.unwrap();

    let result = app.wallet().add_target_network().await;
    assert_eq!(
        result,
        Err(WalletError::NetworkRegistrationFailed("User rejected the request.".into()))
    );
    assert_eq!(app.wallet().snapshot().status, NetworkStatus::WrongNetwork);
}

#[tokio::test]
async fn test_chain_query_failure_marks_disconnected() {
    let provider = Arc::new(MockWalletProvider::new().with_authorized(&[ADDRESS]));
    let (app, _shutdown) = build_app(fast_config(), Some(provider.clone())).await;
    assert_eq!(app.wallet().snapshot().status, NetworkStatus::Connected);

    provider.set_chain(Err(ProviderError::new(
        ProviderError::CHAIN_DISCONNECTED,
        "All RPC endpoints failed",
    )));
    let result = app.wallet().reconcile_network().await;
    assert_eq!(
        result,
        Err(WalletError::NetworkQueryFailed("All RPC endpoints failed".into()))
    );

    let snapshot = app.wallet().snapshot();
    assert_eq!(snapshot.status, NetworkStatus::Disconnected);
    assert_eq!(snapshot.chain_id, None);
    // The session itself survives a failed query.
    assert!(snapshot.session.connected);
}

#[tokio::test]
async fn test_unparseable_chain_id_is_query_failure() {
    let provider = Arc::new(
        MockWalletProvider::new()
            .with_authorized(&[ADDRESS])
            .with_chain(json!("zenchain")),
    );
    let (app, _shutdown) = build_app(fast_config(), Some(provider)).await;

    assert!(matches!(
        app.wallet().reconcile_network().await,
        Err(WalletError::NetworkQueryFailed(_))
    ));
    assert_eq!(app.wallet().snapshot().status, NetworkStatus::Disconnected);
}

#[tokio::test]
async fn test_accounts_removed_by_provider() {
    let provider = Arc::new(MockWalletProvider::new().with_authorized(&[ADDRESS]));
    let (app, _shutdown) = build_app(fast_config(), Some(provider.clone())).await;
    assert!(app.wallet().is_connected());

    provider.emit(ProviderEvent::AccountsChanged(vec![]));
    let wallet = app.wallet().clone();
    eventually(|| !wallet.is_connected()).await;
    assert_eq!(wallet.snapshot().status, NetworkStatus::Disconnected);
}

#[tokio::test]
async fn test_account_switch_by_provider() {
    let provider = Arc::new(MockWalletProvider::new().with_authorized(&[ADDRESS]));
    let (app, _shutdown) = build_app(fast_config(), Some(provider.clone())).await;

    provider.emit(ProviderEvent::AccountsChanged(vec![OTHER.to_string()]));
    let wallet = app.wallet().clone();
    eventually(|| wallet.snapshot().session.address.as_deref() == Some(OTHER)).await;
    assert!(wallet.is_connected());
}

#[tokio::test]
async fn test_chain_change_by_provider() {
    let provider = Arc::new(MockWalletProvider::new().with_authorized(&[ADDRESS]));
    let (app, _shutdown) = build_app(fast_config(), Some(provider.clone())).await;
    let mut watch = app.wallet().watch();

    provider.emit(ProviderEvent::ChainChanged(MAINNET_HEX.to_string()));
    tokio::time::timeout(
        Duration::from_secs(1),
        watch.wait_for(|s| s.status == NetworkStatus::WrongNetwork),
    )
    .await
    .unwrap()
    .unwrap();

    provider.emit(ProviderEvent::ChainChanged("0x20d8".to_string()));
    let wallet = app.wallet().clone();
    eventually(|| wallet.snapshot().status == NetworkStatus::Connected).await;
}

#[tokio::test]
async fn test_listener_stops_on_shutdown() {
    let provider = Arc::new(MockWalletProvider::new().with_authorized(&[ADDRESS]));
    let (app, shutdown) = build_app(fast_config(), Some(provider.clone())).await;

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(20)).await;

    provider.emit(ProviderEvent::AccountsChanged(vec![]));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(app.wallet().is_connected());
}
