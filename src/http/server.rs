//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, metrics)
//! - Bind server to listener
//! - Stop accepting on shutdown

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::DemoApp;
use crate::config::ListenerConfig;
use crate::http::{assistant, badge, request, swap, wallet, websocket};
use crate::lifecycle::Shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<DemoApp>,
    pub shutdown: Arc<Shutdown>,
}

/// HTTP front end for the demo application.
pub struct HttpServer {
    router: Router,
    shutdown: Arc<Shutdown>,
}

impl HttpServer {
    pub fn new(app: Arc<DemoApp>, shutdown: Arc<Shutdown>) -> Self {
        let listener_config = app.config().listener.clone();
        let state = AppState {
            app,
            shutdown: shutdown.clone(),
        };
        let router = Self::build_router(&listener_config, state);
        Self { router, shutdown }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ListenerConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/api/network", get(wallet::get_network))
            .route("/api/wallet", get(wallet::get_wallet))
            .route("/api/wallet/check", post(wallet::check_connection))
            .route("/api/wallet/connect", post(wallet::connect))
            .route("/api/wallet/reconcile", post(wallet::reconcile))
            .route("/api/wallet/network", post(wallet::add_network))
            .route("/api/wallet/disconnect", post(wallet::disconnect))
            .route("/api/swap", post(swap::execute))
            .route("/api/swap/tokens", get(swap::list_tokens))
            .route("/api/swap/quote", post(swap::quote))
            .route("/api/swap/flip", post(swap::flip))
            .route("/api/swap/{id}", get(swap::get_receipt))
            .route("/api/badge", get(badge::progress))
            .route("/api/badge/mint", post(badge::mint))
            .route("/api/assistant", get(assistant::panel))
            .route("/api/assistant/refresh", post(assistant::refresh))
            .route("/api/events", get(websocket::events))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
                    .layer(DefaultBodyLimit::max(config.max_body_bytes))
                    .layer(middleware::from_fn(request::track_requests)),
            )
    }

    /// The configured router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut shutdown_rx = self.shutdown.subscribe();
        let already_triggered = self.shutdown.is_triggered();

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                if !already_triggered {
                    let _ = shutdown_rx.recv().await;
                }
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.app.wallet().snapshot();
    Json(json!({
        "status": "ok",
        "network": state.app.wallet().network().chain_name,
        "wallet_provider": state.app.wallet().has_provider(),
        "connected": snapshot.session.connected,
    }))
}
