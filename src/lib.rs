//! ZenRelay: wallet negotiation and demo services for ZenChain Testnet.

pub mod app;
pub mod assistant;
pub mod badge;
pub mod config;
pub mod events;
pub mod guard;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod swap;
pub mod wallet;

pub use app::DemoApp;
pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
