//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, access log, metrics)
//!     → wallet.rs / swap.rs / badge.rs / assistant.rs (handlers over DemoApp)
//!     → response.rs (error → status + JSON body)
//!     → Send to client
//!
//! websocket.rs: EventBus → JSON frames on /api/events
//! ```

pub mod assistant;
pub mod badge;
pub mod request;
pub mod response;
pub mod server;
pub mod swap;
pub mod wallet;
pub mod websocket;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ErrorBody};
pub use server::{AppState, HttpServer};
