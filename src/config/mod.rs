//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! All fields have defaults, so an empty file (or none) gives a working
//! ZenChain Testnet setup.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, AssistantConfig, BadgeConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    SwapConfig, WalletConfig,
};
