//! Wallet connection subsystem.
//!
//! # Data Flow
//! ```text
//! UI action (connect, add network, disconnect)
//!     → negotiator.rs (session + network state machine)
//!     → provider.rs (capability trait: request / subscribe)
//!     → rpc.rs (local signer + JSON-RPC endpoints) or a test double
//!
//! Provider events (accounts / chain changed)
//!     → negotiator.rs → EventBus notifications
//! ```
//!
//! # Constraints
//! - Private keys ONLY from environment variables, never logged
//! - Disconnect is local; providers offer no programmatic revoke
//! - No timeout in the negotiator itself; the RPC provider bounds its own calls

pub mod negotiator;
pub mod provider;
pub mod rpc;
pub mod types;

pub use negotiator::WalletNegotiator;
pub use provider::{ProviderEvent, WalletProvider};
pub use rpc::RpcWalletProvider;
pub use types::{
    ChainId, ConnectOutcome, NativeCurrency, NetworkDescriptor, NetworkStatus, ProviderError,
    WalletError, WalletResult, WalletSession, WalletSnapshot,
};
