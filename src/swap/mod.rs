//! Simulated token swaps.
//!
//! Quotes use a fixed rate and execution only waits; no transaction is
//! built or broadcast.

pub mod engine;
pub mod types;

pub use engine::SwapEngine;
pub use types::{SwapError, SwapQuote, SwapReceipt, SwapRequest, SwapResult, TokenInfo, TOKENS};
