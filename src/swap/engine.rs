//! Quote calculation and simulated swap execution.

use alloy::primitives::B256;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::SwapConfig;
use crate::guard::InFlight;
use crate::observability::metrics;
use crate::swap::types::{
    find_token, SwapError, SwapQuote, SwapReceipt, SwapRequest, SwapResult, TokenInfo, TOKENS,
};

/// Engine for quoting and executing simulated swaps.
#[derive(Clone)]
pub struct SwapEngine {
    config: SwapConfig,
    receipts: Arc<DashMap<Uuid, SwapReceipt>>,
    swap_count: Arc<AtomicU64>,
    swapping: Arc<AtomicBool>,
}

impl SwapEngine {
    pub fn new(config: SwapConfig) -> Self {
        Self {
            config,
            receipts: Arc::new(DashMap::new()),
            swap_count: Arc::new(AtomicU64::new(0)),
            swapping: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn tokens(&self) -> &'static [TokenInfo] {
        &TOKENS
    }

    /// Number of swaps completed so far.
    pub fn swap_count(&self) -> u64 {
        self.swap_count.load(Ordering::Acquire)
    }

    pub fn is_swapping(&self) -> bool {
        self.swapping.load(Ordering::Acquire)
    }

    /// Price the request. An empty amount yields an empty output amount.
    pub fn quote(&self, request: &SwapRequest) -> SwapResult<SwapQuote> {
        let (from, to) = resolve_pair(request)?;
        let amount = request.amount.trim();
        let to_amount = if amount.is_empty() {
            String::new()
        } else {
            let value = parse_amount(amount)?;
            format!("{:.4}", value * self.config.rate)
        };

        Ok(SwapQuote {
            from: from.symbol.to_string(),
            to: to.symbol.to_string(),
            from_amount: amount.to_string(),
            to_amount,
            rate: self.config.rate,
            rate_label: format!("1 {} = {} {}", from.symbol, self.config.rate, to.symbol),
            slippage_label: format!("{:.1}%", self.config.slippage_percent),
            network_fee: self.config.network_fee.clone(),
        })
    }

    /// Reverse the pair, exchanging the two amounts as displayed.
    /// The rate is not applied again.
    pub fn flip(&self, request: &SwapRequest) -> SwapResult<SwapQuote> {
        let current = self.quote(request)?;
        Ok(SwapQuote {
            rate_label: format!("1 {} = {} {}", current.to, self.config.rate, current.from),
            from: current.to,
            to: current.from,
            from_amount: current.to_amount,
            to_amount: current.from_amount,
            rate: current.rate,
            slippage_label: current.slippage_label,
            network_fee: current.network_fee,
        })
    }

    /// Run a simulated swap.
    ///
    /// # Arguments
    /// * `request` - Pair and amount from the form
    /// * `wallet_connected` - Whether a wallet session is active
    pub async fn execute(&self, request: &SwapRequest, wallet_connected: bool) -> SwapResult<SwapReceipt> {
        if !wallet_connected {
            metrics::record_swap("rejected");
            return Err(SwapError::WalletNotConnected);
        }

        let amount = request.amount.trim();
        let value = parse_amount(amount)?;
        if value <= 0.0 {
            metrics::record_swap("rejected");
            return Err(SwapError::InvalidAmount(amount.to_string()));
        }
        let quote = self.quote(request)?;

        let guard = InFlight::acquire(&self.swapping).ok_or(SwapError::SwapInProgress)?;

        tracing::debug!(from = %quote.from, to = %quote.to, amount = %amount, "Executing swap");
        tokio::time::sleep(Duration::from_millis(self.config.execution_delay_ms)).await;

        let swap_count = self.swap_count.fetch_add(1, Ordering::AcqRel) + 1;
        drop(guard);

        let receipt = SwapReceipt {
            id: Uuid::new_v4(),
            tx_hash: simulated_tx_hash(),
            message: format!(
                "Swapped {} {} for {} {}",
                quote.from_amount, quote.from, quote.to_amount, quote.to
            ),
            from: quote.from,
            to: quote.to,
            from_amount: quote.from_amount,
            to_amount: quote.to_amount,
            swap_count,
        };

        tracing::info!(
            id = %receipt.id,
            tx_hash = %receipt.tx_hash,
            swap_count,
            "Swap completed"
        );
        metrics::record_swap("success");
        self.receipts.insert(receipt.id, receipt.clone());
        Ok(receipt)
    }

    /// Get a receipt by ID.
    pub fn get_receipt(&self, id: Uuid) -> Option<SwapReceipt> {
        self.receipts.get(&id).map(|r| r.value().clone())
    }
}

impl std::fmt::Debug for SwapEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapEngine")
            .field("rate", &self.config.rate)
            .field("swap_count", &self.swap_count())
            .field("receipts", &self.receipts.len())
            .finish()
    }
}

fn resolve_pair(request: &SwapRequest) -> SwapResult<(&'static TokenInfo, &'static TokenInfo)> {
    let from = find_token(&request.from).ok_or_else(|| SwapError::UnknownToken(request.from.clone()))?;
    let to = find_token(&request.to).ok_or_else(|| SwapError::UnknownToken(request.to.clone()))?;
    if from.symbol == to.symbol {
        return Err(SwapError::SameToken(from.symbol.to_string()));
    }
    Ok((from, to))
}

fn parse_amount(amount: &str) -> SwapResult<f64> {
    match amount.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SwapError::InvalidAmount(amount.to_string())),
    }
}

fn simulated_tx_hash() -> B256 {
    let mut bytes = [0u8; 32];
    fastrand::fill(&mut bytes);
    B256::from(bytes)
}
