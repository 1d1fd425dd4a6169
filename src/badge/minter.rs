//! Simulated NFT badge minting.
//!
//! A badge becomes mintable once the connected wallet has completed the
//! required number of swaps. Minting only waits and counts; nothing is
//! sent on-chain.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::config::BadgeConfig;
use crate::guard::InFlight;
use crate::observability::metrics;
use crate::wallet::types::shorten_address;

/// Errors rejecting a mint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadgeError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("{swaps_needed} more swap(s) needed before minting")]
    NotEligible { swaps_needed: u64 },

    #[error("A mint is already in progress")]
    MintInProgress,

    #[error("Invalid badge contract address: {0}")]
    InvalidContract(String),
}

impl BadgeError {
    pub fn code(&self) -> &'static str {
        match self {
            BadgeError::WalletNotConnected => "wallet_not_connected",
            BadgeError::NotEligible { .. } => "not_eligible",
            BadgeError::MintInProgress => "mint_in_progress",
            BadgeError::InvalidContract(_) => "invalid_contract",
        }
    }
}

/// Result type for badge operations.
pub type BadgeResult<T> = Result<T, BadgeError>;

/// Progress towards the badge, as shown next to the mint button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeProgress {
    pub swap_count: u64,
    pub required_swaps: u64,
    /// 0..=100.
    pub progress_percent: f64,
    pub swaps_needed: u64,
    pub can_mint: bool,
    pub minting: bool,
    pub owned: u64,
    pub status_message: String,
    pub action_label: String,
    pub contract_address: String,
    pub contract_short: String,
    pub explorer_link: Option<String>,
}

/// Result of a completed (simulated) mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    /// Sequential id of the minted badge, starting at 1.
    pub token_id: u64,
    pub owned: u64,
    pub tx_hash: B256,
    pub explorer_link: Option<String>,
}

/// Tracks eligibility and minted badges.
#[derive(Debug)]
pub struct BadgeMinter {
    contract: Address,
    contract_display: String,
    required_swaps: u64,
    mint_delay: Duration,
    explorer_url: Option<String>,
    minted: AtomicU64,
    minting: AtomicBool,
}

impl BadgeMinter {
    /// Create a minter.
    ///
    /// # Arguments
    /// * `config` - Contract address, threshold and simulated delay
    /// * `explorer_url` - Block explorer base URL of the target network
    pub fn new(config: &BadgeConfig, explorer_url: Option<&str>) -> BadgeResult<Self> {
        let contract: Address = config
            .contract_address
            .parse()
            .map_err(|_| BadgeError::InvalidContract(config.contract_address.clone()))?;

        Ok(Self {
            contract,
            contract_display: config.contract_address.clone(),
            required_swaps: config.required_swaps,
            mint_delay: Duration::from_millis(config.mint_delay_ms),
            explorer_url: explorer_url.map(|u| u.trim_end_matches('/').to_string()),
            minted: AtomicU64::new(0),
            minting: AtomicBool::new(false),
        })
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Badges minted so far.
    pub fn owned(&self) -> u64 {
        self.minted.load(Ordering::Acquire)
    }

    /// Explorer page for the badge contract.
    pub fn explorer_link(&self) -> Option<String> {
        self.explorer_url
            .as_ref()
            .map(|base| format!("{}/address/{}", base, self.contract_display))
    }

    /// Compute progress for the given swap count and wallet state.
    pub fn progress(&self, swap_count: u64, wallet_connected: bool) -> BadgeProgress {
        let required = self.required_swaps;
        let can_mint = swap_count >= required && wallet_connected;
        let swaps_needed = required.saturating_sub(swap_count);
        let progress_percent = (swap_count as f64 / required as f64 * 100.0).min(100.0);
        let minting = self.minting.load(Ordering::Acquire);

        let status_message = if can_mint {
            "Ready to mint your NFT badge!".to_string()
        } else {
            format!("{} more {} needed", swaps_needed, plural_swaps(swaps_needed))
        };

        let action_label = if minting {
            "Minting NFT...".to_string()
        } else if !wallet_connected {
            "Connect Wallet to Mint".to_string()
        } else if !can_mint {
            format!("Complete {} More {}", swaps_needed, plural_swaps_title(swaps_needed))
        } else {
            "Mint NFT Badge".to_string()
        };

        BadgeProgress {
            swap_count,
            required_swaps: required,
            progress_percent,
            swaps_needed,
            can_mint,
            minting,
            owned: self.owned(),
            status_message,
            action_label,
            contract_address: self.contract_display.clone(),
            contract_short: shorten_address(&self.contract_display),
            explorer_link: self.explorer_link(),
        }
    }

    /// Mint a badge after the simulated confirmation delay.
    pub async fn mint(&self, swap_count: u64, wallet_connected: bool) -> BadgeResult<MintReceipt> {
        if !wallet_connected {
            return Err(BadgeError::WalletNotConnected);
        }
        if swap_count < self.required_swaps {
            return Err(BadgeError::NotEligible {
                swaps_needed: self.required_swaps - swap_count,
            });
        }

        let _guard = InFlight::acquire(&self.minting).ok_or(BadgeError::MintInProgress)?;
        tracing::debug!(contract = %self.contract, swap_count, "Minting badge");
        tokio::time::sleep(self.mint_delay).await;

        let owned = self.minted.fetch_add(1, Ordering::AcqRel) + 1;
        let mut hash = [0u8; 32];
        fastrand::fill(&mut hash);

        tracing::info!(token_id = owned, contract = %self.contract, "Badge minted");
        metrics::record_badge_minted();

        Ok(MintReceipt {
            token_id: owned,
            owned,
            tx_hash: B256::from(hash),
            explorer_link: self.explorer_link(),
        })
    }
}

fn plural_swaps(n: u64) -> &'static str {
    if n == 1 {
        "swap"
    } else {
        "swaps"
    }
}

fn plural_swaps_title(n: u64) -> &'static str {
    if n == 1 {
        "Swap"
    } else {
        "Swaps"
    }
}
