//! Application state shared by every handler.
//!
//! Wires the wallet negotiator into the swap form and badge widget: both
//! refuse to act without a connected session, and completed swaps feed the
//! badge progress.

use std::sync::Arc;

use crate::assistant::SuggestionPanel;
use crate::badge::{BadgeError, BadgeMinter, BadgeProgress, BadgeResult, MintReceipt};
use crate::config::AppConfig;
use crate::events::{EventBus, Notice};
use crate::swap::{SwapEngine, SwapError, SwapReceipt, SwapRequest, SwapResult};
use crate::wallet::{NetworkDescriptor, WalletNegotiator, WalletProvider};

pub struct DemoApp {
    config: Arc<AppConfig>,
    wallet: Arc<WalletNegotiator>,
    swaps: SwapEngine,
    badge: BadgeMinter,
    assistant: SuggestionPanel,
    events: EventBus,
}

impl DemoApp {
    /// Build all subsystems. `provider` is `None` when no wallet is installed.
    pub fn new(
        config: AppConfig,
        provider: Option<Arc<dyn WalletProvider>>,
    ) -> BadgeResult<Self> {
        let events = EventBus::new();
        let network = Arc::new(NetworkDescriptor::zenchain_testnet());
        let badge = BadgeMinter::new(&config.badge, network.explorer_url())?;
        let wallet = Arc::new(WalletNegotiator::new(provider, network, events.clone()));

        Ok(Self {
            swaps: SwapEngine::new(config.swap.clone()),
            assistant: SuggestionPanel::new(&config.assistant),
            config: Arc::new(config),
            wallet,
            badge,
            events,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn wallet(&self) -> &Arc<WalletNegotiator> {
        &self.wallet
    }

    pub fn swaps(&self) -> &SwapEngine {
        &self.swaps
    }

    pub fn badge(&self) -> &BadgeMinter {
        &self.badge
    }

    pub fn assistant(&self) -> &SuggestionPanel {
        &self.assistant
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Execute a swap for the connected wallet and report the outcome.
    pub async fn swap(&self, request: &SwapRequest) -> SwapResult<SwapReceipt> {
        let result = self.swaps.execute(request, self.wallet.is_connected()).await;
        match &result {
            Ok(receipt) => {
                self.events
                    .notify(Notice::success("Swap successful!", receipt.message.clone()));
            }
            Err(SwapError::WalletNotConnected) => self.events.notify(Notice::error(
                "Wallet not connected",
                "Please connect your wallet first",
            )),
            Err(SwapError::InvalidAmount(_)) => self.events.notify(Notice::error(
                "Invalid amount",
                "Please enter a valid amount to swap",
            )),
            Err(e) => {
                tracing::debug!(error = %e, "Swap rejected");
                self.events.notify(Notice::error("Swap failed", e.to_string()));
            }
        }
        result
    }

    pub fn badge_progress(&self) -> BadgeProgress {
        self.badge
            .progress(self.swaps.swap_count(), self.wallet.is_connected())
    }

    /// Mint a badge if the connected wallet has completed enough swaps.
    pub async fn mint_badge(&self) -> BadgeResult<MintReceipt> {
        let result = self
            .badge
            .mint(self.swaps.swap_count(), self.wallet.is_connected())
            .await;
        match &result {
            Ok(_) => self.events.notify(Notice::success(
                "NFT Badge Minted!",
                "Your OmniHub NFT badge has been successfully minted to your wallet.",
            )),
            Err(BadgeError::MintInProgress) => {}
            Err(e) => self.events.notify(Notice::error("Mint failed", e.to_string())),
        }
        result
    }
}

impl std::fmt::Debug for DemoApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoApp")
            .field("wallet", &self.wallet)
            .field("swaps", &self.swaps)
            .field("badge", &self.badge)
            .finish()
    }
}
