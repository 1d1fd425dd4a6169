//! Static swap suggestions ("AI assistant" panel).
//!
//! The panel starts with the first two suggestions. A refresh pretends to
//! analyze for a while and then shows all of them.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::AssistantConfig;
use crate::guard::InFlight;

/// Confidence figure shown under the suggestions.
pub const CONFIDENCE_PERCENT: u8 = 94;

const INITIAL_VISIBLE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Optimization,
    Warning,
    Insight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub title: &'static str,
    pub description: &'static str,
    pub impact: Impact,
}

pub const SUGGESTIONS: [Suggestion; 3] = [
    Suggestion {
        kind: SuggestionKind::Optimization,
        title: "Optimal Fee: 0.25%",
        description: "Current network congestion is low. Reduce slippage tolerance to 0.25% for better rates.",
        impact: Impact::Medium,
    },
    Suggestion {
        kind: SuggestionKind::Insight,
        title: "Price Trend Alert",
        description: "ZTC has increased 3.2% in the last hour. Consider timing your swap carefully.",
        impact: Impact::High,
    },
    Suggestion {
        kind: SuggestionKind::Warning,
        title: "Low Liquidity Pool",
        description: "This trading pair has limited liquidity. Large swaps may experience higher slippage.",
        impact: Impact::Medium,
    },
];

/// What the panel currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub analyzing: bool,
    pub confidence_percent: u8,
    pub suggestions: Vec<Suggestion>,
}

/// Outcome of [`SuggestionPanel::refresh`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Refreshed { view: PanelView },
    AlreadyAnalyzing,
}

#[derive(Debug)]
pub struct SuggestionPanel {
    visible: AtomicUsize,
    analyzing: AtomicBool,
    analysis_delay: Duration,
}

impl SuggestionPanel {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            visible: AtomicUsize::new(INITIAL_VISIBLE),
            analyzing: AtomicBool::new(false),
            analysis_delay: Duration::from_millis(config.analysis_delay_ms),
        }
    }

    pub fn view(&self) -> PanelView {
        let visible = self.visible.load(Ordering::Acquire).min(SUGGESTIONS.len());
        PanelView {
            analyzing: self.analyzing.load(Ordering::Acquire),
            confidence_percent: CONFIDENCE_PERCENT,
            suggestions: SUGGESTIONS[..visible].to_vec(),
        }
    }

    /// Re-run the (simulated) analysis. Ignored while one is running.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(guard) = InFlight::acquire(&self.analyzing) else {
            return RefreshOutcome::AlreadyAnalyzing;
        };
        tokio::time::sleep(self.analysis_delay).await;
        self.visible.store(SUGGESTIONS.len(), Ordering::Release);
        tracing::debug!(suggestions = SUGGESTIONS.len(), "Suggestions refreshed");
        drop(guard);
        RefreshOutcome::Refreshed { view: self.view() }
    }
}
