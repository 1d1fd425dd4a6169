//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and formats. All errors
//! are collected, not just the first.

use alloy::primitives::Address;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::AppConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single invalid setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }

    check_urls("wallet.rpc_urls", &config.wallet.rpc_urls, &mut errors);
    if config.wallet.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("wallet.rpc_timeout_secs", "must be > 0"));
    }

    if !config.swap.rate.is_finite() || config.swap.rate <= 0.0 {
        errors.push(ValidationError::new("swap.rate", "must be a positive number"));
    }
    if !(0.0..=100.0).contains(&config.swap.slippage_percent) {
        errors.push(ValidationError::new("swap.slippage_percent", "must be within 0..=100"));
    }

    if config.badge.contract_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "badge.contract_address",
            format!("'{}' is not an address", config.badge.contract_address),
        ));
    }
    if config.badge.required_swaps == 0 {
        errors.push(ValidationError::new("badge.required_swaps", "must be > 0"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_urls(field: &'static str, urls: &[String], errors: &mut Vec<ValidationError>) {
    for raw in urls {
        match url::Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                field,
                format!("'{}' uses unsupported scheme '{}'", raw, url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(field, format!("'{}': {}", raw, e))),
        }
    }
}
