//! Configuration validation.
//!
//! Serde handles syntax; this module checks values: addresses parse, the
//! fee policy keeps the ceiling above the tip, and every timeout is non-zero.
//! All problems are collected rather than stopping at the first.

use alloy::primitives::Address;

use crate::config::schema::AgentConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AgentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new("network.rpc_url", "not a valid URL"));
    }
    for (i, failover) in config.network.failover_urls.iter().enumerate() {
        if failover.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                format!("network.failover_urls[{i}]"),
                "not a valid URL",
            ));
        }
    }
    if config.network.chain_id == 0 {
        errors.push(ValidationError::new("network.chain_id", "must be non-zero"));
    }
    if config.network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be > 0"));
    }

    if config.lending.pool_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new("lending.pool_address", "not a valid address"));
    }
    for (field, limit) in [
        ("lending.approve_gas_limit", config.lending.approve_gas_limit),
        ("lending.supply_gas_limit", config.lending.supply_gas_limit),
        ("lending.borrow_gas_limit", config.lending.borrow_gas_limit),
    ] {
        if limit < 21_000 {
            errors.push(ValidationError::new(field, "must be at least 21000"));
        }
    }

    let fees = &config.lending.fees;
    if fees.ceiling_multiplier == 0 {
        errors.push(ValidationError::new("lending.fees.ceiling_multiplier", "must be > 0"));
    }
    if fees.priority_multiplier > fees.ceiling_multiplier {
        errors.push(ValidationError::new(
            "lending.fees.priority_multiplier",
            "must not exceed ceiling_multiplier",
        ));
    }

    let confirmation = &config.confirmation;
    if confirmation.poll_interval_ms == 0 {
        errors.push(ValidationError::new("confirmation.poll_interval_ms", "must be > 0"));
    }
    if confirmation.max_poll_interval_ms < confirmation.poll_interval_ms {
        errors.push(ValidationError::new(
            "confirmation.max_poll_interval_ms",
            "must be >= poll_interval_ms",
        ));
    }
    if confirmation.max_wait_secs == 0 {
        errors.push(ValidationError::new("confirmation.max_wait_secs", "must be > 0"));
    }

    for (i, token) in config.tokens.iter().enumerate() {
        if token.symbol.trim().is_empty() {
            errors.push(ValidationError::new(format!("tokens[{i}].symbol"), "must not be empty"));
        }
        if token.address.parse::<Address>().is_err() {
            errors.push(ValidationError::new(
                format!("tokens[{i}].address"),
                "not a valid address",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
