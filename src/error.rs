//! Crate error types.
//!
//! Configuration problems are collected as a list of [`ConfigError`]s so a
//! user sees every invalid field at once. Ordinary station outcomes (rate
//! limited, no ready battery) are not errors; they are
//! [`SwapAttempt`](crate::sim::station::SwapAttempt) variants.

use std::fmt;

use thiserror::Error;

use crate::sim::types::PolicyViolation;

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"policy.low_threshold"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Newtype so a list of config errors renders one per line.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigErrors(pub Vec<ConfigError>);

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration:\n{0}")]
    Config(ConfigErrors),

    #[error("policy violation: {0}")]
    PolicyViolation(PolicyViolation),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SimError {
    /// Wraps a non-empty list of configuration errors.
    pub fn config(errors: Vec<ConfigError>) -> Self {
        Self::Config(ConfigErrors(errors))
    }
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        Self::config(vec![e])
    }
}

pub type SimResult<T> = Result<T, SimError>;
