//! Error taxonomy for the generation pipeline.
//!
//! Provider-level failures ([`Error::ProviderUnavailable`]) are absorbed by the
//! fallback chain in [`crate::manager::EntropySourceManager`]. Only total
//! exhaustion and input-validation errors escape to the caller.

use std::fmt;

use thiserror::Error;

/// One provider failure observed while serving a single draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Provider name.
    pub provider: String,
    /// Why the provider could not serve the draw.
    pub reason: String,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

/// Errors produced by the core library.
#[derive(Debug, Error)]
pub enum Error {
    /// Entropy request with `minimum > maximum`. Never reaches the network.
    #[error("invalid range: minimum {minimum} exceeds maximum {maximum}")]
    InvalidRange { minimum: i64, maximum: i64 },

    /// A single provider failed (timeout, malformed data, remote error).
    #[error("provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// Every configured provider failed for one draw.
    #[error("could not obtain quantum randomness, try again ({})", format_failures(.failures))]
    AllProvidersExhausted { failures: Vec<ProviderFailure> },

    /// Variation count outside the supported range.
    #[error(
        "variation count {count} outside supported range {}..={}",
        crate::generator::MIN_VARIATIONS,
        crate::generator::MAX_VARIATIONS
    )]
    InvalidCount { count: usize },

    /// Prompt is empty after trimming surrounding whitespace.
    #[error("prompt is empty")]
    EmptyPrompt,

    /// Technique index outside the catalog.
    #[error("technique index {index} out of range for catalog of {size}")]
    IndexOutOfRange { index: usize, size: usize },

    /// The caller cancelled the request before it completed.
    #[error("request cancelled")]
    Cancelled,

    /// Invalid configuration (providers, timeouts, catalog).
    #[error("configuration error: {0}")]
    Config(String),

    /// Export document could not be parsed.
    #[error("export format error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error stems from caller or configuration misuse rather
    /// than from the entropy providers.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRange { .. }
                | Self::InvalidCount { .. }
                | Self::EmptyPrompt
                | Self::IndexOutOfRange { .. }
        )
    }

    /// Stable machine-readable identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRange { .. } => "invalid_range",
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::AllProvidersExhausted { .. } => "all_providers_exhausted",
            Self::InvalidCount { .. } => "invalid_count",
            Self::EmptyPrompt => "empty_prompt",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::Cancelled => "cancelled",
            Self::Config(_) => "config",
            Self::Export(_) => "export",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }

    pub(crate) fn unavailable(provider: &str, reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}

fn format_failures(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no providers configured".to_string();
    }
    failures
        .iter()
        .map(ProviderFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
