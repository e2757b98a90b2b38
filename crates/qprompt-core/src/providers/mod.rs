//! Entropy provider implementations backed by public randomness APIs.

pub mod anu;
pub mod random_org;

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use anu::AnuProvider;
pub use random_org::RandomOrgProvider;

/// Default per-attempt timeout for provider calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Wire protocol spoken by a configured provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// ANU Quantum Random Numbers JSON API.
    Anu,
    /// Random.org plain-text integer API.
    RandomOrg,
    /// Any server speaking the ANU JSON format (e.g. a self-hosted QRNG).
    AnuCompatible,
}

impl ProviderKind {
    /// Endpoint used when the configuration does not name one.
    pub fn default_endpoint(self) -> Option<&'static str> {
        match self {
            Self::Anu => Some(anu::DEFAULT_ENDPOINT),
            Self::RandomOrg => Some(random_org::DEFAULT_ENDPOINT),
            Self::AnuCompatible => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anu => write!(f, "anu"),
            Self::RandomOrg => write!(f, "random_org"),
            Self::AnuCompatible => write!(f, "anu_compatible"),
        }
    }
}

/// Build the blocking HTTP client shared by one provider's calls.
pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("qprompt/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))
}

/// Turn a transport result into a successful response or `ProviderUnavailable`.
pub(crate) fn check_response(
    provider: &str,
    result: reqwest::Result<Response>,
) -> Result<Response> {
    let response = result.map_err(|e| {
        if e.is_timeout() {
            Error::unavailable(provider, "request timed out")
        } else {
            Error::unavailable(provider, format!("request failed: {e}"))
        }
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::unavailable(provider, format!("HTTP {status}")));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display_matches_serde_names() {
        for kind in [
            ProviderKind::Anu,
            ProviderKind::RandomOrg,
            ProviderKind::AnuCompatible,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn test_compatible_kind_has_no_default_endpoint() {
        assert!(ProviderKind::Anu.default_endpoint().is_some());
        assert!(ProviderKind::RandomOrg.default_endpoint().is_some());
        assert!(ProviderKind::AnuCompatible.default_endpoint().is_none());
    }
}
