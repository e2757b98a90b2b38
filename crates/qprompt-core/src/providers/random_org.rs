//! Random.org atmospheric noise provider.
//!
//! Uses the plain-text integer API, which can draw directly from a closed
//! range. The service only accepts bounds within ±1e9; wider ranges request a
//! raw value in `[0, 1e9]` and reduce it with [`EntropyRequest::normalize`].

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{Error, Result};
use crate::provider::{EntropyProvider, EntropyRequest, EntropyResult, ProviderInfo};

pub const DEFAULT_ENDPOINT: &str = "https://www.random.org/integers/";

/// Largest magnitude Random.org accepts for `min`/`max`.
const NATIVE_LIMIT: i64 = 1_000_000_000;

pub struct RandomOrgProvider {
    info: ProviderInfo,
    endpoint: String,
    client: Client,
}

impl RandomOrgProvider {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            info: ProviderInfo {
                name: name.into(),
                description: "Random.org".to_string(),
                detail: "Atmospheric noise".to_string(),
                quantum: false,
            },
            endpoint: endpoint.into(),
            client: super::http_client(timeout)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Bounds to send for `request`: the request itself when Random.org can serve
/// it natively, otherwise its widest non-negative domain.
pub(crate) fn native_bounds(request: &EntropyRequest) -> (i64, i64) {
    let fits = |v: i64| (-NATIVE_LIMIT..=NATIVE_LIMIT).contains(&v);
    if fits(request.minimum) && fits(request.maximum) {
        (request.minimum, request.maximum)
    } else {
        (0, NATIVE_LIMIT)
    }
}

/// Parse a plain-text body holding one base-10 integer.
pub(crate) fn parse_body(provider: &str, body: &str) -> Result<i64> {
    let line = body
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| Error::unavailable(provider, "empty response"))?;
    if line.starts_with("Error") {
        return Err(Error::unavailable(provider, line.to_string()));
    }
    line.parse::<i64>()
        .map_err(|_| Error::unavailable(provider, format!("malformed response: {line:?}")))
}

impl EntropyProvider for RandomOrgProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }

    fn fetch_random_integer(&self, minimum: i64, maximum: i64) -> Result<EntropyResult> {
        let request = EntropyRequest::new(minimum, maximum)?;
        let (lo, hi) = native_bounds(&request);
        let (lo, hi) = (lo.to_string(), hi.to_string());

        let params = [
            ("num", "1"),
            ("min", lo.as_str()),
            ("max", hi.as_str()),
            ("col", "1"),
            ("base", "10"),
            ("format", "plain"),
            ("rnd", "new"),
        ];
        let response =
            super::check_response(self.name(), self.client.get(&self.endpoint).query(&params).send())?;
        let body = response
            .text()
            .map_err(|e| Error::unavailable(self.name(), format!("unreadable body: {e}")))?;
        let raw = parse_body(self.name(), &body)?;

        Ok(EntropyResult {
            value: request.normalize(i128::from(raw)),
            source_name: self.info.name.clone(),
        })
    }
}
