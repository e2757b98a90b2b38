//! ANU Quantum Random Numbers provider.
//!
//! The ANU service measures quantum vacuum fluctuations and serves them as
//! JSON: `{"type":"uint16","length":N,"data":[...],"success":true}`. Self-hosted
//! QRNG servers that mimic this wire format are reached through
//! [`AnuProvider::compatible`] with the same client.
//!
//! The API only returns 16-bit words. Enough words are requested to cover the
//! span of the requested range and combined big-endian into one raw value,
//! which is then reduced with [`EntropyRequest::normalize`].

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::provider::{EntropyProvider, EntropyRequest, EntropyResult, ProviderInfo};

/// Legacy public ANU endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://qrng.anu.edu.au/API/jsonI.php";

/// Header carrying the API key on the keyed ANU endpoint.
const API_KEY_HEADER: &str = "x-api-key";

pub struct AnuProvider {
    info: ProviderInfo,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct AnuResponse {
    success: bool,
    #[serde(default)]
    data: Option<Vec<u64>>,
    #[serde(default)]
    message: Option<String>,
}

impl AnuProvider {
    /// ANU QRNG provider against `endpoint`.
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            info: ProviderInfo {
                name: name.into(),
                description: "ANU Quantum Lab".to_string(),
                detail: "Quantum vacuum fluctuations".to_string(),
                quantum: true,
            },
            endpoint: endpoint.into(),
            api_key: None,
            client: super::http_client(timeout)?,
        })
    }

    /// Provider for any server speaking the ANU JSON format.
    pub fn compatible(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut provider = Self::new(name, endpoint, timeout)?;
        provider.info.description = "ANU-compatible endpoint".to_string();
        provider.info.detail = "Remote entropy server (ANU QRNG wire format)".to_string();
        provider.info.quantum = false;
        Ok(provider)
    }

    /// Send `key` in the `x-api-key` header on every call.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_words(&self, words: u32) -> Result<String> {
        let length = words.to_string();
        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[("length", length.as_str()), ("type", "uint16")]);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        let response = super::check_response(self.name(), request.send())?;
        response
            .text()
            .map_err(|e| Error::unavailable(self.name(), format!("unreadable body: {e}")))
    }
}

/// Number of 16-bit words needed to cover `span` distinct values (minimum 1).
pub(crate) fn words_for_span(span: u128) -> u32 {
    let bits = 128 - (span - 1).leading_zeros();
    bits.div_ceil(16).max(1)
}

/// Parse an ANU JSON body and combine `words` uint16 values big-endian.
pub(crate) fn parse_response(provider: &str, body: &str, words: u32) -> Result<u128> {
    let parsed: AnuResponse = serde_json::from_str(body)
        .map_err(|e| Error::unavailable(provider, format!("malformed response: {e}")))?;
    if !parsed.success {
        let reason = parsed
            .message
            .unwrap_or_else(|| "remote reported failure".to_string());
        return Err(Error::unavailable(provider, reason));
    }
    let data = parsed
        .data
        .ok_or_else(|| Error::unavailable(provider, "response carries no data"))?;
    if data.len() < words as usize {
        return Err(Error::unavailable(
            provider,
            format!("expected {words} values, got {}", data.len()),
        ));
    }

    let mut raw: u128 = 0;
    for &word in data.iter().take(words as usize) {
        if word > u64::from(u16::MAX) {
            return Err(Error::unavailable(
                provider,
                format!("value {word} is not a uint16"),
            ));
        }
        raw = (raw << 16) | u128::from(word);
    }
    Ok(raw)
}

impl EntropyProvider for AnuProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }

    fn fetch_random_integer(&self, minimum: i64, maximum: i64) -> Result<EntropyResult> {
        let request = EntropyRequest::new(minimum, maximum)?;
        let words = words_for_span(request.span());

        let t0 = Instant::now();
        let body = self.request_words(words)?;
        let raw = parse_response(self.name(), &body, words)?;
        log::trace!(
            "{}: {} word(s) in {:.0}ms",
            self.name(),
            words,
            t0.elapsed().as_secs_f64() * 1000.0
        );

        Ok(EntropyResult {
            value: request.normalize(raw as i128),
            source_name: self.info.name.clone(),
        })
    }
}
