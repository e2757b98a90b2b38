//! Entropy provider trait and the values that flow through it.
//!
//! Every external randomness service implements [`EntropyProvider`], which
//! exposes metadata via [`ProviderInfo`] and a single call returning one
//! integer drawn from a closed range.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A closed integer range to draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntropyRequest {
    pub minimum: i64,
    /// Inclusive upper bound.
    pub maximum: i64,
}

impl EntropyRequest {
    /// Build a request, rejecting `minimum > maximum`.
    pub fn new(minimum: i64, maximum: i64) -> Result<Self> {
        if minimum > maximum {
            return Err(Error::InvalidRange { minimum, maximum });
        }
        Ok(Self { minimum, maximum })
    }

    /// Number of integers in the range. Always at least 1.
    pub fn span(&self) -> u128 {
        (i128::from(self.maximum) - i128::from(self.minimum) + 1) as u128
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.minimum..=self.maximum).contains(&value)
    }

    /// Map a raw provider value into the range.
    ///
    /// Values already inside the range pass through unchanged. Anything else
    /// is reduced as `minimum + (raw mod span)`. This is lossy (ranges that do
    /// not divide the provider's native domain are slightly biased toward
    /// low values) but deterministic given `raw`.
    pub fn normalize(&self, raw: i128) -> i64 {
        if let Ok(v) = i64::try_from(raw) {
            if self.contains(v) {
                return v;
            }
        }
        let span = self.span() as i128;
        let offset = raw.rem_euclid(span);
        (i128::from(self.minimum) + offset) as i64
    }
}

/// One successful draw, tagged with the provider that served it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntropyResult {
    /// Drawn value, inside the requested range.
    pub value: i64,
    /// Name of the provider that produced the value.
    pub source_name: String,
}

/// Metadata about an entropy provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Unique identifier within a manager (e.g. `"anu"`).
    pub name: String,
    /// Human-readable label (e.g. `"ANU Quantum Lab"`).
    pub description: String,
    /// Physical mechanism behind the randomness.
    pub detail: String,
    /// Whether the values come from a quantum process.
    pub quantum: bool,
}

/// Trait that every entropy provider must implement.
///
/// Implementations issue at most one outbound call per fetch and never retry
/// internally; fallback is the manager's job.
pub trait EntropyProvider: Send + Sync {
    /// Provider metadata.
    fn info(&self) -> &ProviderInfo;

    /// Fetch one integer in `[minimum, maximum]`.
    ///
    /// Fails with [`Error::InvalidRange`] before any network activity when
    /// `minimum > maximum`, and with [`Error::ProviderUnavailable`] when the
    /// remote call times out, errors, or returns malformed data.
    fn fetch_random_integer(&self, minimum: i64, maximum: i64) -> Result<EntropyResult>;

    /// Convenience: name from info.
    fn name(&self) -> &str {
        &self.info().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rejects_inverted_range() {
        let err = EntropyRequest::new(5, 4).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidRange {
                minimum: 5,
                maximum: 4
            }
        ));
    }

    #[test]
    fn test_single_value_range_is_valid() {
        let req = EntropyRequest::new(7, 7).unwrap();
        assert_eq!(req.span(), 1);
        assert_eq!(req.normalize(12345), 7);
    }

    #[test]
    fn test_span_of_full_i64_range() {
        let req = EntropyRequest::new(i64::MIN, i64::MAX).unwrap();
        assert_eq!(req.span(), 1u128 << 64);
    }

    #[test]
    fn test_in_range_values_pass_through() {
        let req = EntropyRequest::new(0, 9).unwrap();
        for v in 0..=9 {
            assert_eq!(req.normalize(i128::from(v)), v);
        }
    }

    #[test]
    fn test_out_of_range_values_reduced_by_modulo() {
        let req = EntropyRequest::new(0, 9).unwrap();
        assert_eq!(req.normalize(10), 0);
        assert_eq!(req.normalize(255), 5);
        assert_eq!(req.normalize(65535), 5);
    }

    #[test]
    fn test_modulo_respects_offset_minimum() {
        let req = EntropyRequest::new(10, 12).unwrap();
        // span 3: 0 -> 10, 1 -> 11, 2 -> 12, 3 -> 10
        assert_eq!(req.normalize(0), 10);
        assert_eq!(req.normalize(1), 11);
        assert_eq!(req.normalize(2), 12);
        assert_eq!(req.normalize(3), 10);
    }

    #[test]
    fn test_negative_raw_values_normalized() {
        let req = EntropyRequest::new(-2, 2).unwrap();
        assert_eq!(req.normalize(-1), -1);
        let v = req.normalize(-7);
        assert!(req.contains(v));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let req = EntropyRequest::new(0, 6).unwrap();
        for raw in [0i128, 17, 1000, 65535, 1 << 40] {
            assert_eq!(req.normalize(raw), req.normalize(raw));
            assert!(req.contains(req.normalize(raw)));
        }
    }
}
