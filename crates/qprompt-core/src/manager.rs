//! Priority-ordered fallback chain across entropy providers.
//!
//! Architecture:
//! 1. Providers are registered with a priority (lower is tried first)
//! 2. Each draw walks the chain until one provider succeeds
//! 3. `ProviderUnavailable` falls through to the next provider
//! 4. A draw that exhausts the chain fails with `AllProvidersExhausted`
//! 5. Per-provider call/failure counters for health reporting
//!
//! There is no caching and no pseudo-random fallback: every draw is a fresh
//! round trip to an external source.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::error::{Error, ProviderFailure, Result};
use crate::provider::{EntropyProvider, EntropyRequest, EntropyResult, ProviderInfo};

/// Upper bound on worker threads used by [`EntropySourceManager::draw_many_parallel`].
pub const MAX_PARALLEL_DRAWS: usize = 16;

/// Shared cancellation flag for an in-progress request.
///
/// Cloning yields a handle to the same flag. Checked before every provider
/// attempt; a call already in flight is bounded by the provider timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runtime state for a registered provider.
struct ProviderState {
    provider: Box<dyn EntropyProvider>,
    priority: i32,
    calls: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    last_latency_us: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl ProviderState {
    fn new(provider: Box<dyn EntropyProvider>, priority: i32) -> Self {
        Self {
            provider,
            priority,
            calls: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            last_latency_us: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    fn set_last_error(&self, error: Option<String>) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = error;
    }
}

/// Ordered set of entropy providers with fallback.
#[derive(Default)]
pub struct EntropySourceManager {
    providers: Vec<ProviderState>,
}

impl EntropySourceManager {
    /// Create a manager with no providers. Every draw on an empty manager
    /// fails with [`Error::AllProvidersExhausted`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Lower priorities are tried first; ties keep
    /// registration order.
    pub fn add_provider(&mut self, provider: Box<dyn EntropyProvider>, priority: i32) {
        let at = self
            .providers
            .iter()
            .position(|p| p.priority > priority)
            .unwrap_or(self.providers.len());
        self.providers
            .insert(at, ProviderState::new(provider, priority));
    }

    /// Number of registered providers.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Provider names in fallback order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|p| p.provider.name().to_string())
            .collect()
    }

    /// Provider metadata in fallback order.
    pub fn provider_infos(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|p| p.provider.info().clone())
            .collect()
    }

    /// Metadata for the provider named `name`, if registered.
    pub fn provider_info(&self, name: &str) -> Option<&ProviderInfo> {
        self.providers
            .iter()
            .map(|p| p.provider.info())
            .find(|info| info.name == name)
    }

    /// Draw one integer in `[minimum, maximum]`.
    pub fn draw(&self, minimum: i64, maximum: i64) -> Result<EntropyResult> {
        self.draw_cancellable(minimum, maximum, &CancelToken::new())
    }

    /// Like [`draw`](Self::draw), failing with [`Error::Cancelled`] once
    /// `cancel` is set.
    pub fn draw_cancellable(
        &self,
        minimum: i64,
        maximum: i64,
        cancel: &CancelToken,
    ) -> Result<EntropyResult> {
        let request = EntropyRequest::new(minimum, maximum)?;
        self.draw_checked(request, &|| cancel.is_cancelled())
    }

    /// Draw `count` independent integers sequentially, in order.
    ///
    /// All-or-nothing: the first exhausted draw fails the whole call.
    pub fn draw_many(&self, count: usize, minimum: i64, maximum: i64) -> Result<Vec<EntropyResult>> {
        self.draw_many_cancellable(count, minimum, maximum, &CancelToken::new())
    }

    pub fn draw_many_cancellable(
        &self,
        count: usize,
        minimum: i64,
        maximum: i64,
        cancel: &CancelToken,
    ) -> Result<Vec<EntropyResult>> {
        let request = EntropyRequest::new(minimum, maximum)?;
        let mut results = Vec::with_capacity(count);
        for _ in 0..count {
            results.push(self.draw_checked(request, &|| cancel.is_cancelled())?);
        }
        Ok(results)
    }

    /// Draw `count` integers using up to [`MAX_PARALLEL_DRAWS`] threads.
    ///
    /// Each draw walks the fallback chain on its own. Output order matches
    /// draw index and the all-or-nothing contract holds: once one draw fails,
    /// pending draws are abandoned and the first real failure is returned.
    pub fn draw_many_parallel(
        &self,
        count: usize,
        minimum: i64,
        maximum: i64,
        cancel: &CancelToken,
    ) -> Result<Vec<EntropyResult>> {
        let request = EntropyRequest::new(minimum, maximum)?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let next = AtomicUsize::new(0);
        let abort = AtomicBool::new(false);
        let slots: Vec<Mutex<Option<Result<EntropyResult>>>> =
            (0..count).map(|_| Mutex::new(None)).collect();
        let workers = count.min(MAX_PARALLEL_DRAWS);

        std::thread::scope(|s| {
            for _ in 0..workers {
                s.spawn(|| {
                    loop {
                        let i = next.fetch_add(1, Ordering::SeqCst);
                        if i >= count {
                            break;
                        }
                        let result = self.draw_checked(request, &|| {
                            cancel.is_cancelled() || abort.load(Ordering::SeqCst)
                        });
                        if result.is_err() {
                            abort.store(true, Ordering::SeqCst);
                        }
                        *slots[i].lock().unwrap_or_else(|e| e.into_inner()) = Some(result);
                    }
                });
            }
        });

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut results = Vec::with_capacity(count);
        let mut first_error = None;
        for slot in slots {
            match slot.into_inner().unwrap_or_else(|e| e.into_inner()) {
                Some(Ok(r)) => results.push(r),
                Some(Err(Error::Cancelled)) | None => {}
                Some(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None if results.len() == count => Ok(results),
            None => Err(Error::Cancelled),
        }
    }

    fn draw_checked(
        &self,
        request: EntropyRequest,
        is_cancelled: &dyn Fn() -> bool,
    ) -> Result<EntropyResult> {
        let mut failures = Vec::new();

        for state in &self.providers {
            if is_cancelled() {
                return Err(Error::Cancelled);
            }
            let name = state.provider.name();
            log::debug!(
                "drawing [{}, {}] from {name}",
                request.minimum,
                request.maximum
            );

            state.calls.fetch_add(1, Ordering::Relaxed);
            let t0 = Instant::now();
            let outcome = state
                .provider
                .fetch_random_integer(request.minimum, request.maximum);
            state
                .last_latency_us
                .store(t0.elapsed().as_micros() as u64, Ordering::Relaxed);

            let reason = match outcome {
                Ok(result) if request.contains(result.value) => {
                    state.successes.fetch_add(1, Ordering::Relaxed);
                    state.set_last_error(None);
                    return Ok(result);
                }
                Ok(result) => format!(
                    "returned {} outside [{}, {}]",
                    result.value, request.minimum, request.maximum
                ),
                Err(Error::ProviderUnavailable { reason, .. }) => reason,
                Err(e) => return Err(e),
            };

            state.failures.fetch_add(1, Ordering::Relaxed);
            state.set_last_error(Some(reason.clone()));
            log::warn!("{name} unavailable ({reason}), trying next provider");
            failures.push(ProviderFailure {
                provider: name.to_string(),
                reason,
            });
        }

        log::error!(
            "all {} entropy providers exhausted",
            self.providers.len()
        );
        Err(Error::AllProvidersExhausted { failures })
    }

    /// Per-provider health snapshot in fallback order.
    pub fn health_report(&self) -> Vec<ProviderHealth> {
        self.providers
            .iter()
            .map(|state| {
                let info = state.provider.info();
                ProviderHealth {
                    name: info.name.clone(),
                    description: info.description.clone(),
                    quantum: info.quantum,
                    priority: state.priority,
                    calls: state.calls.load(Ordering::Relaxed),
                    successes: state.successes.load(Ordering::Relaxed),
                    failures: state.failures.load(Ordering::Relaxed),
                    last_latency_ms: state.last_latency_us.load(Ordering::Relaxed) as f64
                        / 1000.0,
                    last_error: state
                        .last_error
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .clone(),
                }
            })
            .collect()
    }

    /// Total outbound provider calls made so far.
    pub fn total_calls(&self) -> u64 {
        self.providers
            .iter()
            .map(|s| s.calls.load(Ordering::Relaxed))
            .sum()
    }
}

/// Health status of a single provider.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProviderHealth {
    pub name: String,
    pub description: String,
    pub quantum: bool,
    /// Position key in the fallback chain (lower first).
    pub priority: i32,
    /// Outbound calls attempted.
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
    /// Duration of the most recent call in milliseconds.
    pub last_latency_ms: f64,
    /// Reason for the most recent failure, cleared on success.
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicI64;

    // -----------------------------------------------------------------------
    // Fake providers
    // -----------------------------------------------------------------------

    /// Always returns the same raw value, normalized into range.
    struct FixedProvider {
        info: ProviderInfo,
        value: i64,
    }

    impl FixedProvider {
        fn boxed(name: &str, value: i64) -> Box<dyn EntropyProvider> {
            Box::new(Self {
                info: info(name),
                value,
            })
        }
    }

    impl EntropyProvider for FixedProvider {
        fn info(&self) -> &ProviderInfo {
            &self.info
        }
        fn fetch_random_integer(&self, minimum: i64, maximum: i64) -> Result<EntropyResult> {
            let req = EntropyRequest::new(minimum, maximum)?;
            Ok(EntropyResult {
                value: req.normalize(i128::from(self.value)),
                source_name: self.info.name.clone(),
            })
        }
    }

    /// Always fails as unavailable.
    struct DownProvider {
        info: ProviderInfo,
    }

    impl DownProvider {
        fn boxed(name: &str) -> Box<dyn EntropyProvider> {
            Box::new(Self { info: info(name) })
        }
    }

    impl EntropyProvider for DownProvider {
        fn info(&self) -> &ProviderInfo {
            &self.info
        }
        fn fetch_random_integer(&self, minimum: i64, maximum: i64) -> Result<EntropyResult> {
            EntropyRequest::new(minimum, maximum)?;
            Err(Error::unavailable(&self.info.name, "down"))
        }
    }

    /// Returns an incrementing counter, ignoring the requested range.
    struct CountingProvider {
        info: ProviderInfo,
        next: AtomicI64,
    }

    impl EntropyProvider for CountingProvider {
        fn info(&self) -> &ProviderInfo {
            &self.info
        }
        fn fetch_random_integer(&self, _minimum: i64, _maximum: i64) -> Result<EntropyResult> {
            Ok(EntropyResult {
                value: self.next.fetch_add(1, Ordering::SeqCst),
                source_name: self.info.name.clone(),
            })
        }
    }

    fn info(name: &str) -> ProviderInfo {
        ProviderInfo {
            name: name.to_string(),
            description: format!("{name} fake"),
            detail: "deterministic test data".to_string(),
            quantum: true,
        }
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    #[test]
    fn test_providers_sorted_by_priority() {
        let mut m = EntropySourceManager::new();
        m.add_provider(FixedProvider::boxed("c", 0), 2);
        m.add_provider(FixedProvider::boxed("a", 0), 0);
        m.add_provider(FixedProvider::boxed("b", 0), 1);
        assert_eq!(m.provider_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_equal_priorities_keep_registration_order() {
        let mut m = EntropySourceManager::new();
        m.add_provider(FixedProvider::boxed("first", 0), 1);
        m.add_provider(FixedProvider::boxed("second", 0), 1);
        m.add_provider(FixedProvider::boxed("zero", 0), 0);
        assert_eq!(m.provider_names(), vec!["zero", "first", "second"]);
    }

    // -----------------------------------------------------------------------
    // Fallback
    // -----------------------------------------------------------------------

    #[test]
    fn test_first_healthy_provider_serves() {
        let mut m = EntropySourceManager::new();
        m.add_provider(FixedProvider::boxed("p1", 4), 0);
        m.add_provider(FixedProvider::boxed("p2", 1), 1);
        let r = m.draw(0, 9).unwrap();
        assert_eq!(r.value, 4);
        assert_eq!(r.source_name, "p1");
    }

    #[test]
    fn test_falls_through_to_next_provider() {
        let mut m = EntropySourceManager::new();
        m.add_provider(DownProvider::boxed("p1"), 0);
        m.add_provider(FixedProvider::boxed("p2", 3), 1);
        let r = m.draw(0, 9).unwrap();
        assert_eq!(r.source_name, "p2");
        assert_eq!(r.value, 3);
    }

    #[test]
    fn test_exhaustion_reports_every_failure() {
        let mut m = EntropySourceManager::new();
        m.add_provider(DownProvider::boxed("p1"), 0);
        m.add_provider(DownProvider::boxed("p2"), 1);
        match m.draw(0, 9) {
            Err(Error::AllProvidersExhausted { failures }) => {
                let names: Vec<_> = failures.iter().map(|f| f.provider.as_str()).collect();
                assert_eq!(names, vec!["p1", "p2"]);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_manager_is_exhausted() {
        let m = EntropySourceManager::new();
        assert!(matches!(
            m.draw(0, 1),
            Err(Error::AllProvidersExhausted { .. })
        ));
    }

    #[test]
    fn test_invalid_range_never_reaches_providers() {
        let mut m = EntropySourceManager::new();
        m.add_provider(FixedProvider::boxed("p1", 0), 0);
        assert!(matches!(m.draw(5, 1), Err(Error::InvalidRange { .. })));
        assert_eq!(m.total_calls(), 0);
    }

    #[test]
    fn test_out_of_range_result_treated_as_failure() {
        let mut m = EntropySourceManager::new();
        m.add_provider(
            Box::new(CountingProvider {
                info: info("rogue"),
                next: AtomicI64::new(100),
            }),
            0,
        );
        m.add_provider(FixedProvider::boxed("good", 2), 1);
        let r = m.draw(0, 9).unwrap();
        assert_eq!(r.source_name, "good");
        let health = m.health_report();
        assert_eq!(health[0].failures, 1);
        assert!(health[0].last_error.as_deref().unwrap().contains("outside"));
    }

    // -----------------------------------------------------------------------
    // Multiple draws
    // -----------------------------------------------------------------------

    #[test]
    fn test_draw_many_returns_count_in_order() {
        let mut m = EntropySourceManager::new();
        m.add_provider(
            Box::new(CountingProvider {
                info: info("counter"),
                next: AtomicI64::new(0),
            }),
            0,
        );
        let values: Vec<i64> = m
            .draw_many(5, 0, 9)
            .unwrap()
            .into_iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_draw_many_zero_is_empty() {
        let m = EntropySourceManager::new();
        assert!(m.draw_many(0, 0, 9).unwrap().is_empty());
    }

    #[test]
    fn test_draw_many_is_all_or_nothing() {
        let mut m = EntropySourceManager::new();
        m.add_provider(DownProvider::boxed("p1"), 0);
        assert!(matches!(
            m.draw_many(3, 0, 9),
            Err(Error::AllProvidersExhausted { .. })
        ));
    }

    #[test]
    fn test_parallel_draws_preserve_count() {
        let mut m = EntropySourceManager::new();
        m.add_provider(DownProvider::boxed("p1"), 0);
        m.add_provider(FixedProvider::boxed("p2", 7), 1);
        let results = m.draw_many_parallel(10, 0, 9, &CancelToken::new()).unwrap();
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|r| r.value == 7 && r.source_name == "p2"));
    }

    #[test]
    fn test_parallel_draws_fail_on_exhaustion() {
        let mut m = EntropySourceManager::new();
        m.add_provider(DownProvider::boxed("p1"), 0);
        assert!(matches!(
            m.draw_many_parallel(5, 0, 9, &CancelToken::new()),
            Err(Error::AllProvidersExhausted { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Cancellation
    // -----------------------------------------------------------------------

    #[test]
    fn test_cancelled_token_stops_draws() {
        let mut m = EntropySourceManager::new();
        m.add_provider(FixedProvider::boxed("p1", 1), 0);
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            m.draw_cancellable(0, 9, &token),
            Err(Error::Cancelled)
        ));
        assert!(matches!(
            m.draw_many_cancellable(3, 0, 9, &token),
            Err(Error::Cancelled)
        ));
        assert!(matches!(
            m.draw_many_parallel(3, 0, 9, &token),
            Err(Error::Cancelled)
        ));
        assert_eq!(m.total_calls(), 0);
    }

    #[test]
    fn test_cancel_token_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    #[test]
    fn test_health_tracks_calls_and_failures() {
        let mut m = EntropySourceManager::new();
        m.add_provider(DownProvider::boxed("p1"), 0);
        m.add_provider(FixedProvider::boxed("p2", 0), 1);
        m.draw_many(3, 0, 9).unwrap();

        let health = m.health_report();
        assert_eq!(health.len(), 2);
        assert_eq!(health[0].name, "p1");
        assert_eq!(health[0].calls, 3);
        assert_eq!(health[0].failures, 3);
        assert_eq!(health[0].last_error.as_deref(), Some("down"));
        assert_eq!(health[1].calls, 3);
        assert_eq!(health[1].successes, 3);
        assert!(health[1].last_error.is_none());
        assert_eq!(m.total_calls(), 6);
    }

    #[test]
    fn test_provider_info_lookup() {
        let mut m = EntropySourceManager::new();
        m.add_provider(FixedProvider::boxed("p1", 0), 0);
        assert_eq!(m.provider_info("p1").unwrap().description, "p1 fake");
        assert!(m.provider_info("missing").is_none());
    }
}
