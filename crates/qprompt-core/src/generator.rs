//! Variation generator: draws technique indices from the entropy source
//! manager and applies the selected techniques to a prompt.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::TechniqueCatalog;
use crate::error::{Error, Result};
use crate::manager::{CancelToken, EntropySourceManager};

/// Fewest variations one request may ask for.
pub const MIN_VARIATIONS: usize = 3;
/// Most variations one request may ask for.
pub const MAX_VARIATIONS: usize = 10;

/// One generated output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    /// 1-based position in draw order.
    pub index: usize,
    /// Transformed prompt.
    pub text: String,
    pub technique_name: String,
    /// Provider that served the draw selecting the technique.
    pub source_name: String,
    /// Whether that provider is a quantum source.
    pub quantum_verified: bool,
}

/// Output of one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub id: Uuid,
    /// The prompt exactly as supplied.
    pub prompt: String,
    pub created_unix_ms: u64,
    pub variations: Vec<Variation>,
}

impl Generation {
    /// Distinct provider names in order of first use.
    pub fn sources_used(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for v in &self.variations {
            if !seen.contains(&v.source_name.as_str()) {
                seen.push(&v.source_name);
            }
        }
        seen
    }
}

/// Generates prompt variations. Borrows its collaborators; build one per
/// request or keep one around, it holds no state of its own.
pub struct VariationGenerator<'a> {
    manager: &'a EntropySourceManager,
    catalog: &'a TechniqueCatalog,
    parallel: bool,
}

impl<'a> VariationGenerator<'a> {
    pub fn new(manager: &'a EntropySourceManager, catalog: &'a TechniqueCatalog) -> Self {
        Self {
            manager,
            catalog,
            parallel: false,
        }
    }

    /// Perform the draws of one request concurrently.
    pub fn with_parallel_draws(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Generate `count` variations of `prompt`.
    pub fn generate(&self, prompt: &str, count: usize) -> Result<Vec<Variation>> {
        self.generate_cancellable(prompt, count, &CancelToken::new())
    }

    /// Like [`generate`](Self::generate), abandoning the request once
    /// `cancel` is set. No partial list is ever returned.
    pub fn generate_cancellable(
        &self,
        prompt: &str,
        count: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<Variation>> {
        if !(MIN_VARIATIONS..=MAX_VARIATIONS).contains(&count) {
            return Err(Error::InvalidCount { count });
        }
        if prompt.trim().is_empty() {
            return Err(Error::EmptyPrompt);
        }

        let max_index = (self.catalog.size() as i64) - 1;
        let draws = if self.parallel {
            self.manager.draw_many_parallel(count, 0, max_index, cancel)?
        } else {
            self.manager
                .draw_many_cancellable(count, 0, max_index, cancel)?
        };

        let mut variations = Vec::with_capacity(count);
        for (i, draw) in draws.into_iter().enumerate() {
            let technique = self.catalog.technique_at(draw.value as usize)?;
            let quantum_verified = self
                .manager
                .provider_info(&draw.source_name)
                .is_some_and(|info| info.quantum);
            variations.push(Variation {
                index: i + 1,
                text: technique.apply(prompt),
                technique_name: technique.name.clone(),
                source_name: draw.source_name,
                quantum_verified,
            });
        }
        Ok(variations)
    }

    /// Generate and package the variations with an id and timestamp.
    pub fn generate_report(
        &self,
        prompt: &str,
        count: usize,
        cancel: &CancelToken,
    ) -> Result<Generation> {
        let variations = self.generate_cancellable(prompt, count, cancel)?;
        let generation = Generation {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            created_unix_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            variations,
        };
        log::info!(
            "generation {} produced {} variations via {}",
            generation.id,
            generation.variations.len(),
            generation.sources_used().join(", ")
        );
        Ok(generation)
    }
}
