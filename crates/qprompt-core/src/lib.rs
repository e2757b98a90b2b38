//! # qprompt-core
//!
//! **Prompt variations chosen by true external randomness.**
//!
//! `qprompt-core` generates several variations of a prompt. For each variation
//! it draws a random index from an external entropy provider (ANU's quantum
//! vacuum QRNG, Random.org's atmospheric noise, or any ANU-compatible server),
//! maps the index onto a fixed catalog of optimization techniques, and applies
//! the technique to the prompt.
//!
//! ## Quick Start
//!
//! ```no_run
//! use qprompt_core::{QpromptConfig, VariationGenerator};
//!
//! let config = QpromptConfig::default();
//! let manager = config.build_manager().unwrap();
//! let catalog = config.build_catalog().unwrap();
//!
//! let generator = VariationGenerator::new(&manager, &catalog);
//! for v in generator.generate("Explain quantum computing", 5).unwrap() {
//!     println!("[{} via {}]\n{}\n", v.technique_name, v.source_name, v.text);
//! }
//! ```
//!
//! ## Architecture
//!
//! Providers → Source manager (priority fallback) → Catalog (index → technique) → Generator
//!
//! Every provider implements the [`EntropyProvider`] trait. The
//! [`EntropySourceManager`] tries providers in priority order until one
//! succeeds. When every provider fails the draw fails with
//! [`Error::AllProvidersExhausted`]; there is no local
//! pseudo-random fallback.

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod manager;
pub mod provider;
pub mod providers;

pub use catalog::{Technique, TechniqueCatalog};
pub use config::{ProviderConfig, QpromptConfig, TechniqueSpec};
pub use error::{Error, ProviderFailure, Result};
pub use generator::{Generation, MAX_VARIATIONS, MIN_VARIATIONS, Variation, VariationGenerator};
pub use manager::{CancelToken, EntropySourceManager, ProviderHealth};
pub use provider::{EntropyProvider, EntropyRequest, EntropyResult, ProviderInfo};
pub use providers::{AnuProvider, ProviderKind, RandomOrgProvider};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
