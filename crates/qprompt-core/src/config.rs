//! Start-up configuration: providers, timeouts, and the technique catalog.
//!
//! Configuration is plain JSON. Everything has a default, so an empty object
//! `{}` is a valid config equivalent to [`QpromptConfig::default`].
//!
//! ```json
//! {
//!   "timeout_secs": 5.0,
//!   "parallel_draws": false,
//!   "providers": [
//!     { "name": "anu", "kind": "anu", "priority": 0 },
//!     { "name": "random_org", "kind": "random_org", "priority": 1 }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{Technique, TechniqueCatalog};
use crate::error::{Error, Result};
use crate::manager::EntropySourceManager;
use crate::provider::EntropyProvider;
use crate::providers::{AnuProvider, ProviderKind, RandomOrgProvider};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "QPROMPT_CONFIG";
/// Longest accepted per-attempt provider timeout, in seconds.
pub const MAX_TIMEOUT_SECS: f64 = 600.0;
/// Environment variable holding an ANU API key.
pub const ANU_API_KEY_ENV: &str = "QPROMPT_ANU_API_KEY";

/// One entropy provider entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider name, reported as the source of each draw.
    pub name: String,
    pub kind: ProviderKind,
    /// Overrides the kind's default endpoint. Required for `anu_compatible`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Lower is tried first.
    #[serde(default)]
    pub priority: i32,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, kind: ProviderKind, priority: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            endpoint: None,
            api_key: None,
            priority,
        }
    }

    fn resolved_endpoint(&self) -> Result<&str> {
        self.endpoint
            .as_deref()
            .or(self.kind.default_endpoint())
            .ok_or_else(|| {
                Error::Config(format!(
                    "provider '{}' of kind {} needs an endpoint",
                    self.name, self.kind
                ))
            })
    }

    /// Construct the provider this entry describes.
    pub fn build(&self, timeout: Duration) -> Result<Box<dyn EntropyProvider>> {
        let endpoint = self.resolved_endpoint()?;
        let provider: Box<dyn EntropyProvider> = match self.kind {
            ProviderKind::Anu | ProviderKind::AnuCompatible => {
                let mut p = if self.kind == ProviderKind::Anu {
                    AnuProvider::new(&self.name, endpoint, timeout)?
                } else {
                    AnuProvider::compatible(&self.name, endpoint, timeout)?
                };
                if let Some(key) = &self.api_key {
                    p = p.with_api_key(key);
                }
                Box::new(p)
            }
            ProviderKind::RandomOrg => {
                Box::new(RandomOrgProvider::new(&self.name, endpoint, timeout)?)
            }
        };
        Ok(provider)
    }
}

/// Technique entry for a custom catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueSpec {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub template: String,
}

/// Whole-process configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QpromptConfig {
    pub providers: Vec<ProviderConfig>,
    /// Per-attempt provider timeout in seconds.
    pub timeout_secs: f64,
    /// Perform the draws of a request concurrently.
    pub parallel_draws: bool,
    /// Custom catalog; the built-in catalog is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub techniques: Option<Vec<TechniqueSpec>>,
}

impl Default for QpromptConfig {
    fn default() -> Self {
        Self {
            providers: vec![
                ProviderConfig::new("anu", ProviderKind::Anu, 0),
                ProviderConfig::new("random_org", ProviderKind::RandomOrg, 1),
            ],
            timeout_secs: crate::providers::DEFAULT_TIMEOUT.as_secs_f64(),
            parallel_draws: false,
            techniques: None,
        }
    }
}

impl QpromptConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Config from `path`, else from `$QPROMPT_CONFIG`, else defaults, with
    /// `$QPROMPT_ANU_API_KEY` applied to ANU providers lacking a key.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV);
        let mut config = match path.or(env_path.as_deref().map(Path::new)) {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        if let Ok(key) = std::env::var(ANU_API_KEY_ENV) {
            if !key.is_empty() {
                config.apply_anu_api_key(&key);
            }
        }
        Ok(config)
    }

    /// Set `key` on every `anu` provider that has none.
    pub fn apply_anu_api_key(&mut self, key: &str) {
        for p in &mut self.providers {
            if p.kind == ProviderKind::Anu && p.api_key.is_none() {
                p.api_key = Some(key.to_string());
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.timeout_secs > 0.0 && self.timeout_secs <= MAX_TIMEOUT_SECS) {
            return Err(Error::Config(format!(
                "timeout_secs must be in (0, {MAX_TIMEOUT_SECS}], got {}",
                self.timeout_secs
            )));
        }
        if self.providers.is_empty() {
            return Err(Error::Config("no providers configured".to_string()));
        }
        for (i, p) in self.providers.iter().enumerate() {
            if p.name.trim().is_empty() {
                return Err(Error::Config(format!("provider #{i} has an empty name")));
            }
            if self.providers[..i].iter().any(|o| o.name == p.name) {
                return Err(Error::Config(format!(
                    "provider name '{}' is used twice",
                    p.name
                )));
            }
            p.resolved_endpoint()?;
        }
        Ok(())
    }

    /// Per-attempt timeout. Out-of-range values fall back to the default.
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs > 0.0 && self.timeout_secs <= MAX_TIMEOUT_SECS {
            Duration::from_secs_f64(self.timeout_secs)
        } else {
            crate::providers::DEFAULT_TIMEOUT
        }
    }

    /// Build the immutable provider chain.
    pub fn build_manager(&self) -> Result<EntropySourceManager> {
        self.validate()?;
        let timeout = self.timeout();
        let mut manager = EntropySourceManager::new();
        for p in &self.providers {
            manager.add_provider(p.build(timeout)?, p.priority);
        }
        Ok(manager)
    }

    /// Build the technique catalog.
    pub fn build_catalog(&self) -> Result<TechniqueCatalog> {
        match &self.techniques {
            None => Ok(TechniqueCatalog::builtin()),
            Some(specs) => TechniqueCatalog::new(
                specs
                    .iter()
                    .map(|s| Technique::new(&s.key, &s.name, &s.description, &s.template))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = QpromptConfig::default();
        config.validate().unwrap();
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].kind, ProviderKind::Anu);
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_empty_object_equals_default() {
        let config: QpromptConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, QpromptConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = QpromptConfig::default();
        config.providers.push(ProviderConfig {
            endpoint: Some("http://127.0.0.1:8042/api/v1/random".to_string()),
            ..ProviderConfig::new("local", ProviderKind::AnuCompatible, 2)
        });
        let json = serde_json::to_string(&config).unwrap();
        let back: QpromptConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_rejects_bad_timeouts() {
        for t in [0.0, -1.0, f64::NAN, f64::INFINITY, 600.5, 1e20] {
            let config = QpromptConfig {
                timeout_secs: t,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "timeout {t} accepted");
        }
    }

    #[test]
    fn test_huge_timeout_is_config_error() {
        let config: QpromptConfig = serde_json::from_str(r#"{"timeout_secs": 1e20}"#).unwrap();
        assert!(matches!(config.build_manager(), Err(Error::Config(_))));
        assert_eq!(config.timeout(), crate::providers::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_max_timeout_accepted() {
        let config = QpromptConfig {
            timeout_secs: MAX_TIMEOUT_SECS,
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_rejects_duplicate_provider_names() {
        let config = QpromptConfig {
            providers: vec![
                ProviderConfig::new("x", ProviderKind::Anu, 0),
                ProviderConfig::new("x", ProviderKind::RandomOrg, 1),
            ],
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("twice"));
    }

    #[test]
    fn test_rejects_empty_provider_list() {
        let config = QpromptConfig {
            providers: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_compatible_provider_needs_endpoint() {
        let config = QpromptConfig {
            providers: vec![ProviderConfig::new("local", ProviderKind::AnuCompatible, 0)],
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("endpoint"));
    }

    #[test]
    fn test_build_manager_orders_by_priority() {
        let config = QpromptConfig {
            providers: vec![
                ProviderConfig::new("second", ProviderKind::RandomOrg, 5),
                ProviderConfig::new("first", ProviderKind::Anu, 1),
            ],
            ..Default::default()
        };
        let manager = config.build_manager().unwrap();
        assert_eq!(manager.provider_names(), vec!["first", "second"]);
        assert!(manager.provider_info("first").unwrap().quantum);
        assert!(!manager.provider_info("second").unwrap().quantum);
    }

    #[test]
    fn test_api_key_only_fills_missing_anu_keys() {
        let mut config = QpromptConfig::default();
        config.providers[0].api_key = None;
        config.providers.push(ProviderConfig {
            api_key: Some("mine".to_string()),
            ..ProviderConfig::new("anu2", ProviderKind::Anu, 3)
        });
        config.apply_anu_api_key("env-key");
        assert_eq!(config.providers[0].api_key.as_deref(), Some("env-key"));
        assert_eq!(config.providers[1].api_key, None);
        assert_eq!(config.providers[2].api_key.as_deref(), Some("mine"));
    }

    #[test]
    fn test_custom_catalog_from_config() {
        let json = r#"{
            "techniques": [
                {"key": "rephrase", "name": "Rephrase", "template": "Rephrase: {prompt}"},
                {"key": "expand", "name": "Expand", "template": "{prompt} (expand)"}
            ]
        }"#;
        let config: QpromptConfig = serde_json::from_str(json).unwrap();
        let catalog = config.build_catalog().unwrap();
        assert_eq!(catalog.size(), 2);
        assert_eq!(catalog.technique_at(1).unwrap().apply("x"), "x (expand)");
    }

    #[test]
    fn test_builtin_catalog_when_unset() {
        let catalog = QpromptConfig::default().build_catalog().unwrap();
        assert_eq!(catalog, TechniqueCatalog::builtin());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"timeout_secs": 2.5, "providers": [{{"name": "ro", "kind": "random_org"}}]}}"#
        )
        .unwrap();
        let config = QpromptConfig::load(file.path()).unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(config.providers[0].name, "ro");
        assert_eq!(config.providers[0].priority, 0);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"providers": []}}"#).unwrap();
        assert!(matches!(
            QpromptConfig::load(file.path()),
            Err(Error::Config(_))
        ));
    }
}
