//! Provider registry - the explicit configuration object for the query layer.
//!
//! Holds the provider table, resolved API keys and the current model
//! catalog. The catalog is the only mutable part: it is swapped by the
//! background refresh task and read on every query.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::config::ProvidersConfig;
use crate::domain::ModelCatalog;
use crate::error::ConsensusError;
use crate::providers::ProviderDescriptor;

/// Provider table plus credentials and the current model catalog.
pub struct ProviderRegistry {
    descriptors: Vec<ProviderDescriptor>,
    api_keys: HashMap<String, String>,
    enabled: Vec<String>,
    catalog_path: PathBuf,
    catalog: RwLock<ModelCatalog>,
}

impl ProviderRegistry {
    /// Build a registry from an explicit provider table.
    pub fn new(
        descriptors: Vec<ProviderDescriptor>,
        api_keys: HashMap<String, String>,
        enabled: Vec<String>,
        catalog_path: impl Into<PathBuf>,
    ) -> Self {
        let catalog_path = catalog_path.into();
        let catalog = load_catalog(&catalog_path);

        Self {
            descriptors,
            api_keys,
            enabled,
            catalog_path,
            catalog: RwLock::new(catalog),
        }
    }

    /// Build the registry from configuration and the environment.
    ///
    /// Keys from configuration win; otherwise each provider's environment
    /// variable is consulted. Unknown ids in `enabled` are dropped with a
    /// warning.
    pub fn from_config(config: &ProvidersConfig, catalog_path: &Path) -> Self {
        let descriptors: Vec<ProviderDescriptor> = ProviderDescriptor::builtin()
            .into_iter()
            .map(|mut descriptor| {
                if let Some(endpoint) = config.endpoints.get(&descriptor.id) {
                    descriptor.endpoint = endpoint.clone();
                }
                descriptor
            })
            .collect();

        let api_keys = descriptors
            .iter()
            .filter_map(|d| {
                config
                    .api_keys
                    .get(&d.id)
                    .cloned()
                    .or_else(|| std::env::var(&d.api_key_env).ok())
                    .filter(|key| !key.trim().is_empty())
                    .map(|key| (d.id.clone(), key))
            })
            .collect::<HashMap<_, _>>();

        let enabled = config
            .enabled
            .iter()
            .filter(|id| {
                let known = descriptors.iter().any(|d| &d.id == *id);
                if !known {
                    tracing::warn!(provider = %id, "Ignoring unknown provider in configuration");
                }
                known
            })
            .cloned()
            .collect();

        for descriptor in &descriptors {
            if !api_keys.contains_key(&descriptor.id) {
                tracing::warn!(
                    provider = %descriptor.id,
                    env = %descriptor.api_key_env,
                    "No API key configured; provider calls will fail"
                );
            }
        }

        Self::new(descriptors, api_keys, enabled, catalog_path)
    }

    pub fn descriptor(&self, provider_id: &str) -> Option<&ProviderDescriptor> {
        self.descriptors.iter().find(|d| d.id == provider_id)
    }

    pub fn descriptors(&self) -> &[ProviderDescriptor] {
        &self.descriptors
    }

    /// Provider ids queried for each claim.
    pub fn enabled(&self) -> &[String] {
        &self.enabled
    }

    pub fn api_key(&self, provider_id: &str) -> Option<&str> {
        self.api_keys.get(provider_id).map(String::as_str)
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    /// Snapshot of the current catalog.
    pub fn catalog(&self) -> ModelCatalog {
        match self.catalog.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Model to use for a provider: catalog entry, else the descriptor default.
    pub fn model_id(&self, provider_id: &str) -> Option<String> {
        let descriptor = self.descriptor(provider_id)?;
        let catalog = self.catalog();
        Some(
            catalog
                .model_id(provider_id)
                .map(str::to_string)
                .unwrap_or_else(|| descriptor.default_model.clone()),
        )
    }

    /// Replace the current catalog.
    pub fn set_catalog(&self, catalog: ModelCatalog) {
        let mut guard = match self.catalog.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = catalog;
    }

    /// Re-read the catalog file.
    ///
    /// A missing file resets to the fallback table. An unreadable or
    /// malformed file keeps the current catalog and returns the error.
    pub fn reload(&self) -> Result<(), ConsensusError> {
        if !self.catalog_path.exists() {
            tracing::debug!(path = %self.catalog_path.display(), "No catalog file; using fallback");
            self.set_catalog(ModelCatalog::fallback());
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.catalog_path)?;
        let catalog = ModelCatalog::from_json(&content)?;
        tracing::info!(
            source = %catalog.source,
            last_updated = %catalog.last_updated,
            models = catalog.models.len(),
            "Model catalog reloaded"
        );
        self.set_catalog(catalog);
        Ok(())
    }

    /// Write a catalog to the catalog file and make it current.
    pub fn persist(&self, catalog: ModelCatalog) -> Result<(), ConsensusError> {
        let content = serde_json::to_string_pretty(&catalog)?;
        if let Some(parent) = self.catalog_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.catalog_path, content)?;
        self.set_catalog(catalog);
        Ok(())
    }
}

/// Initial catalog load; any failure falls back to the built-in table.
fn load_catalog(path: &Path) -> ModelCatalog {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return ModelCatalog::fallback(),
    };

    match ModelCatalog::from_json(&content) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed catalog file; using fallback");
            ModelCatalog::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelEntry, DISCOVERY_SOURCE};

    fn registry_at(path: &Path) -> ProviderRegistry {
        let config = ProvidersConfig {
            api_keys: [("openai".to_string(), "sk-test".to_string())]
                .into_iter()
                .collect(),
            enabled: vec!["openai".to_string(), "bogus".to_string()],
            ..ProvidersConfig::default()
        };
        ProviderRegistry::from_config(&config, path)
    }

    #[test]
    fn test_missing_file_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_at(&dir.path().join("missing.json"));

        assert!(registry.catalog().is_fallback());
        assert_eq!(registry.model_id("openai").as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_unknown_enabled_provider_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_at(&dir.path().join("catalog.json"));

        assert_eq!(registry.enabled(), ["openai".to_string()]);
        assert_eq!(registry.api_key("openai"), Some("sk-test"));
        assert!(registry.descriptor("bogus").is_none());
    }

    #[test]
    fn test_endpoint_override() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProvidersConfig {
            endpoints: [("mistral".to_string(), "http://localhost:9999/chat".to_string())]
                .into_iter()
                .collect(),
            ..ProvidersConfig::default()
        };
        let registry = ProviderRegistry::from_config(&config, &dir.path().join("c.json"));
        assert_eq!(
            registry.descriptor("mistral").unwrap().endpoint,
            "http://localhost:9999/chat"
        );
    }

    #[test]
    fn test_reload_picks_up_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let registry = registry_at(&path);

        std::fs::write(
            &path,
            r#"{"last_updated": "2025-11-02", "source": "discovery", "openai": "gpt-4.1"}"#,
        )
        .unwrap();
        registry.reload().unwrap();

        assert_eq!(registry.model_id("openai").as_deref(), Some("gpt-4.1"));
        // No catalog entry: descriptor default.
        assert_eq!(
            registry.model_id("anthropic").as_deref(),
            Some("claude-3-5-sonnet-20241022")
        );
        assert_eq!(registry.model_id("bogus"), None);
    }

    #[test]
    fn test_reload_keeps_catalog_on_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"source": "discovery", "openai": "gpt-4.1"}"#).unwrap();
        let registry = registry_at(&path);
        assert_eq!(registry.model_id("openai").as_deref(), Some("gpt-4.1"));

        std::fs::write(&path, "not json").unwrap();
        assert!(registry.reload().is_err());
        assert_eq!(registry.model_id("openai").as_deref(), Some("gpt-4.1"));
    }

    #[test]
    fn test_persist_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.json");
        let registry = registry_at(&path);

        let mut catalog = ModelCatalog::fallback();
        catalog.source = DISCOVERY_SOURCE.to_string();
        catalog.models.insert(
            "mistral".to_string(),
            ModelEntry {
                id: "mistral-medium-latest".to_string(),
                docs_url: None,
            },
        );
        registry.persist(catalog.clone()).unwrap();

        let reopened = registry_at(&path);
        assert_eq!(reopened.catalog(), catalog);
    }
}
