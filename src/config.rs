//! Configuration module for Consensus Core.
//!
//! Loads configuration from YAML files and environment variables.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub interpretation: InterpretationConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Provider query configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Providers queried for each claim, by id.
    pub enabled: Vec<String>,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
    /// API keys by provider id. Missing keys fall back to each provider's
    /// environment variable (e.g. `OPENAI_API_KEY`).
    pub api_keys: HashMap<String, String>,
    /// Completion endpoint overrides by provider id.
    pub endpoints: HashMap<String, String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            enabled: ["openai", "anthropic", "mistral", "deepseek"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: 30,
            api_keys: HashMap::new(),
            endpoints: HashMap::new(),
        }
    }
}

/// Model catalog refresh and discovery configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Query provider model listings and rewrite the catalog file.
    /// When disabled the catalog file is only re-read.
    pub enabled: bool,
    /// Catalog file shared with external discovery jobs.
    pub model_config_path: PathBuf,
    /// Interval between catalog refreshes.
    pub refresh_interval_hours: u64,
    /// Delay before retrying a failed discovery run.
    pub retry_interval_minutes: u64,
    /// Balance treated as 100% when reporting credit status.
    pub initial_credit_balance: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model_config_path: PathBuf::from("/tmp/model_config.json"),
            refresh_interval_hours: 24,
            retry_interval_minutes: 60,
            initial_credit_balance: 10.0,
        }
    }
}

/// Extra phrases for the interpretation engine, on top of the built-in lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InterpretationConfig {
    pub extra_recusal_phrases: Vec<String>,
    pub extra_policy_phrases: Vec<String>,
    pub extra_uncertainty_phrases: Vec<String>,
}

/// Claim preprocessing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Filler phrases removed from claims (case-insensitive).
    pub removal_phrases: Vec<String>,
    /// Whole-word replacements applied after phrase removal.
    pub synonyms: BTreeMap<String, String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            removal_phrases: [
                "is it true that",
                "is it false that",
                "is it a fact that",
                "can you tell me if",
                "i heard that",
                "fact check:",
                "true or false:",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            synonyms: [
                ("isn't", "is not"),
                ("aren't", "are not"),
                ("doesn't", "does not"),
                ("don't", "do not"),
                ("can't", "cannot"),
                ("won't", "will not"),
            ]
            .iter()
            .map(|(w, r)| (w.to_string(), r.to_string()))
            .collect(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (CONSENSUS__*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml (if exists)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("CONSENSUS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
