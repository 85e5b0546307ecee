//! Discovered model catalog and provider credit status.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Source label for the built-in catalog.
pub const FALLBACK_SOURCE: &str = "last_known_good_fallback";

/// Source label for catalogs written by model discovery.
pub const DISCOVERY_SOURCE: &str = "discovery";

/// A model selected for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModelEntry {
    /// Model identifier sent in requests.
    pub id: String,
    /// Provider documentation for the model family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
}

/// Older catalog files store a bare model id instead of an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Full(ModelEntry),
    Bare(String),
}

impl From<StoredEntry> for ModelEntry {
    fn from(entry: StoredEntry) -> Self {
        match entry {
            StoredEntry::Full(entry) => entry,
            StoredEntry::Bare(id) => ModelEntry { id, docs_url: None },
        }
    }
}

#[derive(Debug, Deserialize)]
struct StoredCatalog {
    #[serde(default)]
    last_updated: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    models: BTreeMap<String, serde_json::Value>,
}

/// Model ids currently in use per provider.
///
/// Serialized flat, matching the catalog file layout:
/// `{"last_updated": ..., "source": ..., "openai": {"id": ...}, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelCatalog {
    pub last_updated: String,
    pub source: String,
    #[serde(flatten)]
    pub models: BTreeMap<String, ModelEntry>,
}

impl ModelCatalog {
    /// The last known good table, used until discovery writes a catalog.
    pub fn fallback() -> Self {
        let models = [
            ("openai", "gpt-4o", "https://platform.openai.com/docs/models"),
            (
                "anthropic",
                "claude-3-opus-20240229",
                "https://docs.anthropic.com/about-claude/models/overview",
            ),
            (
                "mistral",
                "mistral-large-latest",
                "https://docs.mistral.ai/getting-started/models/",
            ),
            ("deepseek", "deepseek-chat", "https://api-docs.deepseek.com/models"),
        ]
        .into_iter()
        .map(|(provider, id, docs)| {
            (
                provider.to_string(),
                ModelEntry {
                    id: id.to_string(),
                    docs_url: Some(docs.to_string()),
                },
            )
        })
        .collect();

        Self {
            last_updated: "2025-10-20T00:00:00Z".to_string(),
            source: FALLBACK_SOURCE.to_string(),
            models,
        }
    }

    /// Parse a catalog file. Entries that are neither a string nor an object
    /// with an `id` are skipped.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let stored: StoredCatalog = serde_json::from_str(content)?;

        let models = stored
            .models
            .into_iter()
            .filter_map(|(provider, value)| {
                serde_json::from_value::<StoredEntry>(value)
                    .ok()
                    .map(|entry| (provider, ModelEntry::from(entry)))
            })
            .collect();

        Ok(Self {
            last_updated: stored.last_updated.unwrap_or_default(),
            source: stored.source.unwrap_or_else(|| "file".to_string()),
            models,
        })
    }

    /// Model id for a provider.
    pub fn model_id(&self, provider_id: &str) -> Option<&str> {
        self.models.get(provider_id).map(|m| m.id.as_str())
    }

    /// Whether this is the built-in table.
    pub fn is_fallback(&self) -> bool {
        self.source == FALLBACK_SOURCE
    }
}

/// Traffic-light status of a prepaid balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreditLevel {
    Green,
    Yellow,
    Red,
    Unknown,
}

impl std::fmt::Display for CreditLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreditLevel::Green => write!(f, "green"),
            CreditLevel::Yellow => write!(f, "yellow"),
            CreditLevel::Red => write!(f, "red"),
            CreditLevel::Unknown => write!(f, "unknown"),
        }
    }
}

/// Remaining credit for a provider with a balance API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreditStatus {
    pub provider_id: String,
    pub status: CreditLevel,
    /// Remaining balance as a percentage of the initial balance.
    pub percentage: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    pub checked_at: DateTime<Utc>,
}

impl CreditStatus {
    /// Classify a balance against the initial top-up amount.
    pub fn from_balance(provider_id: impl Into<String>, balance: f64, initial_balance: f64) -> Self {
        let percentage = if initial_balance > 0.0 {
            balance / initial_balance * 100.0
        } else {
            0.0
        };

        let status = if percentage > 60.0 {
            CreditLevel::Green
        } else if percentage > 10.0 {
            CreditLevel::Yellow
        } else {
            CreditLevel::Red
        };

        Self {
            provider_id: provider_id.into(),
            status,
            percentage: percentage.round() as i64,
            balance: Some(balance),
            checked_at: Utc::now(),
        }
    }

    /// Status when the balance could not be fetched.
    pub fn unknown(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            status: CreditLevel::Unknown,
            percentage: 0,
            balance: None,
            checked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_catalog() {
        let catalog = ModelCatalog::fallback();
        assert!(catalog.is_fallback());
        assert_eq!(catalog.model_id("openai"), Some("gpt-4o"));
        assert_eq!(catalog.model_id("anthropic"), Some("claude-3-opus-20240229"));
        assert_eq!(catalog.model_id("unknown"), None);
    }

    #[test]
    fn test_parse_mixed_entries() {
        let content = r#"{
            "last_updated": "2025-11-01T00:00:00Z",
            "source": "discovery",
            "openai": {"id": "gpt-4.1", "docs_url": "https://platform.openai.com/docs/models"},
            "mistral": "mistral-medium-latest",
            "broken": 42
        }"#;

        let catalog = ModelCatalog::from_json(content).unwrap();
        assert_eq!(catalog.source, "discovery");
        assert_eq!(catalog.model_id("openai"), Some("gpt-4.1"));
        assert_eq!(catalog.model_id("mistral"), Some("mistral-medium-latest"));
        assert!(catalog.models["mistral"].docs_url.is_none());
        assert!(!catalog.models.contains_key("broken"));
    }

    #[test]
    fn test_catalog_serializes_flat() {
        let json = serde_json::to_value(ModelCatalog::fallback()).unwrap();
        assert_eq!(json["source"], FALLBACK_SOURCE);
        assert_eq!(json["deepseek"]["id"], "deepseek-chat");

        let reparsed = ModelCatalog::from_json(&json.to_string()).unwrap();
        assert_eq!(reparsed, ModelCatalog::fallback());
    }

    #[test]
    fn test_credit_status_levels() {
        assert_eq!(CreditStatus::from_balance("deepseek", 8.0, 10.0).status, CreditLevel::Green);
        assert_eq!(CreditStatus::from_balance("deepseek", 6.0, 10.0).status, CreditLevel::Yellow);
        assert_eq!(CreditStatus::from_balance("deepseek", 1.0, 10.0).status, CreditLevel::Red);

        let status = CreditStatus::from_balance("deepseek", 2.5, 10.0);
        assert_eq!(status.percentage, 25);
        assert_eq!(status.balance, Some(2.5));
    }

    #[test]
    fn test_unknown_credit_status() {
        let status = CreditStatus::unknown("deepseek");
        assert_eq!(status.status, CreditLevel::Unknown);
        assert_eq!(status.percentage, 0);
    }
}
