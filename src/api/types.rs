//! API request and response types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{ConsensusResult, CreditStatus, ModelCatalog, ModelResponse};

// ==================== Ask ====================

/// A claim to put to every enabled provider.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AskRequest {
    /// The claim, in free text.
    pub query: String,
}

/// Consensus verdict plus the raw provider responses behind it.
#[derive(Debug, Serialize, ToSchema)]
pub struct AskResponse {
    pub request_id: Uuid,
    /// The claim as received.
    pub query: String,
    /// The prompt actually sent to providers.
    pub structured_query: String,
    pub consensus: ConsensusResult,
    /// Per-provider outcome, keyed by provider id.
    pub responses: BTreeMap<String, ModelResponse>,
}

// ==================== Models ====================

/// Whether a provider takes part in consensus requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Enabled and holding an API key.
    Active,
    /// Not listed in `providers.enabled`.
    Disabled,
    /// Enabled, but every call fails for lack of a key.
    MissingKey,
}

impl ProviderStatus {
    pub fn of(enabled: bool, configured: bool) -> Self {
        match (enabled, configured) {
            (false, _) => ProviderStatus::Disabled,
            (true, false) => ProviderStatus::MissingKey,
            (true, true) => ProviderStatus::Active,
        }
    }
}

/// Public information about one provider.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderInfo {
    pub id: String,
    pub display_name: String,
    pub vendor: String,
    /// Model currently used for this provider.
    pub model_id: String,
    pub docs_url: String,
    pub training_cutoff: String,
    pub enabled: bool,
    /// Whether an API key is configured.
    pub configured: bool,
    pub status: ProviderStatus,
}

/// Current model catalog and provider table.
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelsResponse {
    #[schema(value_type = Object)]
    pub catalog: ModelCatalog,
    pub providers: Vec<ProviderInfo>,
}

// ==================== Credit ====================

/// Credit status for providers with a balance API.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreditResponse {
    pub providers: Vec<CreditStatus>,
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Providers queried for each claim.
    pub providers: Vec<String>,
    /// Where the current model catalog came from.
    pub catalog_source: String,
    /// Timestamp.
    pub timestamp: String,
}
