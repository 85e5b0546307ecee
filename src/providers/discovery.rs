//! Model discovery and credit checks.
//!
//! Discovery asks each provider for its model listing, picks the first
//! preferred model it offers and rewrites the catalog file. The refresh
//! task runs this on an interval, or only re-reads the catalog file when
//! discovery is disabled.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::config::DiscoveryConfig;
use crate::domain::{CreditStatus, ModelCatalog, ModelEntry, DISCOVERY_SOURCE};
use crate::error::{ConsensusError, ProviderError};
use crate::providers::client::{truncate, ERROR_BODY_LIMIT};
use crate::providers::{ProviderClient, ProviderDescriptor};

/// Discovers current models and provider balances.
#[derive(Clone)]
pub struct ModelDiscovery {
    client: ProviderClient,
}

impl ModelDiscovery {
    pub fn new(client: ProviderClient) -> Self {
        Self { client }
    }

    /// Model ids listed by a provider.
    pub async fn list_models(&self, provider_id: &str) -> Result<Vec<String>, ProviderError> {
        let registry = self.client.registry();
        let descriptor = registry
            .descriptor(provider_id)
            .ok_or_else(|| ProviderError::UnknownProvider(provider_id.to_string()))?;
        let api_key = registry
            .api_key(provider_id)
            .ok_or_else(|| ProviderError::MissingApiKey(descriptor.api_key_env.clone()))?;

        let json = self
            .get_json(&descriptor.models_endpoint, descriptor, api_key)
            .await?;

        let ids = json
            .get("data")
            .and_then(Value::as_array)
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .ok_or_else(|| ProviderError::MissingContent("data".to_string()))?;

        Ok(ids)
    }

    /// Rebuild the catalog from provider listings and persist it.
    ///
    /// Providers that fail keep their current entry. Fails only when no
    /// provider could be listed at all.
    pub async fn refresh_catalog(&self) -> Result<ModelCatalog, ConsensusError> {
        let registry = self.client.registry();
        let current = registry.catalog();
        let mut models = current.models.clone();
        let mut listed = 0usize;

        for descriptor in registry.descriptors() {
            match self.list_models(&descriptor.id).await {
                Ok(available) => {
                    listed += 1;
                    let current_id = current.model_id(&descriptor.id);
                    if let Some(id) = select_model(descriptor, &available, current_id) {
                        tracing::info!(provider = %descriptor.id, model = %id, "Model selected");
                        models.insert(
                            descriptor.id.clone(),
                            ModelEntry {
                                id,
                                docs_url: Some(descriptor.docs_url.clone()),
                            },
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(provider = %descriptor.id, error = %e, "Model listing failed; keeping current entry");
                }
            }
        }

        if listed == 0 {
            return Err(ConsensusError::Internal(
                "no provider returned a model listing".to_string(),
            ));
        }

        let catalog = ModelCatalog {
            last_updated: Utc::now().to_rfc3339(),
            source: DISCOVERY_SOURCE.to_string(),
            models,
        };
        registry.persist(catalog.clone())?;
        tracing::info!(
            path = %registry.catalog_path().display(),
            models = catalog.models.len(),
            "Model catalog persisted"
        );

        Ok(catalog)
    }

    /// Remaining prepaid credit for a provider with a balance API.
    ///
    /// Any failure reports `unknown` rather than an error.
    pub async fn credit_status(&self, provider_id: &str, initial_balance: f64) -> CreditStatus {
        match self.fetch_balance(provider_id).await {
            Ok(balance) => CreditStatus::from_balance(provider_id, balance, initial_balance),
            Err(e) => {
                tracing::warn!(provider = %provider_id, error = %e, "Credit check failed");
                CreditStatus::unknown(provider_id)
            }
        }
    }

    /// Credit status for every provider that exposes a balance endpoint.
    pub async fn credit_report(&self, initial_balance: f64) -> Vec<CreditStatus> {
        let mut report = Vec::new();
        for descriptor in self.client.registry().descriptors() {
            if descriptor.balance_endpoint.is_some() {
                report.push(self.credit_status(&descriptor.id, initial_balance).await);
            }
        }
        report
    }

    async fn fetch_balance(&self, provider_id: &str) -> Result<f64, ProviderError> {
        let registry = self.client.registry();
        let descriptor = registry
            .descriptor(provider_id)
            .ok_or_else(|| ProviderError::UnknownProvider(provider_id.to_string()))?;
        let endpoint = descriptor
            .balance_endpoint
            .as_deref()
            .ok_or_else(|| ProviderError::UnknownProvider(provider_id.to_string()))?;
        let api_key = registry
            .api_key(provider_id)
            .ok_or_else(|| ProviderError::MissingApiKey(descriptor.api_key_env.clone()))?;

        let json = self.get_json(endpoint, descriptor, api_key).await?;
        parse_balance(&json).ok_or_else(|| ProviderError::MissingContent("total_balance".to_string()))
    }

    async fn get_json(
        &self,
        url: &str,
        descriptor: &ProviderDescriptor,
        api_key: &str,
    ) -> Result<Value, ProviderError> {
        let response = self
            .client
            .http()
            .get(url)
            .headers(descriptor.auth.headers(api_key)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        Ok(response.json().await?)
    }
}

/// First preferred model the provider lists; otherwise the current model.
fn select_model(
    descriptor: &ProviderDescriptor,
    available: &[String],
    current: Option<&str>,
) -> Option<String> {
    descriptor
        .preferred_models
        .iter()
        .find(|preferred| available.iter().any(|id| id == *preferred))
        .cloned()
        .or_else(|| current.map(str::to_string))
}

/// Accepts `total_balance` at the top level or inside `balance_infos[0]`,
/// as a number or a numeric string.
fn parse_balance(json: &Value) -> Option<f64> {
    let value = json.get("total_balance").or_else(|| {
        json.get("balance_infos")
            .and_then(|infos| infos.get(0))
            .and_then(|info| info.get("total_balance"))
    })?;

    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Spawn the background catalog refresh loop.
///
/// Runs once immediately, then every `refresh_interval_hours`. A failed
/// run is retried after `retry_interval_minutes`.
pub fn spawn_refresh_task(discovery: ModelDiscovery, config: DiscoveryConfig) -> JoinHandle<()> {
    let refresh = Duration::from_secs(config.refresh_interval_hours.max(1) * 60 * 60);
    let retry = Duration::from_secs(config.retry_interval_minutes.max(1) * 60);

    tokio::spawn(async move {
        loop {
            let result = if config.enabled {
                tracing::info!("Running model discovery");
                discovery.refresh_catalog().await.map(|_| ())
            } else {
                discovery.client.registry().reload()
            };

            for status in discovery.credit_report(config.initial_credit_balance).await {
                tracing::info!(
                    provider = %status.provider_id,
                    status = %status.status,
                    percentage = status.percentage,
                    "Credit status"
                );
            }

            let wait = match result {
                Ok(()) => refresh,
                Err(e) => {
                    tracing::warn!(error = %e, retry_in_secs = retry.as_secs(), "Catalog refresh failed");
                    retry
                }
            };
            tokio::time::sleep(wait).await;
        }
    })
}
