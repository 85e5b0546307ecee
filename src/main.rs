//! Consensus Core - multi-model claim verification service.
//!
//! Puts a claim to several LLM providers, interprets each free-text answer
//! as TRUE, FALSE or UNCERTAIN (or an opt-out) and reduces the answers to a
//! single verdict with a confidence score.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

mod api;
mod config;
mod domain;
mod engine;
mod error;
mod logging;
mod providers;

use crate::api::build_router;
use crate::config::Config;
use crate::engine::{ConsensusCoordinator, KeywordClassifier, PhraseOptOutDetector, QueryPreprocessor};
use crate::error::ConsensusError;
use crate::providers::{spawn_refresh_task, ModelDiscovery, ProviderClient, ProviderRegistry};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The interpretation and aggregation pipeline.
    pub coordinator: Arc<ConsensusCoordinator>,
    /// Claim to prompt preprocessing.
    pub preprocessor: Arc<QueryPreprocessor>,
    /// Provider query client.
    pub client: ProviderClient,
    /// Model discovery and credit checks.
    pub discovery: ModelDiscovery,
    /// Balance treated as 100% in credit reports.
    pub initial_credit_balance: f64,
}

impl AppState {
    /// Wire every component from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConsensusError> {
        let registry = Arc::new(ProviderRegistry::from_config(
            &config.providers,
            &config.discovery.model_config_path,
        ));
        if registry.enabled().is_empty() {
            return Err(ConsensusError::Config(format!(
                "providers.enabled names no known provider: {:?}",
                config.providers.enabled
            )));
        }

        let client = ProviderClient::new(
            registry,
            Duration::from_secs(config.providers.timeout_secs),
        )
        .map_err(|e| ConsensusError::Internal(e.to_string()))?;

        let interpretation = &config.interpretation;
        let coordinator = ConsensusCoordinator::new(
            Box::new(PhraseOptOutDetector::new(
                &interpretation.extra_recusal_phrases,
                &interpretation.extra_policy_phrases,
            )),
            Box::new(KeywordClassifier::new(
                &interpretation.extra_uncertainty_phrases,
            )),
        );

        Ok(Self {
            coordinator: Arc::new(coordinator),
            preprocessor: Arc::new(QueryPreprocessor::new(&config.query)),
            discovery: ModelDiscovery::new(client.clone()),
            client,
            initial_credit_balance: config.discovery.initial_credit_balance,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting Consensus Core v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        providers = ?config.providers.enabled,
        timeout_secs = config.providers.timeout_secs,
        discovery = config.discovery.enabled,
        catalog = %config.discovery.model_config_path.display(),
        "Configuration loaded"
    );

    let state = AppState::from_config(&config)?;

    let catalog = state.client.registry().catalog();
    tracing::info!(
        catalog_source = %catalog.source,
        fallback = catalog.is_fallback(),
        "Model catalog loaded"
    );

    let _refresh = spawn_refresh_task(state.discovery.clone(), config.discovery.clone());

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
