//! HTTP request handlers.

use axum::{extract::State, Json};
use uuid::Uuid;

use crate::api::types::*;
use crate::error::{ApiResult, ConsensusError};
use crate::AppState;

/// Put a claim to every enabled provider and return the consensus.
///
/// POST /v1/ask
#[utoipa::path(
    post,
    path = "/v1/ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Consensus computed", body = AskResponse),
        (status = 400, description = "Empty or malformed query"),
        (status = 500, description = "Internal error")
    ),
    tag = "consensus"
)]
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> ApiResult<Json<AskResponse>> {
    if request.query.trim().is_empty() {
        return Err(ConsensusError::BadRequest(
            "query must not be empty".to_string(),
        ));
    }

    let request_id = Uuid::new_v4();
    let prepared = state.preprocessor.prepare(&request.query);

    tracing::info!(
        request_id = %request_id,
        query = %prepared.query,
        providers = state.client.registry().enabled().len(),
        "Consensus request"
    );

    let responses = state.client.query_all(&prepared.structured_query).await;
    let consensus = state.coordinator.aggregate(&responses);

    tracing::info!(
        request_id = %request_id,
        verdict = %consensus.verdict,
        confidence = consensus.confidence_percentage,
        "Consensus request complete"
    );

    Ok(Json(AskResponse {
        request_id,
        query: prepared.query,
        structured_query: prepared.structured_query,
        consensus,
        responses,
    }))
}

/// Current model catalog and provider table.
///
/// GET /v1/models
#[utoipa::path(
    get,
    path = "/v1/models",
    responses(
        (status = 200, description = "Model catalog", body = ModelsResponse)
    ),
    tag = "providers"
)]
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let registry = state.client.registry();
    let catalog = registry.catalog();

    let providers = registry
        .descriptors()
        .iter()
        .map(|d| {
            let enabled = registry.enabled().contains(&d.id);
            let configured = registry.api_key(&d.id).is_some();
            ProviderInfo {
                id: d.id.clone(),
                display_name: d.display_name.clone(),
                vendor: d.vendor.clone(),
                model_id: catalog
                    .model_id(&d.id)
                    .unwrap_or(d.default_model.as_str())
                    .to_string(),
                docs_url: d.docs_url.clone(),
                training_cutoff: d.training_cutoff.clone(),
                enabled,
                configured,
                status: ProviderStatus::of(enabled, configured),
            }
        })
        .collect();

    Json(ModelsResponse { catalog, providers })
}

/// Prepaid credit status for providers with a balance API.
///
/// GET /v1/credit
#[utoipa::path(
    get,
    path = "/v1/credit",
    responses(
        (status = 200, description = "Credit status", body = CreditResponse)
    ),
    tag = "providers"
)]
pub async fn credit_status(State(state): State<AppState>) -> Json<CreditResponse> {
    let providers = state
        .discovery
        .credit_report(state.initial_credit_balance)
        .await;

    Json(CreditResponse { providers })
}

/// Health check endpoint.
///
/// GET /v1/health
#[utoipa::path(
    get,
    path = "/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.client.registry();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: registry.enabled().to_vec(),
        catalog_source: registry.catalog().source,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::{Judgment, Verdict};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.providers.enabled = vec!["openai".to_string(), "mistral".to_string()];
        for id in ["openai", "anthropic", "mistral", "deepseek"] {
            config
                .providers
                .api_keys
                .insert(id.to_string(), format!("sk-{}", id));
        }
        config.providers.endpoints.insert(
            "openai".to_string(),
            format!("{}/openai/chat/completions", server.uri()),
        );
        config.providers.endpoints.insert(
            "mistral".to_string(),
            format!("{}/mistral/chat/completions", server.uri()),
        );
        config.discovery.model_config_path = dir.path().join("catalog.json");
        config
    }

    fn chat_reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": text}}]
        }))
    }

    #[test]
    fn test_ask_rejects_blank_query() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.discovery.model_config_path = dir.path().join("catalog.json");
        let state = AppState::from_config(&config).unwrap();

        let result = tokio_test::block_on(ask(
            State(state),
            Json(AskRequest {
                query: "   ".to_string(),
            }),
        ));

        assert!(matches!(result, Err(ConsensusError::BadRequest(_))));
    }

    #[test]
    fn test_state_requires_a_known_provider() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.discovery.model_config_path = dir.path().join("catalog.json");
        config.providers.enabled = vec!["palm".to_string()];

        let result = AppState::from_config(&config);

        assert!(matches!(result, Err(ConsensusError::Config(_))));
    }

    #[tokio::test]
    async fn test_ask_returns_consensus_and_responses() {
        crate::logging::init_test();
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/openai/chat/completions"))
            .respond_with(chat_reply("**TRUE** - water boils at 100C at sea level."))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/mistral/chat/completions"))
            .respond_with(chat_reply("# TRUE"))
            .mount(&server)
            .await;

        let state = AppState::from_config(&config_for(&server, &dir)).unwrap();
        let Json(response) = ask(
            State(state),
            Json(AskRequest {
                query: "Is it true that water boils at 100C at sea level?".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(
            response.structured_query,
            "This is a consensus request for a TRUE, FALSE or UNCERTAIN response: water boils at 100c at sea level?"
        );
        assert_eq!(response.consensus.verdict, Verdict::True);
        assert_eq!(response.consensus.confidence_percentage, 100);
        assert_eq!(response.consensus.judgments["mistral"], Judgment::True);
        assert_eq!(response.responses.len(), 2);
        assert_eq!(response.responses["openai"].model_id.as_deref(), Some("gpt-4o"));
    }

    #[tokio::test]
    async fn test_ask_with_every_provider_failing() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let state = AppState::from_config(&config_for(&server, &dir)).unwrap();
        let Json(response) = ask(
            State(state),
            Json(AskRequest {
                query: "The moon is made of cheese".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.consensus.verdict, Verdict::Uncertain);
        assert_eq!(response.consensus.confidence_percentage, 0);
        assert!(response.consensus.judgments.is_empty());
        assert!(response.responses.values().all(|r| !r.success));
    }

    #[test]
    fn test_provider_status_from_flags() {
        assert_eq!(ProviderStatus::of(true, true), ProviderStatus::Active);
        assert_eq!(ProviderStatus::of(true, false), ProviderStatus::MissingKey);
        assert_eq!(ProviderStatus::of(false, true), ProviderStatus::Disabled);
        assert_eq!(
            serde_json::to_value(ProviderStatus::MissingKey).unwrap(),
            serde_json::json!("missing_key")
        );
    }

    #[tokio::test]
    async fn test_list_models_reports_fallback_catalog() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::from_config(&config_for(&server, &dir)).unwrap();

        let Json(response) = list_models(State(state)).await;

        assert!(response.catalog.is_fallback());
        assert_eq!(response.providers.len(), 4);
        let anthropic = response
            .providers
            .iter()
            .find(|p| p.id == "anthropic")
            .unwrap();
        assert!(!anthropic.enabled);
        assert!(anthropic.configured);
        assert_eq!(anthropic.status, ProviderStatus::Disabled);
        assert_eq!(anthropic.training_cutoff, "August 2023");
        assert_eq!(anthropic.model_id, "claude-3-opus-20240229");

        let openai = response.providers.iter().find(|p| p.id == "openai").unwrap();
        assert_eq!(openai.status, ProviderStatus::Active);
        assert_eq!(openai.training_cutoff, "April 2023");
    }
}
