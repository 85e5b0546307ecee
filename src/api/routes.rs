//! Route definitions for the API.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::AppState;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::ask,
        handlers::list_models,
        handlers::credit_status,
        handlers::health_check,
    ),
    components(schemas(
        crate::api::types::AskRequest,
        crate::api::types::AskResponse,
        crate::api::types::ModelsResponse,
        crate::api::types::ProviderInfo,
        crate::api::types::ProviderStatus,
        crate::api::types::CreditResponse,
        crate::api::types::HealthResponse,
        crate::domain::ConsensusResult,
        crate::domain::ConfidenceLevel,
        crate::domain::CreditLevel,
        crate::domain::CreditStatus,
        crate::domain::Judgment,
        crate::domain::JudgmentTally,
        crate::domain::ModelEntry,
        crate::domain::ModelResponse,
        crate::domain::Verdict,
    )),
    tags(
        (name = "consensus", description = "Claim verification"),
        (name = "providers", description = "Model catalog and provider credit"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Consensus Core API",
        version = "0.1.0",
        description = "Multi-model consensus engine - asks several LLM providers for a TRUE/FALSE/UNCERTAIN judgment and reduces them to one verdict",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Consensus
        .route("/v1/ask", post(handlers::ask))
        .route("/ask", post(handlers::ask))
        // Providers
        .route("/v1/models", get(handlers::list_models))
        .route("/v1/credit", get(handlers::credit_status))
        // Health
        .route("/v1/health", get(handlers::health_check))
        .with_state(state)
        // OpenAPI docs
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router(dir: &tempfile::TempDir) -> Router {
        let mut config = Config::default();
        config.discovery.model_config_path = dir.path().join("catalog.json");
        build_router(AppState::from_config(&config).unwrap())
    }

    #[tokio::test]
    async fn test_health_route() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(&dir)
            .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ask_alias_rejects_empty_query() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(&dir)
            .oneshot(
                Request::post("/ask")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": ""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(&dir)
            .oneshot(
                Request::get("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
