//! Generic provider client.
//!
//! One function queries any provider described in the registry. Every
//! failure is folded into a `ModelResponse` with `success = false`; nothing
//! propagates past this boundary.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use serde_json::Value;

use crate::domain::{into_batch, ModelResponse, ResponseBatch};
use crate::error::ProviderError;
use crate::providers::{extract_text, format_path, ProviderRegistry};

/// Longest body excerpt kept in an error message.
pub(crate) const ERROR_BODY_LIMIT: usize = 500;

/// Queries providers through the registry's descriptor table.
#[derive(Clone)]
pub struct ProviderClient {
    client: Client,
    registry: Arc<ProviderRegistry>,
}

impl ProviderClient {
    /// Create a client with a per-request timeout.
    pub fn new(registry: Arc<ProviderRegistry>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self { client, registry })
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Send one prompt to one provider.
    pub async fn query_provider(&self, provider_id: &str, prompt: &str) -> ModelResponse {
        let model_id = self.registry.model_id(provider_id);

        let response = match self.try_query(provider_id, prompt).await {
            Ok(text) => ModelResponse::success(provider_id, text),
            Err(e) => {
                tracing::warn!(provider = %provider_id, error = %e, "Provider query failed");
                ModelResponse::failure(provider_id, e.to_string())
            }
        };

        match model_id {
            Some(model_id) => response.with_model(model_id),
            None => response,
        }
    }

    /// Send one prompt to every enabled provider concurrently.
    pub async fn query_all(&self, prompt: &str) -> ResponseBatch {
        let queries = self
            .registry
            .enabled()
            .iter()
            .map(|provider_id| self.query_provider(provider_id, prompt));

        into_batch(join_all(queries).await)
    }

    async fn try_query(&self, provider_id: &str, prompt: &str) -> Result<String, ProviderError> {
        let descriptor = self
            .registry
            .descriptor(provider_id)
            .ok_or_else(|| ProviderError::UnknownProvider(provider_id.to_string()))?;
        let api_key = self
            .registry
            .api_key(provider_id)
            .ok_or_else(|| ProviderError::MissingApiKey(descriptor.api_key_env.clone()))?;
        let model_id = self
            .registry
            .model_id(provider_id)
            .unwrap_or_else(|| descriptor.default_model.clone());

        tracing::debug!(provider = %provider_id, model = %model_id, "Querying provider");

        let response = self
            .client
            .post(&descriptor.endpoint)
            .headers(descriptor.request_headers(api_key)?)
            .json(&descriptor.request_format.body(&model_id, prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        let json: Value =
            serde_json::from_str(&body).map_err(|e| ProviderError::InvalidJson(e.to_string()))?;

        extract_text(&json, &descriptor.content_path)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::MissingContent(format_path(&descriptor.content_path)))
    }
}

/// Cut `text` to `limit` characters, marking the cut with `...`.
pub(crate) fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderDescriptor;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry_for(server: &MockServer, dir: &tempfile::TempDir) -> Arc<ProviderRegistry> {
        let openai = ProviderDescriptor {
            endpoint: format!("{}/v1/chat/completions", server.uri()),
            ..ProviderDescriptor::openai()
        };
        let anthropic = ProviderDescriptor {
            endpoint: format!("{}/v1/messages", server.uri()),
            ..ProviderDescriptor::anthropic()
        };
        let mistral = ProviderDescriptor {
            endpoint: format!("{}/mistral/chat/completions", server.uri()),
            ..ProviderDescriptor::mistral()
        };

        let api_keys: HashMap<String, String> = [
            ("openai", "sk-openai"),
            ("anthropic", "sk-anthropic"),
            ("mistral", "sk-mistral"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Arc::new(ProviderRegistry::new(
            vec![openai, anthropic, mistral],
            api_keys,
            vec!["openai".to_string(), "anthropic".to_string(), "mistral".to_string()],
            dir.path().join("catalog.json"),
        ))
    }

    fn client_for(registry: Arc<ProviderRegistry>) -> ProviderClient {
        ProviderClient::new(registry, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_openai_style_success() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-openai"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "**TRUE**"}}]
            })))
            .mount(&server)
            .await;

        let client = client_for(registry_for(&server, &dir));
        let response = client.query_provider("openai", "prompt").await;

        assert!(response.success);
        assert_eq!(response.text.as_deref(), Some("**TRUE**"));
        assert_eq!(response.model_id.as_deref(), Some("gpt-4o"));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_anthropic_style_success() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-anthropic"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "FALSE"}]
            })))
            .mount(&server)
            .await;

        let client = client_for(registry_for(&server, &dir));
        let response = client.query_provider("anthropic", "prompt").await;

        assert!(response.success);
        assert_eq!(response.text.as_deref(), Some("FALSE"));
    }

    #[tokio::test]
    async fn test_non_200_becomes_failure() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = client_for(registry_for(&server, &dir));
        let response = client.query_provider("openai", "prompt").await;

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("API error 429: rate limited"));
    }

    #[tokio::test]
    async fn test_non_json_becomes_failure() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(registry_for(&server, &dir));
        let response = client.query_provider("openai", "prompt").await;

        assert!(!response.success);
        assert!(response.error.unwrap().starts_with("response is not valid JSON"));
    }

    #[tokio::test]
    async fn test_missing_content_path_becomes_failure() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = client_for(registry_for(&server, &dir));
        let response = client.query_provider("openai", "prompt").await;

        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("response has no text at 'choices.0.message.content'")
        );
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_json(serde_json::json!({
                        "choices": [{"message": {"content": "TRUE"}}]
                    })),
            )
            .mount(&server)
            .await;

        let registry = registry_for(&server, &dir);
        let client = ProviderClient::new(registry, Duration::from_millis(200)).unwrap();
        let response = client.query_provider("openai", "prompt").await;

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("request timed out"));
    }

    #[tokio::test]
    async fn test_unknown_and_unkeyed_providers() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(ProviderRegistry::new(
            vec![ProviderDescriptor::deepseek()],
            HashMap::new(),
            vec!["deepseek".to_string()],
            dir.path().join("catalog.json"),
        ));
        let client = client_for(registry);

        let unknown = client.query_provider("nope", "prompt").await;
        assert!(!unknown.success);
        assert_eq!(unknown.error.as_deref(), Some("unknown provider 'nope'"));
        assert!(unknown.model_id.is_none());

        let unkeyed = client.query_provider("deepseek", "prompt").await;
        assert!(!unkeyed.success);
        assert_eq!(
            unkeyed.error.as_deref(),
            Some("no API key configured (set DEEPSEEK_API_KEY)")
        );
    }

    #[tokio::test]
    async fn test_query_all_tolerates_partial_failure() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "TRUE"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "TRUE"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/mistral/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(registry_for(&server, &dir));
        let batch = client.query_all("prompt").await;

        assert_eq!(batch.len(), 3);
        assert!(batch["openai"].success);
        assert!(batch["anthropic"].success);
        assert!(!batch["mistral"].success);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
