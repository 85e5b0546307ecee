//! Raw provider responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One provider's answer to one prompt, as returned by the query layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModelResponse {
    /// Stable provider identifier (e.g. "openai").
    pub provider_id: String,

    /// Whether the provider call produced content.
    pub success: bool,

    /// Raw response text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Failure description when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Model that answered, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl ModelResponse {
    /// Create a successful response.
    pub fn success(provider_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            success: true,
            text: Some(text.into()),
            error: None,
            model_id: None,
        }
    }

    /// Create a failed response. An empty message is replaced so that failures
    /// always carry a description.
    pub fn failure(provider_id: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            "unknown provider error".to_string()
        } else {
            error
        };

        Self {
            provider_id: provider_id.into(),
            success: false,
            text: None,
            error: Some(error),
            model_id: None,
        }
    }

    /// Attach the model identifier.
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Text usable for interpretation: present only for successful,
    /// non-blank responses.
    pub fn usable_text(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Responses for one request, keyed by provider id.
pub type ResponseBatch = BTreeMap<String, ModelResponse>;

/// Key a list of responses by provider id. Later duplicates replace earlier ones.
pub fn into_batch(responses: impl IntoIterator<Item = ModelResponse>) -> ResponseBatch {
    responses
        .into_iter()
        .map(|r| (r.provider_id.clone(), r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_always_has_message() {
        let response = ModelResponse::failure("openai", "   ");
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("unknown provider error"));
    }

    #[test]
    fn test_usable_text() {
        assert_eq!(
            ModelResponse::success("openai", "TRUE").usable_text(),
            Some("TRUE")
        );
        assert_eq!(ModelResponse::success("openai", " \n ").usable_text(), None);
        assert_eq!(ModelResponse::failure("openai", "timeout").usable_text(), None);
    }

    #[test]
    fn test_into_batch_keys_by_provider() {
        let batch = into_batch(vec![
            ModelResponse::success("openai", "TRUE"),
            ModelResponse::failure("mistral", "timeout"),
        ]);
        assert_eq!(batch.len(), 2);
        assert!(batch["openai"].success);
        assert!(!batch["mistral"].success);
    }
}
