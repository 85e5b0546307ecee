//! Data-driven provider descriptors.
//!
//! Every provider is described by a table entry: where to send requests,
//! how to authenticate, how to shape the payload and where the answer text
//! lives in the response. One generic client consumes these entries.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ProviderError;

/// Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// How a provider expects its API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AuthStrategy {
    /// `Authorization: Bearer <key>`.
    Bearer,
    /// `x-api-key: <key>` plus an `anthropic-version` header.
    ApiKeyHeader { version: String },
}

impl AuthStrategy {
    /// Build authentication headers for a key.
    pub fn headers(&self, api_key: &str) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        match self {
            AuthStrategy::Bearer => {
                headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", api_key))?);
            }
            AuthStrategy::ApiKeyHeader { version } => {
                headers.insert(HeaderName::from_static("x-api-key"), header_value(api_key)?);
                headers.insert(
                    HeaderName::from_static("anthropic-version"),
                    header_value(version)?,
                );
            }
        }
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ProviderError> {
    HeaderValue::from_str(value).map_err(|_| ProviderError::InvalidHeader)
}

/// Payload shape for a completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum RequestFormat {
    /// OpenAI-compatible chat completions.
    ChatCompletions { temperature: f64, max_tokens: u32 },
    /// Anthropic messages API.
    Messages { max_tokens: u32 },
}

impl RequestFormat {
    /// Build the JSON body for a prompt.
    pub fn body(&self, model_id: &str, prompt: &str) -> Value {
        let messages = json!([{ "role": "user", "content": prompt }]);
        match self {
            RequestFormat::ChatCompletions {
                temperature,
                max_tokens,
            } => json!({
                "model": model_id,
                "messages": messages,
                "temperature": temperature,
                "max_tokens": max_tokens,
            }),
            RequestFormat::Messages { max_tokens } => json!({
                "model": model_id,
                "max_tokens": max_tokens,
                "messages": messages,
            }),
        }
    }
}

/// One step into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{}", k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Parse a dotted path like `choices.0.message.content`.
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<usize>() {
            Ok(i) => PathSegment::Index(i),
            Err(_) => PathSegment::Key(s.to_string()),
        })
        .collect()
}

/// Render a path back to dotted form.
pub fn format_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Follow a path through a JSON value to a string.
pub fn extract_text<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a str> {
    let mut current = value;
    for segment in path {
        current = match segment {
            PathSegment::Key(k) => current.get(k.as_str())?,
            PathSegment::Index(i) => current.get(*i)?,
        };
    }
    current.as_str()
}

/// Static description of one provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub display_name: String,
    pub vendor: String,
    /// Completion endpoint.
    pub endpoint: String,
    /// Model listing endpoint used by discovery.
    pub models_endpoint: String,
    /// Prepaid balance endpoint, when the provider exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_endpoint: Option<String>,
    pub docs_url: String,
    /// Published training data cutoff of the default model.
    pub training_cutoff: String,
    pub auth: AuthStrategy,
    pub request_format: RequestFormat,
    /// Where the answer text lives in a completion response.
    pub content_path: Vec<PathSegment>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Model used when the catalog has no entry for this provider.
    pub default_model: String,
    /// Discovery picks the first of these the provider lists.
    pub preferred_models: Vec<String>,
}

impl ProviderDescriptor {
    pub fn openai() -> Self {
        Self {
            id: "openai".to_string(),
            display_name: "GPT-4o".to_string(),
            vendor: "OpenAI".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            models_endpoint: "https://api.openai.com/v1/models".to_string(),
            balance_endpoint: None,
            docs_url: "https://platform.openai.com/docs/models".to_string(),
            training_cutoff: "April 2023".to_string(),
            auth: AuthStrategy::Bearer,
            request_format: RequestFormat::ChatCompletions {
                temperature: 0.1,
                max_tokens: 1000,
            },
            content_path: parse_path("choices.0.message.content"),
            api_key_env: "OPENAI_API_KEY".to_string(),
            default_model: "gpt-4o".to_string(),
            preferred_models: strings(&["gpt-4o", "gpt-4.1", "gpt-4-turbo", "gpt-4"]),
        }
    }

    pub fn anthropic() -> Self {
        Self {
            id: "anthropic".to_string(),
            display_name: "Claude".to_string(),
            vendor: "Anthropic".to_string(),
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            models_endpoint: "https://api.anthropic.com/v1/models".to_string(),
            balance_endpoint: None,
            docs_url: "https://docs.anthropic.com/about-claude/models/overview".to_string(),
            training_cutoff: "August 2023".to_string(),
            auth: AuthStrategy::ApiKeyHeader {
                version: ANTHROPIC_VERSION.to_string(),
            },
            request_format: RequestFormat::Messages { max_tokens: 1000 },
            content_path: parse_path("content.0.text"),
            api_key_env: "CLAUDE_API_KEY".to_string(),
            default_model: "claude-3-5-sonnet-20241022".to_string(),
            preferred_models: strings(&[
                "claude-sonnet-4-20250514",
                "claude-3-7-sonnet-latest",
                "claude-3-5-sonnet-latest",
                "claude-3-5-sonnet-20241022",
            ]),
        }
    }

    pub fn mistral() -> Self {
        Self {
            id: "mistral".to_string(),
            display_name: "Mistral Large".to_string(),
            vendor: "Mistral AI".to_string(),
            endpoint: "https://api.mistral.ai/v1/chat/completions".to_string(),
            models_endpoint: "https://api.mistral.ai/v1/models".to_string(),
            balance_endpoint: None,
            docs_url: "https://docs.mistral.ai/getting-started/models/".to_string(),
            training_cutoff: "December 2023".to_string(),
            auth: AuthStrategy::Bearer,
            request_format: RequestFormat::ChatCompletions {
                temperature: 0.1,
                max_tokens: 1000,
            },
            content_path: parse_path("choices.0.message.content"),
            api_key_env: "MISTRAL_API_KEY".to_string(),
            default_model: "mistral-large-latest".to_string(),
            preferred_models: strings(&["mistral-large-latest", "mistral-medium-latest"]),
        }
    }

    pub fn deepseek() -> Self {
        Self {
            id: "deepseek".to_string(),
            display_name: "DeepSeek Chat".to_string(),
            vendor: "DeepSeek AI".to_string(),
            endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
            models_endpoint: "https://api.deepseek.com/v1/models".to_string(),
            balance_endpoint: Some("https://api.deepseek.com/user/balance".to_string()),
            docs_url: "https://api-docs.deepseek.com/models".to_string(),
            training_cutoff: "January 2023".to_string(),
            auth: AuthStrategy::Bearer,
            request_format: RequestFormat::ChatCompletions {
                temperature: 0.1,
                max_tokens: 1000,
            },
            content_path: parse_path("choices.0.message.content"),
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
            default_model: "deepseek-chat".to_string(),
            preferred_models: strings(&["deepseek-chat"]),
        }
    }

    /// The built-in provider table.
    pub fn builtin() -> Vec<Self> {
        vec![Self::openai(), Self::anthropic(), Self::mistral(), Self::deepseek()]
    }

    /// Headers for a completion request.
    pub fn request_headers(&self, api_key: &str) -> Result<HeaderMap, ProviderError> {
        let mut headers = self.auth.headers(api_key)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
