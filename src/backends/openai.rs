//! OpenAI-compatible scoring backend.
//!
//! This module provides a backend implementation that sends one
//! chat-completions request per batch to an OpenAI-compatible API and
//! parses the model's JSON output into the scoring schema.
//!
//! # Requirements
//!
//! - An API key
//! - Network access to the configured endpoint
//!
//! Only the parts of the wire protocol needed to drive retry and
//! circuit-breaker decisions are modelled: the HTTP status classes, the
//! `Retry-After` header, and the presence of a parseable payload.

use crate::core::{ScoreBackend, ScoreError, ScorePayload, ScoreRequest, PAYLOAD_VERSION};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Fixed system instruction requiring schema-conformant output.
const SYSTEM_PROMPT: &str = "You score text items for relevance. Respond with a single \
JSON object of the form {\"version\": \"1.0\", \"scores\": [{\"item_id\": \"<id>\", \
\"score\": <integer 0-100>, \"reason\": \"<short explanation>\"}]} and nothing else.";

/// OpenAI backend configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key (kept secret).
    pub api_key: SecretString,

    /// Base URL for the API.
    pub base_url: String,

    /// Model identifier to request.
    pub model: String,

    /// Sampling temperature; 0.0 keeps scoring as deterministic as the
    /// provider allows.
    pub temperature: f32,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into().into()),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Scoring backend over an OpenAI-compatible chat-completions API.
///
/// # Example
///
/// ```rust,ignore
/// use scorepipe::backends::openai::{OpenAiBackend, OpenAiConfig};
///
/// let config = OpenAiConfig::new("your-api-key").with_model("gpt-4o-mini");
/// let backend = OpenAiBackend::new(config)?;
/// ```
#[derive(Debug)]
pub struct OpenAiBackend {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiBackend {
    /// Backend name used in errors and logs.
    pub const NAME: &'static str = "openai";

    /// Creates a new backend with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, ScoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                ScoreError::configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    /// Maps a non-success HTTP status onto the error taxonomy.
    fn classify_status(&self, status: reqwest::StatusCode, body: String) -> ScoreError {
        let code = status.as_u16();
        match code {
            429 => ScoreError::rate_limited(Self::NAME, None),
            401 | 403 => ScoreError::auth_failed(Self::NAME, code, body),
            400..=499 => ScoreError::invalid_request(Self::NAME, code, body),
            _ => ScoreError::server_error(Self::NAME, code, body),
        }
    }

    /// Maps a transport-level reqwest error onto the error taxonomy.
    fn classify_transport(&self, error: reqwest::Error) -> ScoreError {
        if error.is_timeout() {
            ScoreError::timeout(Self::NAME, self.config.request_timeout)
        } else {
            ScoreError::connection_failed(Self::NAME, error.to_string())
        }
    }

    async fn send_request(&self, request: &ScoreRequest) -> Result<ScorePayload, ScoreError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": request.prompt},
            ],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ScoreError::rate_limited(Self::NAME, retry_after));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.classify_status(status, body));
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ScoreError::malformed_response(Self::NAME, e.to_string()))?;

        let content = envelope
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                ScoreError::malformed_response(Self::NAME, "missing message content")
            })?;

        ScorePayload::from_json(content, Self::NAME)
    }
}

#[async_trait]
impl ScoreBackend for OpenAiBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScorePayload, ScoreError> {
        tracing::debug!(
            backend = Self::NAME,
            model = %self.config.model,
            batch_index = request.batch.index,
            batch_size = request.batch.len(),
            schema_version = PAYLOAD_VERSION,
            "Dispatching scoring request"
        );

        tokio::select! {
            _ = request.cancel.cancelled() => Err(ScoreError::Cancelled),
            result = self.send_request(request) => result,
        }
    }

    async fn health_check(&self) -> Result<(), ScoreError> {
        let url = format!("{}/models", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(self.classify_status(status, body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = OpenAiConfig::new("test-key")
            .with_base_url("http://localhost:8080/v1")
            .with_model("local-model")
            .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "local-model");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_status_classification() {
        let backend = OpenAiBackend::new(OpenAiConfig::new("k")).unwrap();

        let err = backend.classify_status(reqwest::StatusCode::UNAUTHORIZED, "no".into());
        assert!(matches!(err, ScoreError::AuthFailed { status: 401, .. }));

        let err = backend.classify_status(reqwest::StatusCode::NOT_FOUND, "gone".into());
        assert!(matches!(err, ScoreError::InvalidRequest { status: 404, .. }));

        let err = backend.classify_status(reqwest::StatusCode::BAD_GATEWAY, "oops".into());
        assert!(matches!(err, ScoreError::ServerError { status: 502, .. }));
    }
}
