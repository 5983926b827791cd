use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Prefix of every text a client returns in place of a completion
pub const MODEL_ERROR_PREFIX: &str = "[model error]";

/// Generative model used to summarize prompts.
///
/// Failures are returned as text starting with [`MODEL_ERROR_PREFIX`] rather
/// than as errors, so the pipeline always has something to report.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str, timeout: Duration) -> String;
}

pub fn model_error_text(message: impl std::fmt::Display) -> String {
    format!("{MODEL_ERROR_PREFIX} {message}")
}

/// Google Gemini `generateContent` client
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| AnalysisError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let client = Self::new(&config.model_base_url, &config.model, config.api_key.clone())?;
        if client.api_key.is_none() {
            log::warn!("No GEMINI_API_KEY/GOOGLE_API_KEY set; summaries will only contain model errors");
        }
        Ok(client)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_url(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        )
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        })
    }

    /// Concatenated text parts of the first candidate
    fn parse_response(body: &Value) -> std::result::Result<String, String> {
        if let Some(message) = body["error"]["message"].as_str() {
            return Err(format!("API error: {message}"));
        }
        let candidate = body["candidates"]
            .as_array()
            .and_then(|candidates| candidates.first())
            .ok_or_else(|| match body["promptFeedback"]["blockReason"].as_str() {
                Some(reason) => format!("prompt blocked ({reason})"),
                None => "response has no candidates".to_string(),
            })?;
        let parts = candidate["content"]["parts"]
            .as_array()
            .ok_or_else(|| "candidate has no content parts".to_string())?;

        let text: String = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            let reason = candidate["finishReason"].as_str().unwrap_or("unknown");
            return Err(format!("empty completion (finish reason: {reason})"));
        }
        Ok(text)
    }

    async fn try_complete(
        &self,
        prompt: &str,
        timeout: Duration,
    ) -> std::result::Result<String, String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| "no API key configured (set GEMINI_API_KEY)".to_string())?;

        log::debug!(
            "Sending {} prompt chars to {} (timeout {:?})",
            prompt.len(),
            self.model,
            timeout
        );
        let response = self
            .client
            .post(self.endpoint_url(api_key))
            .header("content-type", "application/json")
            .timeout(timeout)
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|err| describe_transport_error(err, timeout))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|err| format!("failed to read response body: {}", err.without_url()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&body_text)
                .ok()
                .and_then(|body| body["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body_text);
            return Err(format!("HTTP {status}: {detail}"));
        }

        let body: Value = serde_json::from_str(&body_text)
            .map_err(|err| format!("invalid JSON in response: {err}"))?;
        Self::parse_response(&body)
    }
}

fn describe_transport_error(err: reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("request timed out after {}s", timeout.as_secs())
    } else {
        format!("request failed: {}", err.without_url())
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn complete(&self, prompt: &str, timeout: Duration) -> String {
        match self.try_complete(prompt, timeout).await {
            Ok(text) => text,
            Err(message) => {
                log::warn!("Model call to {} failed: {message}", self.model);
                model_error_text(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_body_shape() {
        assert_eq!(
            GeminiClient::request_body("hello"),
            json!({"contents": [{"role": "user", "parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn endpoint_includes_model_and_key() {
        let client = GeminiClient::new("https://example.test/v1beta/", "gemini-x", None).unwrap();
        assert_eq!(
            client.endpoint_url("k"),
            "https://example.test/v1beta/models/gemini-x:generateContent?key=k"
        );
    }

    #[test]
    fn parses_candidate_text() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hello, "}, {"text": "world"}]},
                "finishReason": "STOP"
            }]
        });
        assert_eq!(GeminiClient::parse_response(&body).unwrap(), "Hello, world");
    }

    #[test]
    fn reports_blocked_and_empty_responses() {
        let blocked = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert_eq!(
            GeminiClient::parse_response(&blocked).unwrap_err(),
            "prompt blocked (SAFETY)"
        );

        let empty = json!({"candidates": [{"content": {"parts": [{"text": " "}]}, "finishReason": "MAX_TOKENS"}]});
        assert!(GeminiClient::parse_response(&empty)
            .unwrap_err()
            .contains("MAX_TOKENS"));

        let api = json!({"error": {"code": 400, "message": "API key not valid"}});
        assert_eq!(
            GeminiClient::parse_response(&api).unwrap_err(),
            "API error: API key not valid"
        );
    }

    #[tokio::test]
    async fn missing_key_yields_error_text() {
        let client = GeminiClient::new("http://127.0.0.1:9", "gemini-x", Some("  ".into())).unwrap();
        let text = client.complete("prompt", Duration::from_secs(1)).await;
        assert!(text.starts_with(MODEL_ERROR_PREFIX));
        assert!(text.contains("no API key"));
    }

    #[tokio::test]
    async fn transport_failures_are_text() {
        // Nothing listens on the discard port.
        let client =
            GeminiClient::new("http://127.0.0.1:9", "gemini-x", Some("secret".into())).unwrap();
        let text = client.complete("prompt", Duration::from_secs(2)).await;
        assert!(text.starts_with(MODEL_ERROR_PREFIX));
        assert!(!text.contains("secret"));
    }
}
