//! HTTP model backend for the Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{AdvisoryModel, ModelRequest};
use crate::error::AdvisoryError;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Model endpoint settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    /// Retries for transient failures. Zero means one attempt.
    pub retries: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            retries: 0,
        }
    }
}

#[derive(Clone)]
pub struct GeminiModel {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl GeminiModel {
    /// Fails with `NotConfigured` when no API key is set.
    pub fn from_config(config: &ModelConfig) -> Result<Self, AdvisoryError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AdvisoryError::NotConfigured(API_KEY_VAR))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdvisoryError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: generate_url(&config.endpoint, &config.model),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl AdvisoryModel for GeminiModel {
    async fn generate(&self, request: &ModelRequest) -> Result<String, AdvisoryError> {
        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_body(request))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AdvisoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| AdvisoryError::MalformedResponse(e.to_string()))?;
        let text = extract_text(&payload)?;
        debug!(model = %self.model, reply_len = text.len(), "model replied");
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

pub fn generate_url(endpoint: &str, model: &str) -> String {
    format!("{}/models/{}:generateContent", endpoint.trim_end_matches('/'), model)
}

/// Request body. A schema switches the reply to JSON mode.
pub fn build_body(request: &ModelRequest) -> Value {
    let mut body = json!({
        "systemInstruction": { "parts": [{ "text": request.system }] },
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
    });
    if let Some(schema) = &request.response_schema {
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
    }
    body
}

/// Concatenated text parts of the first candidate.
pub fn extract_text(payload: &Value) -> Result<String, AdvisoryError> {
    let parts = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or(AdvisoryError::EmptyResponse)?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        return Err(AdvisoryError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(schema: Option<Value>) -> ModelRequest {
        ModelRequest {
            system: "be brief".into(),
            prompt: "hello".into(),
            response_schema: schema,
        }
    }

    #[test]
    fn url_joins_endpoint_and_model() {
        assert_eq!(
            generate_url("https://example.test/v1beta/", "gemini-1.5-flash"),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn body_only_requests_json_with_schema() {
        let plain = build_body(&request(None));
        assert_eq!(plain["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(plain["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(plain.get("generationConfig").is_none());

        let structured = build_body(&request(Some(json!({ "type": "OBJECT" }))));
        assert_eq!(structured["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(structured["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn text_parts_are_concatenated() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        });
        assert_eq!(extract_text(&payload).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn missing_candidates_is_empty_response() {
        assert_eq!(extract_text(&json!({ "candidates": [] })), Err(AdvisoryError::EmptyResponse));
        let blank = json!({ "candidates": [{ "content": { "parts": [{ "text": " " }] } }] });
        assert_eq!(extract_text(&blank), Err(AdvisoryError::EmptyResponse));
    }

    #[test]
    fn missing_key_is_not_configured() {
        let err = GeminiModel::from_config(&ModelConfig::default()).err();
        assert_eq!(err, Some(AdvisoryError::NotConfigured("GEMINI_API_KEY")));
    }
}
