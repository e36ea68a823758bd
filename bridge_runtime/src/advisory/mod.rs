//! AI advisory flows: supply forecast, donation-location ranking, chat.
//!
//! Each flow packages a snapshot of domain data into a prompt, sends it to an
//! `AdvisoryModel` and parses the reply. Nothing here touches the store; the
//! caller decides what to do with the result. Failures are always returned.

pub mod gemini;
pub mod prompts;
pub mod retry;
pub mod stub;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use bridge_core::analytics::RequestSnapshot;
use bridge_core::domain::{BloodInventoryItem, BloodType, DonationCamp, Hospital};

use crate::error::AdvisoryError;

pub use gemini::{GeminiModel, ModelConfig};
pub use retry::RetryPolicy;
pub use stub::StubModel;

/// One model call: system instruction, user prompt, optional JSON schema hint.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system: String,
    pub prompt: String,
    pub response_schema: Option<serde_json::Value>,
}

/// Text-generation backend.
#[async_trait]
pub trait AdvisoryModel: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<String, AdvisoryError>;

    fn name(&self) -> &str;
}

// ── Reply types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortageRisk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyForecast {
    pub shortage_risk: ShortageRisk,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationSuggestion {
    pub hospital_name: String,
    pub hospital_location: String,
    pub priority_score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One prior exchange, supplied by the caller on every chat call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

// ── Service ────────────────────────────────────────────────────────

/// The three flows over one model. Stateless between calls.
pub struct AdvisoryService<M> {
    model: M,
    retry: RetryPolicy,
}

impl<M: AdvisoryModel> AdvisoryService<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Shortage risk for `blood_type`. Only matching items are sent.
    pub async fn forecast_supply(
        &self,
        blood_type: BloodType,
        inventory: &[BloodInventoryItem],
    ) -> Result<SupplyForecast, AdvisoryError> {
        let items: Vec<&BloodInventoryItem> = inventory
            .iter()
            .filter(|item| item.blood_type == blood_type)
            .collect();
        let request = prompts::forecast_request(blood_type, &items);
        let forecast: SupplyForecast = self.generate_json(&request).await?;
        info!(
            blood_type = %blood_type,
            locations = items.len(),
            risk = ?forecast.shortage_risk,
            "supply forecast received"
        );
        Ok(forecast)
    }

    /// Ranked hospitals for a donor. Ranking is the model's; order is kept as returned.
    pub async fn suggest_donation_locations(
        &self,
        donor_blood_type: BloodType,
        requests: &[RequestSnapshot],
    ) -> Result<Vec<DonationSuggestion>, AdvisoryError> {
        let request = prompts::suggestion_request(donor_blood_type, requests);
        let suggestions: Vec<DonationSuggestion> = self.generate_json(&request).await?;
        info!(
            blood_type = %donor_blood_type,
            candidates = requests.len(),
            suggestions = suggestions.len(),
            "donation locations ranked"
        );
        Ok(suggestions)
    }

    pub async fn chat(
        &self,
        question: &str,
        history: &[ChatTurn],
        hospitals: &[Hospital],
        camps: &[DonationCamp],
    ) -> Result<String, AdvisoryError> {
        if question.trim().is_empty() {
            return Err(AdvisoryError::InvalidInput("question is empty".to_string()));
        }
        let request = prompts::chat_request(question, history, hospitals, camps);
        let answer = self.generate(&request).await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(AdvisoryError::EmptyResponse);
        }
        Ok(answer.to_string())
    }

    async fn generate(&self, request: &ModelRequest) -> Result<String, AdvisoryError> {
        debug!(model = self.model.name(), prompt_len = request.prompt.len(), "model call");
        self.retry
            .execute(|| self.model.generate(request))
            .await
            .inspect_err(|err| warn!(model = self.model.name(), error = %err, "model call failed"))
    }

    async fn generate_json<T: DeserializeOwned>(&self, request: &ModelRequest) -> Result<T, AdvisoryError> {
        let text = self.generate(request).await?;
        if text.trim().is_empty() {
            return Err(AdvisoryError::EmptyResponse);
        }
        let value = prompts::parse_json_reply(&text).map_err(AdvisoryError::MalformedResponse)?;
        serde_json::from_value(value).map_err(|e| AdvisoryError::MalformedResponse(e.to_string()))
    }
}
