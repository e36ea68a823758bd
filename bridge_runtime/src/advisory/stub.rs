//! Canned-reply model for tests and offline runs.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{AdvisoryModel, ModelRequest};
use crate::error::AdvisoryError;

/// Replays queued results in order and records every request it receives.
/// Once the queue is empty every call fails with `EmptyResponse`.
#[derive(Default)]
pub struct StubModel {
    replies: Mutex<VecDeque<Result<String, AdvisoryError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl StubModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.replies.lock().push_back(Ok(text.into()));
    }

    pub fn push_error(&self, err: AdvisoryError) {
        self.replies.lock().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl AdvisoryModel for StubModel {
    async fn generate(&self, request: &ModelRequest) -> Result<String, AdvisoryError> {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or(Err(AdvisoryError::EmptyResponse))
    }

    fn name(&self) -> &str {
        "stub"
    }
}
