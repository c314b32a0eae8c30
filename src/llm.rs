//! The external language-model service, seen from the coaching core.
//!
//! The core only needs "given a system instruction and an ordered list of
//! turns, return free text". Concrete bindings (see [`crate::gemini`]) and
//! test doubles implement [`LanguageModel`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: TurnRole::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: TurnRole::Model, text: text.into() }
    }
}

/// One request to the service: either a dialogue (system instruction plus
/// prior turns and the new user turn) or a single prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_instruction: Option<String>,
    pub turns: Vec<ChatTurn>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// A stateless single-prompt request
    pub fn single(prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            turns: vec![ChatTurn::user(prompt)],
            temperature: None,
        }
    }
}

/// Failures of a single call to the service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the service's own error description
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Short identifier used in log lines
    fn name(&self) -> &str;

    /// Run one completion. An empty string is a valid, if unhelpful, reply.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError>;
}

/// Run `complete` under a local deadline so a stalled service cannot hold a
/// session busy forever.
pub async fn complete_with_timeout(
    model: &dyn LanguageModel,
    request: CompletionRequest,
    limit: Duration,
) -> Result<String, ServiceError> {
    match tokio::time::timeout(limit, model.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Timeout(limit)),
    }
}
