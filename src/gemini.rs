use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::llm::{ChatTurn, CompletionRequest, LanguageModel, ServiceError, TurnRole};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const CONNECT_TIMEOUT_SECS: u64 = 10;

// Model constants
pub const GEMINI_FLASH: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn to_content(turn: ChatTurn) -> Content {
    let role = match turn.role {
        TurnRole::User => "user",
        TurnRole::Model => "model",
    };
    Content {
        role: Some(role),
        parts: vec![Part { text: turn.text }],
    }
}

fn build_request(request: CompletionRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: request.system_instruction.map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        }),
        contents: request.turns.into_iter().map(to_content).collect(),
        generation_config: request.temperature.map(|temperature| GenerationConfig { temperature }),
    }
}

/// Concatenate the text parts of the first candidate. A candidate with no
/// text (e.g. blocked by safety filters) yields an empty string.
fn extract_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> ServiceError {
    let message = match serde_json::from_str::<GeminiError>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(kind) => format!("{} - {}", kind, parsed.error.message),
            None => parsed.error.message,
        },
        Err(_) => body.to_string(),
    };
    ServiceError::Api { status: status.as_u16(), message }
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, request_timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
        let body = build_request(request);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(describe_error(status, &error_text));
        }

        let text = response.text().await?;
        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| ServiceError::Malformed(e.to_string()))?;

        Ok(extract_text(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = CompletionRequest {
            system_instruction: Some("Be kind.".to_string()),
            turns: vec![ChatTurn::user("Hi"), ChatTurn::model("Hello"), ChatTurn::user("Tired")],
            temperature: Some(0.7),
        };

        let body = serde_json::to_value(build_request(request)).unwrap();

        assert_eq!(body["systemInstruction"], json!({"parts": [{"text": "Be kind."}]}));
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "Tired");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_single_prompt_omits_optional_fields() {
        let body = serde_json::to_value(build_request(CompletionRequest::single("tip please"))).unwrap();

        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("generationConfig").is_none());
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Try a "}, {"text": "10-minute walk."}]}
            }]
        }))
        .unwrap();

        assert_eq!(extract_text(response), "Try a 10-minute walk.");
    }

    #[test]
    fn test_extract_text_empty_when_no_candidates() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(extract_text(response), "");
    }

    #[test]
    fn test_describe_structured_error() {
        let body = r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#;
        match describe_error(reqwest::StatusCode::FORBIDDEN, body) {
            ServiceError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "PERMISSION_DENIED - API key not valid");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_describe_unstructured_error() {
        match describe_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down") {
            ServiceError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
