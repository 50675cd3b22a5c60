use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model used for every generate call.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Any fault raised by or inside the remote call.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("api error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("empty response from model")]
    EmptyResponse,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

/// Client for the Gemini `generateContent` endpoint.
///
/// Constructed once at startup with the API key bound in; every call
/// reuses the same connection pool and credentials.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one prompt and return the model's text verbatim.
    pub async fn generate(&self, prompt: &str) -> Result<String, RemoteError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api { status, body });
        }

        let response: GenerateContentResponse = response.json().await?;
        extract_text(response)
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, RemoteError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or(RemoteError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "hello".to_string(),
                }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{ "parts": [{ "text": "hello" }] }]
            })
        );
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{
            "candidates": [
                {
                    "content": {
                        "parts": [{ "text": "first part" }, { "text": "second part" }],
                        "role": "model"
                    },
                    "finishReason": "STOP"
                }
            ],
            "modelVersion": "gemini-2.5-flash"
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_text(response).unwrap(), "first part");
    }

    #[test]
    fn test_empty_candidates_is_a_fault() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(RemoteError::EmptyResponse)
        ));

        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            extract_text(response),
            Err(RemoteError::EmptyResponse)
        ));
    }

    #[test]
    fn test_missing_parts_is_a_fault() {
        let raw = r#"{"candidates": [{"content": {"role": "model"}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(RemoteError::EmptyResponse)
        ));
    }

    #[test]
    fn test_api_error_display_carries_status_and_body() {
        let error = RemoteError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "quota exceeded".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("quota exceeded"));
    }

    #[test]
    fn test_client_uses_fixed_model() {
        let client = GeminiClient::new("test-key");
        assert_eq!(client.model(), DEFAULT_MODEL);
    }
}
