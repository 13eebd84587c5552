//! Chat-completions backend (OpenAI-compatible) over blocking HTTP

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::prompts::PLATE_MAX_TOKENS;
use super::{ImagePayload, VisionBackend};
use truckgate_types::RecognitionError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// VisionBackend for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Build once at startup and share; the inner client pools connections.
pub struct OpenAiVisionBackend {
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

impl OpenAiVisionBackend {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, RecognitionError> {
        if api_key.trim().is_empty() {
            return Err(RecognitionError::MissingApiKey);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RecognitionError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_send_error(&self, e: reqwest::Error) -> RecognitionError {
        if e.is_timeout() {
            RecognitionError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            RecognitionError::Connection(self.base_url.clone())
        } else {
            RecognitionError::Connection(e.to_string())
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_request<'a>(model: &'a str, instruction: &'a str, image: &ImagePayload<'_>) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: vec![
                ContentPart::Text { text: instruction },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                },
            ],
        }],
        max_tokens: PLATE_MAX_TOKENS,
    }
}

/// Pull the first choice's text out of a completion body
fn first_choice_text(body: &str) -> Result<String, RecognitionError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| RecognitionError::MalformedResponse(e.to_string()))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RecognitionError::MalformedResponse("no choices returned".to_string()))?;

    // A refusal or empty answer is still a successful response.
    Ok(choice.message.content.unwrap_or_default())
}

impl VisionBackend for OpenAiVisionBackend {
    fn complete(&self, instruction: &str, image: &ImagePayload<'_>) -> Result<String, RecognitionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_request(&self.model, instruction, image);

        tracing::debug!(model = %self.model, bytes = image.bytes.len(), "sending plate image to vision service");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(RecognitionError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RecognitionError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().map_err(|e| self.map_send_error(e))?;
        first_choice_text(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        let result = OpenAiVisionBackend::new(DEFAULT_BASE_URL, "  ", DEFAULT_MODEL, 30);
        assert!(matches!(result, Err(RecognitionError::MissingApiKey)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = OpenAiVisionBackend::new("http://localhost:8080/v1/", "k", DEFAULT_MODEL, 5).unwrap();
        assert_eq!(backend.base_url, "http://localhost:8080/v1");
        assert_eq!(backend.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_request_shape() {
        let image = ImagePayload::new(b"abc");
        let request = build_request("gpt-4o-mini", "read it", &image);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["max_tokens"], 50);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], "read it");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,YWJj"
        );
    }

    #[test]
    fn test_first_choice_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"AB 12 CD 3456"}}]}"#;
        assert_eq!(first_choice_text(body).unwrap(), "AB 12 CD 3456");
    }

    #[test]
    fn test_null_content_is_empty_answer() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(first_choice_text(body).unwrap(), "");
    }

    #[test]
    fn test_no_choices_is_malformed() {
        let body = r#"{"choices":[]}"#;
        assert!(matches!(
            first_choice_text(body),
            Err(RecognitionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_non_json_is_malformed() {
        assert!(matches!(
            first_choice_text("<html>bad gateway</html>"),
            Err(RecognitionError::MalformedResponse(_))
        ));
    }
}
