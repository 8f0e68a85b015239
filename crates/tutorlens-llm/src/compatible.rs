use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{VisionProvider, VisionRequest};

/// OpenAI-compatible chat-completion backend.
///
/// Selected when a base URL is configured: many proxies expose the
/// chat-completion wire shape and route to an underlying model provider.
/// The image travels as a data URL inside the user message. No reasoning
/// or thinking parameter is sent since support is not guaranteed across
/// proxies.
pub struct CompatibleProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for CompatibleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompatibleProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Clone for CompatibleProvider {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

impl CompatibleProvider {
    #[must_use]
    pub fn new(api_key: String, mut base_url: String) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url,
        }
    }

    fn build_body<'a>(request: &'a VisionRequest<'_>) -> ChatRequest<'a> {
        let data_url = format!(
            "data:{};base64,{}",
            request.image_mime,
            STANDARD.encode(request.image)
        );
        ChatRequest {
            model: request.model,
            messages: vec![
                ApiMessage {
                    role: "system",
                    content: MessageContent::Text(request.system_instruction),
                },
                ApiMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: request.user_prompt,
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrlDetail { url: data_url },
                        },
                    ]),
                },
            ],
            temperature: request.temperature,
        }
    }
}

impl VisionProvider for CompatibleProvider {
    async fn generate(&self, request: &VisionRequest<'_>) -> Result<String, LlmError> {
        let body = Self::build_body(request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.map_err(LlmError::Http)?;

        if !status.is_success() {
            tracing::error!("compatible API error {status}: {text}");
            return Err(LlmError::from_status(
                "compatible",
                status,
                text,
                request.model,
            ));
        }

        let resp: ChatResponse = serde_json::from_str(&text)?;

        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyResponse {
                provider: "compatible",
            })
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "compatible"
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrlDetail },
}

#[derive(Serialize)]
struct ImageUrlDetail {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}
