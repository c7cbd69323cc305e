use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Backend, Outcome, ReasoningRequest};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
const TEMPERATURE: f32 = 1.0;
const MAX_OUTPUT_TOKENS: u32 = 16384;

/// An LLM backend that calls the Gemini generateContent API.
///
/// The client and credential are injected at construction, resolved once at
/// process start rather than from hidden module state. A missing credential
/// is a per-call failure, reported before any request is built.
pub struct GeminiBackend {
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(client: reqwest::Client, api_key: Option<String>, model: String) -> Self {
        Self {
            model,
            api_key,
            client,
        }
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn invoke(&self, request: &ReasoningRequest) -> Outcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return Outcome::Failure(format!("{ENV_API_KEY} not set"));
        };

        let thinking_budget = request.depth.thinking_budget();
        tracing::debug!(model = %self.model, thinking_budget, "invoking gemini");

        let body = ApiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                thinking_config: ThinkingConfig { thinking_budget },
            },
        };

        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let resp = match self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return Outcome::Failure(format!("request failed: {e}")),
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Outcome::Failure(format!("Gemini API error ({status}): {text}"));
        }

        let api_resp: ApiResponse = match resp.json().await {
            Ok(api_resp) => api_resp,
            Err(e) => return Outcome::Failure(format!("malformed response: {e}")),
        };

        let text = api_resp.text();
        if text.is_empty() {
            return Outcome::Failure("empty response".to_string());
        }

        tracing::debug!(chars = text.len(), "gemini answered");
        Outcome::Answer(text)
    }
}

// --- API types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl ApiResponse {
    /// Concatenated text across all parts of all candidates.
    fn text(&self) -> String {
        self.candidates
            .iter()
            .flat_map(|c| c.content.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: ResponseContent,
}

#[derive(Deserialize, Default)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}
