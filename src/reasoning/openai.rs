//! OpenAI-compatible chat completions as the reasoning collaborator

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{FilterRequest, FilterResponse, RankRequest, RankResponse, ReasoningCollaborator};
use crate::http::ProviderClient;
use crate::{DayTripError, Result};

const FILTER_PROMPT: &str = "\
You help plan day trips. Filter the candidate place names by the user's aversions and \
answer with JSON of the form {\"places\": [\"name\", ...]}.
Rules:
1. must_avoid: remove a place only when its name contains a must_avoid term or is \
obviously associated with it. Keep ambiguous cases.
2. dislikes: a soft preference. Prefer removing places matching dislikes, but keep them \
when fewer than {k_min} candidates would remain.
3. Return at least {k_min} and at most {k_max} places when possible. When more than \
{k_max} remain, drop the least distinctive ones.
4. Only return names exactly as given. Never invent or add places.";

const RANK_PROMPT: &str = "\
You help plan day trips. Each candidate has a name, the shortest round trip in hours \
and an outdoor suitability score from 0 to 100 (null when unknown; 80+ great, 60-79 fine, \
40-59 borderline, 20-39 not recommended, below 20 unsuitable).
Pick the best {top_k} places considering must_include (strong preference), likes \
(bonus when matched, penalty when opposed), and outdoor score (higher ranks higher).
Answer with JSON of the form {\"candidates\": [{\"place_name\": \"name\", \"reason\": \
\"one or two sentences for the traveller\"}]} ordered best first.
Return at most {top_k} entries, never repeat a place, and only use names exactly as given.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions backed collaborator in JSON mode
pub struct OpenAiReasoner {
    http: ProviderClient,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiReasoner {
    pub fn new(
        http: ProviderClient,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
        }
    }

    async fn complete<P: Serialize, T: DeserializeOwned>(
        &self,
        system_prompt: String,
        payload: &P,
    ) -> Result<T> {
        let user_content = serde_json::to_string(payload)
            .map_err(|e| DayTripError::contract(format!("Failed to encode request: {e}")))?;

        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        let auth = format!("Bearer {}", self.api_key);
        let response: ChatResponse = self
            .http
            .try_post_json(&url, &[("Authorization", auth.as_str())], &request)
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DayTripError::contract("Completion has no message content"))?;

        debug!("Collaborator answered {} bytes", content.len());
        parse_answer(&content)
    }
}

/// Parse the JSON document inside a completion
fn parse_answer<T: DeserializeOwned>(content: &str) -> Result<T> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str(trimmed)
        .map_err(|e| DayTripError::contract(format!("Answer does not match the expected schema: {e}")))
}

#[async_trait]
impl ReasoningCollaborator for OpenAiReasoner {
    #[instrument(skip_all, fields(candidates = request.candidates.len()))]
    async fn filter(&self, request: &FilterRequest) -> Result<FilterResponse> {
        let prompt = FILTER_PROMPT
            .replace("{k_min}", &request.k_min.to_string())
            .replace("{k_max}", &request.k_max.to_string());
        self.complete(prompt, request).await
    }

    #[instrument(skip_all, fields(candidates = request.candidates.len()))]
    async fn rank(&self, request: &RankRequest) -> Result<RankResponse> {
        let prompt = RANK_PROMPT.replace("{top_k}", &request.top_k.to_string());
        self.complete(prompt, request).await
    }
}
