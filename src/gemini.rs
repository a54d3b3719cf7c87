//! Google Gemini chat session over the native `generateContent` REST API.
//!
//! Gemini keeps no server-side conversation, so the session resends its history with every
//! turn. Error responses are returned as [`ApiError::Status`] with the body untouched: the
//! quota details (`"retryDelay": "7s"`) live in that body.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    api::{ChatBackend, validate_endpoint},
    error::{ApiError, ModelSetupError},
};

/// Official Google Gemini API endpoint.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Chat session against Gemini's native API.
pub struct GeminiSession {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    history: Vec<Content>,
}

impl GeminiSession {
    /// Opens an empty conversation with `model`.
    ///
    /// # Errors
    /// [`ModelSetupError`] for an empty key, a bad base URL, or an HTTP client that fails to
    /// build.
    pub fn new(api_key: &str, api_base: &str, model: &str) -> Result<Self, ModelSetupError> {
        validate_endpoint(api_key, api_base)?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ModelSetupError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            history: Vec::new(),
        })
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

impl ChatBackend for GeminiSession {
    async fn send(&mut self, prompt: &str) -> Result<String, ApiError> {
        let mut contents = self.history.clone();
        contents.push(Content::text("user", prompt));

        debug!("Sending {} contents to {}", contents.len(), self.endpoint());
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest {
                contents: &contents,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Provider(format!("failed to parse Gemini response: {e}")))?;

        let reply: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if reply.trim().is_empty() {
            return Err(ApiError::EmptyReply);
        }

        self.history = contents;
        self.history.push(Content::text("model", &reply));
        Ok(reply)
    }
}
