//! # API Module
//!
//! The chat-session boundary. [`ChatBackend`] is the one operation the rest of the crate
//! needs from a remote model: send a prompt within an ongoing conversation, get the reply
//! text back. Two implementations exist:
//!
//! - [`OpenAiSession`] (this module) talks to any OpenAI-compatible chat-completions
//!   endpoint through `async-openai`. Google serves one for Gemini models at
//!   [`GEMINI_OPENAI_API_BASE`], which is the default base URL.
//! - [`GeminiSession`](crate::gemini::GeminiSession) uses Gemini's native REST API.
//!
//! Conversation history lives only inside the session value and is lost when it is dropped.
//! A turn is appended to it only after a successful reply.
//!
//! # Example
//!
//! ```no_run
//! use pdf_chat::api::{ChatBackend, OpenAiSession};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = OpenAiSession::new(
//!     "my-key",
//!     pdf_chat::api::GEMINI_OPENAI_API_BASE,
//!     "gemini-1.5-pro-latest",
//! )?;
//! let reply = session.send("Say hello in one word.").await?;
//! println!("{reply}");
//! # Ok(()) }
//! ```

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use tracing::debug;

use crate::error::{ApiError, ModelSetupError};

/// Google's OpenAI-compatible endpoint for Gemini models.
pub const GEMINI_OPENAI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A long-lived remote conversation.
#[allow(async_fn_in_trait)]
pub trait ChatBackend {
    /// Sends `prompt` as the next user turn and returns the model's reply text.
    ///
    /// # Errors
    /// Any transport or API-level failure, as an [`ApiError`].
    async fn send(&mut self, prompt: &str) -> Result<String, ApiError>;
}

/// Checks that an API key is present and `api_base` is a URL.
pub(crate) fn validate_endpoint(api_key: &str, api_base: &str) -> Result<(), ModelSetupError> {
    if api_key.trim().is_empty() {
        return Err(ModelSetupError::MissingApiKey);
    }
    reqwest::Url::parse(api_base).map_err(|e| ModelSetupError::InvalidApiBase {
        url: api_base.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Creates a new OpenAI API client.
///
/// `async-openai` normally retries rate-limited requests on its own for up to fifteen
/// minutes. Here the backoff gives up at once so quota errors reach the caller's
/// [quota handling](crate::quota) with their suggested delay intact.
fn create_client(api_key: &str, api_base: &str) -> Result<Client<OpenAIConfig>, ModelSetupError> {
    validate_endpoint(api_key, api_base)?;
    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(api_base.trim_end_matches('/'));
    debug!("Client created for {}", api_base);

    let no_retry = ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();
    Ok(Client::with_config(openai_config).with_backoff(no_retry))
}

/// Chat session over an OpenAI-compatible API.
pub struct OpenAiSession {
    client: Client<OpenAIConfig>,
    model: String,
    history: Vec<ChatCompletionRequestMessage>,
}

impl OpenAiSession {
    /// Opens an empty conversation with `model` at `api_base`.
    ///
    /// # Errors
    /// [`ModelSetupError`] if the key is empty or the base URL does not parse.
    pub fn new(api_key: &str, api_base: &str, model: &str) -> Result<Self, ModelSetupError> {
        Ok(Self {
            client: create_client(api_key, api_base)?,
            model: model.to_string(),
            history: Vec::new(),
        })
    }

    /// Number of messages exchanged so far.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl ChatBackend for OpenAiSession {
    async fn send(&mut self, prompt: &str) -> Result<String, ApiError> {
        let user_message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?
            .into();

        let mut messages = self.history.clone();
        messages.push(user_message.clone());

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(messages)
            .build()?;

        debug!("Sending request: {:?}", request);
        let response = self.client.chat().create(request).await?;

        let mut response_string = String::new();
        response.choices.into_iter().for_each(|chat_choice| {
            if let Some(message_text) = chat_choice.message.content {
                response_string.push_str(&message_text);
            }
        });
        if response_string.trim().is_empty() {
            return Err(ApiError::EmptyReply);
        }

        let assistant_message: ChatCompletionRequestMessage =
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(response_string.clone())
                .build()?
                .into();

        self.history.push(user_message);
        self.history.push(assistant_message);
        Ok(response_string)
    }
}
