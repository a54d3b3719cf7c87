//! # Assistant
//!
//! Ties the pieces together for one question: wait on the [`RateLimiter`], pick the most
//! relevant [`Fragment`](crate::document::Fragment), compose the prompt, send it through the
//! [`ChatBackend`], and handle quota errors by waiting and retrying.
//!
//! [`Assistant::ask`] never fails. Whatever happens, it returns a string to show the user:
//! the model's reply, an `An error occurred: ...` line, or [`MAX_RETRIES_MESSAGE`].

use std::time::Duration;
use tracing::{info, warn};

use crate::{
    api::ChatBackend,
    console::Console,
    document::Document,
    quota,
    rate_limiter::RateLimiter,
    relevance::select_fragment,
    template::PromptTemplate,
};

/// Returned once every attempt has hit a quota error.
pub const MAX_RETRIES_MESSAGE: &str =
    "Giving up: max retries reached. Please try again later.";

/// Default number of attempts per question.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// What to do after a quota error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// The suggested delay has been waited out; try again.
    Retry,
    /// No usable delay; report the error.
    Fail,
}

/// A question-answering session over one document.
pub struct Assistant<B: ChatBackend> {
    document: Document,
    session: B,
    limiter: RateLimiter,
    template: PromptTemplate,
    console: Console,
    max_retries: u32,
}

impl<B: ChatBackend> Assistant<B> {
    pub fn new(
        document: Document,
        session: B,
        limiter: RateLimiter,
        template: PromptTemplate,
        console: Console,
    ) -> Self {
        Self {
            document,
            session,
            limiter,
            template,
            console,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Overrides the number of attempts per question.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn session(&self) -> &B {
        &self.session
    }

    /// Waits out a quota error's suggested delay, if `error_message` carries one.
    pub async fn handle_quota_error(&self, error_message: &str) -> QuotaDecision {
        self.wait_out(quota::parse_retry_delay(error_message)).await
    }

    async fn wait_out(&self, retry_after: Option<Duration>) -> QuotaDecision {
        match retry_after {
            Some(wait) => {
                info!("Quota exceeded, waiting {:?} before retrying", wait);
                self.console
                    .wait(wait, "Token quota exceeded. Waiting:")
                    .await;
                QuotaDecision::Retry
            }
            None => QuotaDecision::Fail,
        }
    }

    /// Answers `question` from the document. Always returns something displayable.
    pub async fn ask(&mut self, question: &str) -> String {
        let mut retry_count = 0;

        while retry_count < self.max_retries {
            self.limiter.acquire(&self.console).await;

            let Some(fragment) = select_fragment(question, self.document.fragments()) else {
                return "The assistant was not initialised correctly. Please check the setup."
                    .to_string();
            };
            let prompt = self.template.compose(&fragment.text, question);

            match self.session.send(&prompt).await {
                Ok(reply) => {
                    self.announce_next_slot();
                    return reply;
                }
                Err(err) => {
                    let error_message = err.to_string();
                    warn!("Question failed: {}", error_message);
                    self.console
                        .warn(&format!("\nError while processing the question: {error_message}"));

                    if let Some(exceeded) = err.quota() {
                        if self.wait_out(exceeded.retry_after).await == QuotaDecision::Retry {
                            self.console.status("\nRetrying...");
                            retry_count += 1;
                            continue;
                        }
                        self.console.warn(
                            "\nAPI quota exceeded. Please wait a while and try again.",
                        );
                    }
                    return format!("An error occurred: {error_message}");
                }
            }
        }

        MAX_RETRIES_MESSAGE.to_string()
    }

    fn announce_next_slot(&self) {
        let Some(next) = self.limiter.next_available() else {
            return;
        };
        let now = tokio::time::Instant::now();
        if now < next {
            let wait = (next - now).as_secs();
            if wait > 0 {
                self.console
                    .status(&format!("\nWait {wait} seconds before the next question."));
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        error::ApiError,
        rate_limiter::RateLimitConfig,
        splitter::SplitterConfig,
    };
    use std::collections::VecDeque;
    use tokio::time::Instant;

    /// Replays scripted results and records every prompt it was sent.
    #[derive(Default)]
    pub(crate) struct ScriptedBackend {
        pub replies: VecDeque<Result<String, ApiError>>,
        pub prompts: Vec<String>,
    }

    impl ScriptedBackend {
        pub fn new(replies: Vec<Result<String, ApiError>>) -> Self {
            Self {
                replies: replies.into(),
                prompts: Vec::new(),
            }
        }
    }

    impl ChatBackend for ScriptedBackend {
        async fn send(&mut self, prompt: &str) -> Result<String, ApiError> {
            self.prompts.push(prompt.to_string());
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Provider("script exhausted".into())))
        }
    }

    fn quota_error(seconds: u64) -> ApiError {
        ApiError::Status {
            status: 429,
            body: format!("Resource exhausted (check quota). retry_delay {{ seconds: {seconds} }}"),
        }
    }

    pub(crate) fn assistant_with(
        text: &str,
        replies: Vec<Result<String, ApiError>>,
    ) -> Assistant<ScriptedBackend> {
        let document = Document::from_text("test.pdf", text, &SplitterConfig::default()).unwrap();
        Assistant::new(
            document,
            ScriptedBackend::new(replies),
            RateLimiter::new(&RateLimitConfig::default()),
            PromptTemplate::default(),
            Console::quiet(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn first_try_success_returns_reply_verbatim() {
        let mut assistant =
            assistant_with("The warranty lasts two years.", vec![Ok("Two years.\n".into())]);
        let answer = assistant.ask("How long is the warranty?").await;

        assert_eq!(answer, "Two years.\n");
        let prompts = &assistant.session().prompts;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("The warranty lasts two years."));
        assert!(prompts[0].contains("Question: How long is the warranty?"));
    }

    #[tokio::test(start_paused = true)]
    async fn prompt_uses_most_relevant_fragment() {
        let text = format!("{}{}", "filler text ".repeat(60), "the refund policy is thirty days");
        let mut assistant = assistant_with(&text, vec![Ok("Thirty days.".into())]);
        assistant.ask("What is the refund policy?").await;

        let last = assistant.document().fragments().last().unwrap().text.clone();
        assert!(assistant.session().prompts[0].contains(&last));
    }

    #[tokio::test(start_paused = true)]
    async fn quota_with_delay_waits_and_retries() {
        let mut assistant = assistant_with("text", vec![Err(quota_error(7)), Ok("Done.".into())]);
        let started = Instant::now();
        let answer = assistant.ask("question").await;

        assert_eq!(answer, "Done.");
        assert_eq!(assistant.session().prompts.len(), 2);
        assert!(started.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn handle_quota_error_waits_the_suggested_delay() {
        let assistant = assistant_with("text", vec![]);
        let started = Instant::now();
        let decision = assistant
            .handle_quota_error("429 quota exceeded retry_delay { seconds: 7 }")
            .await;
        assert_eq!(decision, QuotaDecision::Retry);
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_quota_delay_is_capped_not_fatal() {
        let err = ApiError::Status {
            status: 429,
            body: "quota exceeded retry_delay { seconds: 18446744073709551615 }".into(),
        };
        let mut assistant = assistant_with("text", vec![Err(err), Ok("ok".into())]);
        let started = Instant::now();
        let answer = assistant.ask("question").await;

        assert_eq!(answer, "ok");
        assert_eq!(assistant.session().prompts.len(), 2);
        let waited = started.elapsed();
        assert!(waited >= quota::MAX_RETRY_DELAY);
        assert!(waited < quota::MAX_RETRY_DELAY + Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn handle_quota_error_without_delay_fails() {
        let assistant = assistant_with("text", vec![]);
        let started = Instant::now();
        let decision = assistant.handle_quota_error("quota exceeded").await;
        assert_eq!(decision, QuotaDecision::Fail);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn quota_without_delay_returns_error_text() {
        let err = ApiError::Provider("Quota exceeded for this project".into());
        let mut assistant = assistant_with("text", vec![Err(err)]);
        let answer = assistant.ask("question").await;

        assert_eq!(answer, "An error occurred: Quota exceeded for this project");
        assert_eq!(assistant.session().prompts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_not_retried() {
        let err = ApiError::Transport("connection refused".into());
        let mut assistant = assistant_with("text", vec![Err(err), Ok("unused".into())]);
        let answer = assistant.ask("question").await;

        assert!(answer.starts_with("An error occurred: "));
        assert!(answer.contains("connection refused"));
        assert_eq!(assistant.session().prompts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_return_fixed_message() {
        let mut assistant = assistant_with(
            "text",
            vec![Err(quota_error(1)), Err(quota_error(1)), Err(quota_error(1)), Ok("late".into())],
        );
        let answer = assistant.ask("question").await;

        assert_eq!(answer, MAX_RETRIES_MESSAGE);
        assert!(answer.contains("max retries reached"));
        assert_eq!(assistant.session().prompts.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_bound_is_configurable() {
        let mut assistant = assistant_with("text", vec![Err(quota_error(1)), Ok("late".into())])
            .with_max_retries(1);
        assert_eq!(assistant.ask("question").await, MAX_RETRIES_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_questions_respect_min_interval() {
        let mut assistant =
            assistant_with("text", vec![Ok("one".into()), Ok("two".into())]);
        assistant.ask("first").await;
        let between = Instant::now();
        assistant.ask("second").await;
        assert!(between.elapsed() >= Duration::from_secs(4));
        assert_eq!(assistant.limiter().requests_in_window(), 2);
    }
}
