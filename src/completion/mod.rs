//! Chat-completion client and the acceptance policy applied to its responses.
//!
//! [`CompletionClient`] is the seam the generation pipeline talks to. The
//! production implementation is [`OpenAiClient`]; tests substitute stubs.
//!
//! Call sites disagree on what counts as a usable response, so that decision
//! lives in an [`AcceptancePolicy`] rather than in the client: a marker the
//! text must contain, how many attempts to make, and whether an exhausted
//! policy fails or hands back a sentinel text.

mod openai;

pub use openai::{CompletionConfig, OpenAiClient};

use async_trait::async_trait;
use thiserror::Error;

/// Text returned by [`Exhausted::Sentinel`] policies unless overridden.
pub const DEFAULT_SENTINEL: &str = "Error: Failed to get a valid response.";

/// Completion failures. All carry a human-readable cause.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion response contained no choices")]
    NoChoices,

    #[error("Response rejected after {attempts} attempt(s): {reason}")]
    Rejected { attempts: u32, reason: String },
}

/// Sends a single free-text prompt and returns the first choice verbatim.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Every call is a fresh round trip; identical prompts are not cached.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// What an [`AcceptancePolicy`] does once every attempt has failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exhausted {
    /// Return the last error.
    Fail,
    /// Return this text as if it were a successful response.
    Sentinel(String),
}

/// Decides whether a completion is usable and how often to retry.
#[derive(Debug, Clone)]
pub struct AcceptancePolicy {
    marker: Option<String>,
    reject_empty: bool,
    max_attempts: u32,
    on_exhausted: Exhausted,
}

impl AcceptancePolicy {
    /// One attempt, any text (including empty) is accepted.
    pub fn accept_any() -> Self {
        Self {
            marker: None,
            reject_empty: false,
            max_attempts: 1,
            on_exhausted: Exhausted::Fail,
        }
    }

    /// Reject blank responses, retrying up to `max_attempts` times.
    pub fn non_empty(max_attempts: u32) -> Self {
        Self {
            marker: None,
            reject_empty: true,
            max_attempts: max_attempts.max(1),
            on_exhausted: Exhausted::Fail,
        }
    }

    /// Require `marker` to appear in the text, retrying up to `max_attempts` times.
    pub fn require_marker(marker: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            marker: Some(marker.into()),
            reject_empty: true,
            max_attempts: max_attempts.max(1),
            on_exhausted: Exhausted::Fail,
        }
    }

    /// Return `text` instead of an error once attempts are exhausted.
    pub fn with_sentinel(mut self, text: impl Into<String>) -> Self {
        self.on_exhausted = Exhausted::Sentinel(text.into());
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn on_exhausted(&self) -> &Exhausted {
        &self.on_exhausted
    }

    /// Why `text` is unacceptable, or `None` when it passes.
    pub fn rejection(&self, text: &str) -> Option<String> {
        if self.reject_empty && text.trim().is_empty() {
            return Some("response was empty".to_string());
        }
        match &self.marker {
            Some(marker) if !text.contains(marker.as_str()) => {
                Some(format!("response does not mention '{}'", marker))
            }
            _ => None,
        }
    }

    pub fn accepts(&self, text: &str) -> bool {
        self.rejection(text).is_none()
    }

    /// Run `prompt` through `client` under this policy.
    ///
    /// Transport failures and rejected texts both consume an attempt.
    pub async fn complete(
        &self,
        client: &dyn CompletionClient,
        prompt: &str,
    ) -> Result<String, CompletionError> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match client.complete(prompt).await {
                Ok(text) => match self.rejection(&text) {
                    None => return Ok(text),
                    Some(reason) => {
                        tracing::warn!(
                            attempt,
                            max_attempts = self.max_attempts,
                            "Completion rejected: {}",
                            reason
                        );
                        last_error = Some(CompletionError::Rejected {
                            attempts: attempt,
                            reason,
                        });
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        "Completion failed: {}",
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        match &self.on_exhausted {
            Exhausted::Sentinel(text) => {
                tracing::error!(
                    "Completion attempts exhausted, returning sentinel response"
                );
                Ok(text.clone())
            }
            Exhausted::Fail => Err(last_error.unwrap_or(CompletionError::NoChoices)),
        }
    }
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self::accept_any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned results in order, then keeps failing.
    struct Scripted {
        responses: Mutex<VecDeque<Result<String, CompletionError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CompletionClient for Scripted {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(CompletionError::NoChoices))
        }
    }

    #[tokio::test]
    async fn accept_any_takes_empty_text() {
        let client = Scripted::new(vec![Ok(String::new())]);
        let text = AcceptancePolicy::accept_any()
            .complete(&client, "prompt")
            .await
            .unwrap();
        assert_eq!(text, "");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn marker_policy_retries_until_marker_appears() {
        let client = Scripted::new(vec![
            Ok("nothing useful".to_string()),
            Ok("Month 1: Basics".to_string()),
        ]);
        let text = AcceptancePolicy::require_marker("Month", 3)
            .complete(&client, "prompt")
            .await
            .unwrap();
        assert_eq!(text, "Month 1: Basics");
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn marker_policy_fails_after_max_attempts() {
        let client = Scripted::new(vec![
            Ok("a".to_string()),
            Ok("b".to_string()),
            Ok("c".to_string()),
            Ok("Month 1".to_string()),
        ]);
        let err = AcceptancePolicy::require_marker("Month", 3)
            .complete(&client, "prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Rejected { attempts: 3, .. }));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn sentinel_policy_returns_sentinel_instead_of_error() {
        let client = Scripted::new(vec![]);
        let text = AcceptancePolicy::require_marker("Module", 3)
            .with_sentinel(DEFAULT_SENTINEL)
            .complete(&client, "prompt")
            .await
            .unwrap();
        assert_eq!(text, DEFAULT_SENTINEL);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn transport_errors_consume_attempts() {
        let client = Scripted::new(vec![
            Err(CompletionError::Status {
                status: 503,
                body: "busy".to_string(),
            }),
            Ok("fine".to_string()),
        ]);
        let text = AcceptancePolicy::non_empty(2)
            .complete(&client, "prompt")
            .await
            .unwrap();
        assert_eq!(text, "fine");
    }

    #[test]
    fn non_empty_rejects_whitespace() {
        let policy = AcceptancePolicy::non_empty(1);
        assert!(!policy.accepts("  \n "));
        assert!(policy.accepts("text"));
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        assert_eq!(AcceptancePolicy::require_marker("Month", 0).max_attempts(), 1);
    }
}
