pub mod openai;

pub use openai::ChatCompletionProvider;

use std::time::Duration;

use thiserror::Error;

/// Which generation flow a completion call belongs to. Research prompts carry
/// retrieved material on top of the user's own, so they get a longer deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    Plain,
    Research,
}

impl CompletionMode {
    pub fn timeout(self) -> Duration {
        match self {
            CompletionMode::Plain => Duration::from_secs(60),
            CompletionMode::Research => Duration::from_secs(90),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompletionMode::Plain => "plain",
            CompletionMode::Research => "research",
        }
    }
}

#[derive(Error, Debug)]
pub enum CompletionError {
    /// Connection-level failure (refused, DNS, timeout) before any usable
    /// response arrived.
    #[error("AI service unreachable: {0}")]
    Unreachable(String),

    /// The endpoint answered with a non-success status.
    #[error("chat completion request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// A 2xx response whose body does not match the expected
    /// `{choices: [{message: {content}}]}` schema. Carries the raw payload
    /// so the mismatch can be diagnosed.
    #[error("unexpected AI response format: {payload}")]
    Malformed { payload: serde_json::Value },
}

#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        mode: CompletionMode,
    ) -> Result<String, CompletionError>;
}
