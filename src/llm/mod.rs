pub mod openrouter;

use async_trait::async_trait;
use thiserror::Error;

pub use openrouter::OpenRouter;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("response has no message content")]
    NoContent,
}

/// A chat-completion endpoint: one system prompt, one user message, text back.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}
