//! Core `TextProvider` trait and error taxonomy.

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ProviderError
// ---------------------------------------------------------------------------

/// Errors that can occur during a text-generation attempt.
///
/// Per-attempt failures advance the priority chain silently; only
/// `Cancelled` escapes the orchestrator (the local fallback absorbs
/// everything else).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// HTTP transport or connection error — the provider is unreachable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The request did not complete within the configured timeout.
    #[error("generation request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse provider response: {0}")]
    Parse(String),

    /// The provider returned a response with no usable text content.
    #[error("provider returned an empty response")]
    Empty,

    /// The cancellation token was invalidated while the request was in
    /// flight.  Expected under normal interrupt usage, never an error state.
    #[error("generation cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Unavailable(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// TextProvider trait
// ---------------------------------------------------------------------------

/// Async trait for text-generation backends.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (wrapped in `Arc<dyn TextProvider>` inside the orchestrator's priority
/// list).
///
/// # Arguments
/// * `system` – system instruction assembled by the prompt builder.
/// * `user`   – user message (history, page context and transcript).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider id used in logs and the priority order.
    fn name(&self) -> &str;

    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError>;
}

// Compile-time assertion: Box<dyn TextProvider> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn TextProvider>) {}
};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
