//! Generation orchestrator — provider priority chain with deadline,
//! cancellation and the deterministic local fallback.
//!
//! # Flow
//!
//! ```text
//! generate(transcript, history, page, routes, token)
//!   └─▶ PromptBuilder::build_chat → (system, user)
//!   └─▶ for provider in priority order:
//!         attempt bounded by the remaining overall deadline
//!         ├─ Ok(non-empty text)   → return it
//!         ├─ Err / empty / timeout → advance to the next provider
//!         └─ token invalidated    → Err(Cancelled)   (only failure exit)
//!   └─▶ all failed → LocalReplies (always non-empty)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, Instant};

use crate::actions::page::{PageSnapshot, RouteIndex};
use crate::engine::token::CancelToken;
use crate::session::Message;

use super::fallback::LocalReplies;
use super::prompt::PromptBuilder;
use super::provider::{ProviderError, TextProvider};

// ---------------------------------------------------------------------------
// GenerationOrchestrator
// ---------------------------------------------------------------------------

/// Tries providers in priority order and never leaves a turn without a reply.
pub struct GenerationOrchestrator {
    providers: Vec<Arc<dyn TextProvider>>,
    prompt: PromptBuilder,
    fallback: LocalReplies,
    deadline: Duration,
}

impl GenerationOrchestrator {
    /// Create an orchestrator.
    ///
    /// # Arguments
    ///
    /// * `providers` — generation backends, highest priority first.  An empty
    ///                 list is valid: every turn then uses the local fallback.
    /// * `prompt`    — prompt builder shared by all attempts.
    /// * `deadline`  — overall wall-clock budget for the whole chain.
    pub fn new(
        providers: Vec<Arc<dyn TextProvider>>,
        prompt: PromptBuilder,
        deadline: Duration,
    ) -> Self {
        Self {
            providers,
            prompt,
            fallback: LocalReplies::new(),
            deadline,
        }
    }

    /// Produce reply text for `transcript`.
    ///
    /// Returns `Err(ProviderError::Cancelled)` **only** when the token was
    /// invalidated mid-request; every other failure mode resolves to the
    /// deterministic local fallback.  A caller holding a stale token must
    /// discard the result without touching session state.
    pub async fn generate(
        &self,
        transcript: &str,
        history: &[Message],
        page: &PageSnapshot,
        routes: &RouteIndex,
        token: &CancelToken,
    ) -> Result<String, ProviderError> {
        let (system, user) = self.prompt.build_chat(transcript, history, page, routes);
        let deadline = Instant::now() + self.deadline;

        for provider in &self.providers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::debug!("generation: overall deadline exhausted");
                break;
            }

            let attempt = timeout(remaining, provider.generate(&system, &user));

            let outcome = tokio::select! {
                outcome = attempt => outcome,
                _ = token.cancelled() => {
                    log::debug!("generation: interrupted mid-request");
                    return Err(ProviderError::Cancelled);
                }
            };

            match outcome {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    log::debug!("generation: provider {} answered", provider.name());
                    return Ok(text);
                }
                Ok(Ok(_)) => {
                    log::debug!("generation: provider {} returned blank text", provider.name());
                }
                Ok(Err(e)) => {
                    log::debug!("generation: provider {} failed: {e}", provider.name());
                }
                Err(_) => {
                    log::debug!("generation: provider {} hit the deadline", provider.name());
                }
            }
        }

        // A late cancellation still wins over the fallback: the turn was
        // interrupted, so no reply may be appended.
        if !token.is_current() {
            return Err(ProviderError::Cancelled);
        }

        log::info!("generation: all providers failed — using local fallback reply");
        Ok(self.fallback.reply_for(transcript, page))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
