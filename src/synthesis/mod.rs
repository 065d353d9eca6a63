//! Voice synthesis: interchangeable TTS providers, the shared playback
//! handle, and the fallback pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 SynthesisPipeline                        │
//! │                                                         │
//! │   VoiceProvider #1 ──▶ VoiceProvider #2 ──▶ …           │
//! │        │ (fetch AudioClip)                              │
//! │        ▼                                                │
//! │   Playback (single shared handle, stop-before-start)    │
//! │                                                         │
//! │   terminal fallback: LocalSynthesizer (on-device,       │
//! │   no credential — always last, never skipped)           │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod pipeline;
pub mod playback;

pub use api::ApiVoiceProvider;
pub use pipeline::SynthesisPipeline;

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// SynthesisError
// ---------------------------------------------------------------------------

/// Errors that can occur while synthesizing or playing speech.
///
/// Per-provider failures advance the fallback chain and are never surfaced
/// to the user individually.
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    /// HTTP transport or connection error — the provider is unreachable.
    #[error("synthesis provider unavailable: {0}")]
    Unavailable(String),

    /// The request did not complete within the configured timeout.
    #[error("synthesis request timed out")]
    Timeout,

    /// The provider responded but the payload was not usable audio.
    #[error("failed to decode synthesis response: {0}")]
    Parse(String),

    /// The playback device rejected the clip.
    #[error("playback failed: {0}")]
    Playback(String),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SynthesisError::Timeout
        } else {
            SynthesisError::Unavailable(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AudioClip
// ---------------------------------------------------------------------------

/// Encoded audio fetched from a synthesis provider, ready for the playback
/// handle to decode and play.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Encoded audio bytes as returned by the provider.
    pub bytes: Vec<u8>,
    /// MIME type reported by the provider (e.g. `audio/mpeg`).
    pub mime: String,
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// A remote voice-synthesis backend: text in, encoded audio out.
///
/// Implementations must be `Send + Sync` so they can be held behind
/// `Arc<dyn VoiceProvider>` in the pipeline's priority list.
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Provider id used in logs and the priority order.
    fn name(&self) -> &str;

    /// Fetch synthesized audio for `text`.
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError>;
}

/// The single shared playback handle.
///
/// # Contract
///
/// - `play` resolves when the clip finishes naturally **or** after `stop`
///   takes effect; a dropped `play` future must also cease output.
/// - `stop` is idempotent and safe to call when nothing is playing.  On some
///   platforms it does not take effect synchronously, which is why the
///   pipeline always issues it twice (see [`playback::double_stop`]).
#[async_trait]
pub trait Playback: Send + Sync {
    async fn play(&self, clip: AudioClip) -> Result<(), SynthesisError>;
    fn stop(&self);
}

/// On-device synthesis capability — the terminal fallback.
///
/// Defined to always succeed when the platform capability exists at all; no
/// credential is ever required.
#[async_trait]
pub trait LocalSynthesizer: Send + Sync {
    /// Speak `text` through the device voice; resolves on completion or stop.
    async fn speak(&self, text: &str) -> Result<(), SynthesisError>;
    fn stop(&self);
}

// Compile-time assertions: the capability traits must stay object-safe.
const _: fn() = || {
    fn _assert_provider(_: Box<dyn VoiceProvider>) {}
    fn _assert_playback(_: Box<dyn Playback>) {}
    fn _assert_local(_: Box<dyn LocalSynthesizer>) {}
};
