//! HTTP voice-synthesis provider.
//!
//! `ApiVoiceProvider` calls an OpenAI-style `/v1/audio/speech` endpoint and
//! returns the raw encoded audio bytes.  All connection details come from
//! [`VoiceProviderConfig`]; nothing is hardcoded.

use async_trait::async_trait;

use crate::config::VoiceProviderConfig;

use super::{AudioClip, SynthesisError, VoiceProvider};

// ---------------------------------------------------------------------------
// ApiVoiceProvider
// ---------------------------------------------------------------------------

/// Fetches synthesized speech over HTTP.
///
/// # No hardcoded URLs
/// All connection details (`base_url`, `api_key`, `voice`) come exclusively
/// from the [`VoiceProviderConfig`] passed to
/// [`ApiVoiceProvider::from_config`].
pub struct ApiVoiceProvider {
    name: String,
    client: reqwest::Client,
    config: VoiceProviderConfig,
}

impl ApiVoiceProvider {
    /// Build a provider from its configured connection details.
    ///
    /// The HTTP client is pre-configured with the per-request timeout.  A
    /// default (no-timeout) client is used as a last-resort fallback if the
    /// builder fails (should never happen in practice).
    pub fn from_config(name: &str, config: &VoiceProviderConfig, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.to_string(),
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl VoiceProvider for ApiVoiceProvider {
    fn name(&self) -> &str {
        &self.name
    }

    /// Fetch audio for `text` from the configured endpoint.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// self-hosted providers that require no authentication.
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError> {
        let url = format!("{}/v1/audio/speech", self.config.base_url);

        let body = serde_json::json!({
            "voice": self.config.voice,
            "input": text,
            "response_format": "mp3"
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self
            .config
            .api_key
            .as_ref()
            .map(|k| k.expose())
            .unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        if !response.status().is_success() {
            return Err(SynthesisError::Unavailable(format!(
                "{} returned HTTP {}",
                self.name,
                response.status()
            )));
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Parse(e.to_string()))?;

        if bytes.is_empty() {
            return Err(SynthesisError::Parse("empty audio payload".into()));
        }

        Ok(AudioClip {
            bytes: bytes.to_vec(),
            mime,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
