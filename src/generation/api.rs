//! HTTP text-generation provider.
//!
//! `ApiTextProvider` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint — OpenAI, Groq, Together.ai, LM Studio, vLLM, Ollama (OpenAI
//! mode), etc.  All connection details come from [`TextProviderConfig`];
//! nothing is hardcoded.

use async_trait::async_trait;

use crate::config::TextProviderConfig;

use super::provider::{ProviderError, TextProvider};

// ---------------------------------------------------------------------------
// ApiTextProvider
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// # No hardcoded URLs
/// All connection details (`base_url`, `api_key`, `model`) come exclusively
/// from the [`TextProviderConfig`] passed to
/// [`ApiTextProvider::from_config`].
pub struct ApiTextProvider {
    name: String,
    client: reqwest::Client,
    config: TextProviderConfig,
    temperature: f32,
}

impl ApiTextProvider {
    /// Build a provider from its configured connection details.
    ///
    /// The HTTP client is pre-configured with the per-request timeout.  A
    /// default (no-timeout) client is used as a last-resort fallback if the
    /// builder fails (should never happen in practice).
    pub fn from_config(
        name: &str,
        config: &TextProviderConfig,
        temperature: f32,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.to_string(),
            client,
            config: config.clone(),
            temperature,
        }
    }
}

#[async_trait]
impl TextProvider for ApiTextProvider {
    fn name(&self) -> &str {
        &self.name
    }

    /// Send the prompt pair to the configured endpoint.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// local providers that require no authentication.
    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user",   "content": user   }
            ],
            "stream":      false,
            "temperature": self.temperature,
            "max_tokens":  512
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

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(ProviderError::Empty)?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(ProviderError::Empty);
        }

        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
