//! Engine settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//!
//! Provider credentials are wrapped in [`Secret`], which redacts itself in
//! `Debug` and `Display` output so a stray `{:?}` can never leak a key into
//! the logs.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// An opaque credential string that never appears in log output.
///
/// Serialises transparently (the TOML file holds the real value); `Debug` and
/// `Display` both print `***`.
///
/// ```
/// use voice_agent::config::Secret;
///
/// let key = Secret::new("sk-very-secret");
/// assert_eq!(format!("{key}"), "***");
/// assert_eq!(format!("{key:?}"), "Secret(***)");
/// assert_eq!(key.expose(), "sk-very-secret");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a credential value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying value.  Callers must not log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the wrapped value is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Connection details for one text-generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextProviderConfig {
    /// Base URL of the API endpoint (e.g. `https://api.openai.com`).
    pub base_url: String,
    /// API key — `None` for providers that require no authentication.
    pub api_key: Option<Secret>,
    /// Model identifier sent to the API (e.g. `"gpt-4o-mini"`).
    pub model: String,
}

/// Settings for the text-generation provider family.
///
/// The `providers` table is declared last so the TOML serialiser emits the
/// scalar fields before the per-provider sub-tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider ids tried in order; the first non-empty response wins.
    pub priority: Vec<String>,
    /// Sampling temperature (0.0 – 1.0).  Lower = more deterministic.
    pub temperature: f32,
    /// Maximum seconds to wait for a single provider attempt.
    pub attempt_timeout_secs: u64,
    /// Overall deadline for the whole provider chain, in seconds.
    pub deadline_secs: u64,
    /// Per-provider connection details, keyed by provider id.
    pub providers: BTreeMap<String, TextProviderConfig>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            "openai".to_string(),
            TextProviderConfig {
                base_url: "https://api.openai.com".into(),
                api_key: None,
                model: "gpt-4o-mini".into(),
            },
        );
        providers.insert(
            "groq".to_string(),
            TextProviderConfig {
                base_url: "https://api.groq.com/openai".into(),
                api_key: None,
                model: "llama-3.1-8b-instant".into(),
            },
        );

        Self {
            priority: vec!["openai".into(), "groq".into()],
            providers,
            temperature: 0.4,
            attempt_timeout_secs: 12,
            deadline_secs: 25,
        }
    }
}

// ---------------------------------------------------------------------------
// SynthesisConfig
// ---------------------------------------------------------------------------

/// Connection details for one voice-synthesis provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceProviderConfig {
    /// Base URL of the API endpoint.
    pub base_url: String,
    /// API key — `None` for providers that require no authentication.
    pub api_key: Option<Secret>,
    /// Voice identifier understood by the provider.
    pub voice: String,
}

/// Settings for the voice-synthesis provider family.
///
/// The on-device synthesizer is the terminal fallback and needs no entry
/// here — it is always tried last and requires no credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Provider ids tried in order before the on-device fallback.
    pub priority: Vec<String>,
    /// Maximum seconds to wait for a single synthesis fetch.
    pub attempt_timeout_secs: u64,
    /// Per-provider connection details, keyed by provider id.
    pub providers: BTreeMap<String, VoiceProviderConfig>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            "elevenlabs".to_string(),
            VoiceProviderConfig {
                base_url: "https://api.elevenlabs.io".into(),
                api_key: None,
                voice: "rachel".into(),
            },
        );

        Self {
            priority: vec!["elevenlabs".into()],
            providers,
            attempt_timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// RecognitionConfig
// ---------------------------------------------------------------------------

/// Settings for the continuous-recognition loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Quiet period after a final recognition result before the utterance is
    /// treated as complete and submitted, in milliseconds.
    pub quiet_period_ms: u64,
    /// Delay before the loop restarts capture after the platform ends a
    /// recognition session unexpectedly, in milliseconds.
    pub restart_delay_ms: u64,
    /// Primary speech language as an ISO-639-1 code.
    pub language: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 800,
            restart_delay_ms: 300,
            language: "en".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionConfig
// ---------------------------------------------------------------------------

/// Settings for page-directive execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// How long a located control stays visually emphasized before the click
    /// (or before the emphasis is cleared), in milliseconds.
    pub dwell_ms: u64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self { dwell_ms: 500 }
    }
}

// ---------------------------------------------------------------------------
// ContextConfig
// ---------------------------------------------------------------------------

/// Settings that control the bounded context window used in prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Number of most-recent messages included in generation prompts.
    pub window_size: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { window_size: 6 }
    }
}

// ---------------------------------------------------------------------------
// EngineSettings  (top-level)
// ---------------------------------------------------------------------------

/// Top-level engine configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_agent::config::EngineSettings;
///
/// // Load (returns Default when file is missing)
/// let settings = EngineSettings::load().unwrap();
///
/// // Modify and save
/// // settings.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Id of the conversation session to load/persist.
    pub session_id: String,
    /// Text-generation provider family.
    pub generation: GenerationConfig,
    /// Voice-synthesis provider family.
    pub synthesis: SynthesisConfig,
    /// Continuous-recognition loop timings.
    pub recognition: RecognitionConfig,
    /// Page-directive execution settings.
    pub actions: ActionConfig,
    /// Context-window settings.
    pub context: ContextConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            session_id: "default".into(),
            generation: GenerationConfig::default(),
            synthesis: SynthesisConfig::default(),
            recognition: RecognitionConfig::default(),
            actions: ActionConfig::default(),
            context: ContextConfig::default(),
        }
    }
}

impl EngineSettings {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(EngineSettings::default())` when the file does not exist
    /// yet (first-run scenario) so callers never need to special-case a
    /// missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
