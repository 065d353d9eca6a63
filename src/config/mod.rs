//! Configuration: settings structs, TOML persistence, application paths.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    ActionConfig, ContextConfig, EngineSettings, GenerationConfig, RecognitionConfig, Secret,
    SynthesisConfig, TextProviderConfig, VoiceProviderConfig,
};
