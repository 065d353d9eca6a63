//! Autonomous voice conversation & agent action engine.
//!
//! Turns a continuous, hands-free spoken conversation into generated
//! assistant replies, spoken playback of those replies, and execution of
//! structured page directives the assistant embeds inline in its reply text.
//!
//! # Architecture
//!
//! ```text
//! SpeechRecognizer ──▶ RecognitionLoop ──Submit──▶ VoiceEngine
//!                        (quiet-period debounce)     │
//!                                                    ├─▶ GenerationOrchestrator
//!                                                    │     (provider chain → local fallback)
//!                                                    ├─▶ DirectiveExecutor
//!                                                    │     (navigate / click / scroll / highlight)
//!                                                    └─▶ SynthesisPipeline
//!                                                          (provider chain → on-device fallback)
//!
//! InterruptionCoordinator holds the phase state machine and the single
//! cancellation token; interrupt() short-circuits any stage back to
//! Listening.
//! ```
//!
//! Platform capabilities (continuous recognition, audio playback, on-device
//! synthesis, the live page) are external collaborators injected as trait
//! objects; the engine owns only the conversation state and the concurrency
//! discipline around it.

pub mod actions;
pub mod config;
pub mod engine;
pub mod events;
pub mod generation;
pub mod recognition;
pub mod session;
pub mod synthesis;

pub use config::EngineSettings;
pub use engine::{EngineCommand, Phase, VoiceEngine};
pub use events::{EngineEvent, ToastKind};
