//! Text generation: interchangeable providers, prompt assembly, the
//! priority-order fallback chain and the deterministic local fallback.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use voice_agent::actions::page::{PageSnapshot, RouteIndex};
//! use voice_agent::config::EngineSettings;
//! use voice_agent::engine::token::TokenSource;
//! use voice_agent::generation::{
//!     ApiTextProvider, GenerationOrchestrator, PromptBuilder, TextProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = EngineSettings::default();
//!     let providers: Vec<Arc<dyn TextProvider>> = settings
//!         .generation
//!         .priority
//!         .iter()
//!         .filter_map(|id| settings.generation.providers.get(id).map(|cfg| {
//!             Arc::new(ApiTextProvider::from_config(id, cfg, 0.4, 12)) as Arc<dyn TextProvider>
//!         }))
//!         .collect();
//!
//!     let orchestrator = GenerationOrchestrator::new(
//!         providers,
//!         PromptBuilder::new("en"),
//!         Duration::from_secs(25),
//!     );
//!
//!     let tokens = TokenSource::new();
//!     let routes = RouteIndex::new(vec![("/".into(), "Home".into())]);
//!     let reply = orchestrator
//!         .generate("hello", &[], &PageSnapshot::default(), &routes, &tokens.issue())
//!         .await
//!         .unwrap();
//!     println!("{reply}");
//! }
//! ```

pub mod api;
pub mod fallback;
pub mod orchestrator;
pub mod prompt;
pub mod provider;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use api::ApiTextProvider;
pub use fallback::LocalReplies;
pub use orchestrator::GenerationOrchestrator;
pub use prompt::PromptBuilder;
pub use provider::{ProviderError, TextProvider};
