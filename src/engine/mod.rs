//! Engine core — wiring, the command loop and the per-turn driver.
//!
//! [`VoiceEngine`] owns every component and responds to [`EngineCommand`]s
//! received over a `tokio::sync::mpsc` channel.
//!
//! # Turn flow
//!
//! ```text
//! EngineCommand::Submit(utterance)           (from the recognition loop)
//!   └─▶ coordinator.begin_turn()             [Listening → Sending, fresh token]
//!         └─▶ snapshot page, append user message
//!         └─▶ orchestrator.generate(…)       [Generating]
//!               ├─ Cancelled → discard, turn over (interrupt already reset phase)
//!               └─ Ok(raw)  → parse directives, append assistant message
//!                     └─▶ executor.execute_all(…)    (page side-effects)
//!                     └─▶ synthesis.speak(display)   [Speaking]
//!                           └─▶ coordinator.finish_turn()  [→ Listening]
//! ```
//!
//! The command loop itself never blocks on a turn: each turn runs as a
//! spawned task, which is what keeps `Interrupt` responsive while
//! generation or synthesis is in flight.  Stale-token checks at every
//! mutation point make the overlap safe.

pub mod coordinator;
pub mod phase;
pub mod token;

pub use coordinator::InterruptionCoordinator;
pub use phase::Phase;
pub use token::{CancelToken, TokenSource};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::actions::{parse_reply, DirectiveExecutor, PageActions, PageIntrospector, RouteIndex};
use crate::config::EngineSettings;
use crate::events::{emit, event_channel, toast, EngineEvent, EventReceiver, EventSender, ToastKind};
use crate::generation::{
    ApiTextProvider, GenerationOrchestrator, PromptBuilder, ProviderError, TextProvider,
};
use crate::recognition::{
    listener::{RecognitionHandle, RecognitionLoop},
    RecognitionEvent, SpeechRecognizer,
};
use crate::session::{ConversationSession, Message, SessionStore};
use crate::synthesis::{ApiVoiceProvider, LocalSynthesizer, Playback, SynthesisPipeline, VoiceProvider};

// ---------------------------------------------------------------------------
// EngineCommand
// ---------------------------------------------------------------------------

/// Inbound control surface, bound by UI collaborators.
#[derive(Debug)]
pub enum EngineCommand {
    /// Turn voice mode on: recognition starts, phase goes to `Listening`.
    EnableVoice,
    /// Turn voice mode off: recognition stops (no auto-restart), `Idle`.
    DisableVoice,
    /// The dedicated interrupt gesture (e.g. key-hold) fired.
    Interrupt,
    /// A complete utterance from the recognition loop's quiet-period timer.
    Submit(String),
    /// Explicit user action: wipe the conversation log and its snapshot.
    ClearConversation,
}

// ---------------------------------------------------------------------------
// PlatformServices
// ---------------------------------------------------------------------------

/// The external collaborators injected at engine construction.
pub struct PlatformServices {
    /// Continuous speech-to-text capability.
    pub recognizer: Arc<dyn SpeechRecognizer>,
    /// Channel on which the recognizer pushes its events.
    pub recognition_events: mpsc::Receiver<RecognitionEvent>,
    /// The single shared audio playback handle.
    pub playback: Arc<dyn Playback>,
    /// On-device synthesis capability, or `None` when the platform has none.
    pub local_synthesizer: Option<Arc<dyn LocalSynthesizer>>,
    /// Live-page effect surface.
    pub page_actions: Arc<dyn PageActions>,
    /// Page introspection collaborator.
    pub page_introspector: Arc<dyn PageIntrospector>,
    /// Static sitemap lookup.
    pub routes: RouteIndex,
    /// Conversation persistence keyed by session id.
    pub session_store: Arc<dyn SessionStore>,
}

// ---------------------------------------------------------------------------
// EngineHandle
// ---------------------------------------------------------------------------

/// What the embedding surface holds: the command sender and the event stream.
pub struct EngineHandle {
    pub commands: mpsc::Sender<EngineCommand>,
    pub events: EventReceiver,
}

// ---------------------------------------------------------------------------
// VoiceEngine
// ---------------------------------------------------------------------------

struct EngineInner {
    settings: EngineSettings,
    coordinator: InterruptionCoordinator,
    orchestrator: GenerationOrchestrator,
    synthesis: Arc<SynthesisPipeline>,
    executor: DirectiveExecutor,
    introspector: Arc<dyn PageIntrospector>,
    routes: RouteIndex,
    session: Mutex<ConversationSession>,
    store: Arc<dyn SessionStore>,
    recognition: RecognitionHandle,
    events: EventSender,
}

/// The engine itself.  Create with [`VoiceEngine::new`], then spawn
/// [`run`](Self::run) as a tokio task (construction already spawns the
/// recognition loop, so it must happen inside a runtime).
pub struct VoiceEngine {
    inner: Arc<EngineInner>,
    commands: mpsc::Receiver<EngineCommand>,
}

impl VoiceEngine {
    /// Wire up every component from settings and platform collaborators.
    pub fn new(settings: EngineSettings, platform: PlatformServices) -> (Self, EngineHandle) {
        let (event_tx, event_rx) = event_channel();
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>(32);

        // ── Generation provider chain ────────────────────────────────────
        let text_providers: Vec<Arc<dyn TextProvider>> = settings
            .generation
            .priority
            .iter()
            .filter_map(|id| match settings.generation.providers.get(id) {
                Some(cfg) => Some(Arc::new(ApiTextProvider::from_config(
                    id,
                    cfg,
                    settings.generation.temperature,
                    settings.generation.attempt_timeout_secs,
                )) as Arc<dyn TextProvider>),
                None => {
                    log::warn!("generation: priority entry {id:?} has no provider config");
                    None
                }
            })
            .collect();

        let orchestrator = GenerationOrchestrator::new(
            text_providers,
            PromptBuilder::new(&settings.recognition.language),
            Duration::from_secs(settings.generation.deadline_secs),
        );

        // ── Synthesis provider chain ─────────────────────────────────────
        let voice_providers: Vec<Arc<dyn VoiceProvider>> = settings
            .synthesis
            .priority
            .iter()
            .filter_map(|id| match settings.synthesis.providers.get(id) {
                Some(cfg) => Some(Arc::new(ApiVoiceProvider::from_config(
                    id,
                    cfg,
                    settings.synthesis.attempt_timeout_secs,
                )) as Arc<dyn VoiceProvider>),
                None => {
                    log::warn!("synthesis: priority entry {id:?} has no provider config");
                    None
                }
            })
            .collect();

        let synthesis = Arc::new(SynthesisPipeline::new(
            voice_providers,
            platform.playback,
            platform.local_synthesizer,
            Duration::from_secs(settings.synthesis.attempt_timeout_secs),
        ));

        // ── Recognition loop ─────────────────────────────────────────────
        let recognition = RecognitionHandle::new(platform.recognizer, event_tx.clone());
        let listener = RecognitionLoop::new(
            recognition.clone(),
            Duration::from_millis(settings.recognition.quiet_period_ms),
            Duration::from_millis(settings.recognition.restart_delay_ms),
            event_tx.clone(),
            cmd_tx.clone(),
        );
        tokio::spawn(listener.run(platform.recognition_events));

        // ── Coordinator, executor, session ───────────────────────────────
        let coordinator = InterruptionCoordinator::new(
            event_tx.clone(),
            Arc::clone(&synthesis),
            recognition.clone(),
        );

        let executor = DirectiveExecutor::new(
            platform.page_actions,
            Arc::clone(&platform.page_introspector),
            platform.routes.clone(),
            event_tx.clone(),
            Duration::from_millis(settings.actions.dwell_ms),
        );

        let session = platform
            .session_store
            .load(&settings.session_id)
            .unwrap_or_else(|e| {
                log::warn!("session: failed to load {:?} ({e}); starting fresh", settings.session_id);
                ConversationSession::new(settings.session_id.as_str())
            });

        let inner = Arc::new(EngineInner {
            settings,
            coordinator,
            orchestrator,
            synthesis,
            executor,
            introspector: platform.page_introspector,
            routes: platform.routes,
            session: Mutex::new(session),
            store: platform.session_store,
            recognition,
            events: event_tx,
        });

        (
            Self {
                inner,
                commands: cmd_rx,
            },
            EngineHandle {
                commands: cmd_tx,
                events: event_rx,
            },
        )
    }

    /// Run the command loop until the channel is closed.
    pub async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            match command {
                EngineCommand::EnableVoice => {
                    log::info!("engine: voice mode on");
                    self.inner.recognition.enable();
                    self.inner.coordinator.to_listening();
                }

                EngineCommand::DisableVoice => {
                    log::info!("engine: voice mode off");
                    self.inner.recognition.disable();
                    self.inner.coordinator.to_idle();
                }

                EngineCommand::Interrupt => {
                    self.inner.coordinator.interrupt().await;
                }

                EngineCommand::Submit(utterance) => {
                    Self::start_turn(&self.inner, utterance);
                }

                EngineCommand::ClearConversation => {
                    let mut session = self.inner.session.lock().unwrap();
                    session.clear();
                    if let Err(e) = self.inner.store.remove(&session.id) {
                        log::warn!("session: failed to remove snapshot: {e}");
                    }
                    drop(session);
                    toast(
                        &self.inner.events,
                        ToastKind::Success,
                        "Conversation cleared",
                        "",
                    );
                }
            }
        }

        log::info!("engine: command channel closed, shutting down");
    }

    /// Open a turn for `utterance` and drive it on its own task, so the
    /// command loop stays responsive to `Interrupt`.
    fn start_turn(inner: &Arc<EngineInner>, utterance: String) {
        let Some(token) = inner.coordinator.begin_turn() else {
            // Busy — the only legal way in is the interrupt transition.
            return;
        };
        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            run_turn(inner, utterance, token).await;
        });
    }
}

// ---------------------------------------------------------------------------
// Turn driver
// ---------------------------------------------------------------------------

async fn run_turn(inner: Arc<EngineInner>, transcript: String, token: CancelToken) {
    // History snapshot is taken before the new user message so the prompt
    // doesn't carry the transcript twice.
    let history: Vec<Message> = {
        let session = inner.session.lock().unwrap();
        session
            .context_window(inner.settings.context.window_size)
            .to_vec()
    };

    {
        let mut session = inner.session.lock().unwrap();
        session.push(Message::user(transcript.as_str()));
        persist(&inner, &session);
    }

    let page = inner.introspector.snapshot();

    if !inner.coordinator.begin_generating(&token) {
        return;
    }

    let raw = match inner
        .orchestrator
        .generate(&transcript, &history, &page, &inner.routes, &token)
        .await
    {
        Ok(text) => text,
        Err(ProviderError::Cancelled) => {
            // Expected under normal interrupt usage — not an error.
            log::debug!("turn: generation result discarded (stale token)");
            return;
        }
        Err(e) => {
            log::warn!("turn: generation failed unexpectedly: {e}");
            return;
        }
    };

    if !token.is_current() {
        log::debug!("turn: reply discarded (stale token)");
        return;
    }

    let parsed = parse_reply(&raw);

    {
        let mut session = inner.session.lock().unwrap();
        session.push(Message::assistant(parsed.display_text.as_str(), raw.as_str()));
        persist(&inner, &session);
    }
    emit(
        &inner.events,
        EngineEvent::Reply {
            text: parsed.display_text.clone(),
        },
    );

    // Directives run before synthesis begins, in textual order, isolated.
    inner.executor.execute_all(&parsed.directives).await;

    if !inner.coordinator.begin_speaking(&token) {
        return;
    }
    if !parsed.display_text.is_empty() {
        inner.synthesis.speak(&parsed.display_text, &token).await;
    }

    inner
        .coordinator
        .finish_turn(&token, inner.recognition.is_enabled());
}

fn persist(inner: &EngineInner, session: &ConversationSession) {
    if let Err(e) = inner.store.save(session) {
        // Non-fatal: the in-memory transcript is the source of truth for
        // this surface instance.
        log::warn!("session: persist failed: {e}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
