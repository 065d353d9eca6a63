//! Developer harness — drives the engine with console stand-ins.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`EngineSettings`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build console platform collaborators: stdin lines play the role of
//!    final recognition results, page actions print what they would do, and
//!    the on-device synthesizer prints the spoken text.
//! 5. Construct [`VoiceEngine`] and spawn its command loop.
//! 6. Spawn the event printer and the stdin reader thread.
//!
//! # Console protocol
//!
//! ```text
//! any text        → a final recognition result (the quiet period applies)
//! /on  /off       → toggle voice mode
//! /int            → interrupt (the key-hold gesture)
//! /clear          → clear the conversation
//! /quit           → exit
//! ```

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};

use voice_agent::{
    actions::page::{ActionError, PageActions, PageIntrospector, PageSnapshot, RouteIndex},
    config::{AppPaths, EngineSettings},
    engine::{EngineCommand, PlatformServices, VoiceEngine},
    events::EngineEvent,
    recognition::{RecognitionEvent, RecognitionError, SpeechRecognizer},
    session::JsonSessionStore,
    synthesis::{AudioClip, LocalSynthesizer, Playback, SynthesisError},
};

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Console collaborators
// ---------------------------------------------------------------------------

/// "Recognizer" whose capture state is just a log line — the stdin thread
/// supplies the actual events.
struct ConsoleRecognizer;

impl SpeechRecognizer for ConsoleRecognizer {
    fn start(&self) -> Result<(), RecognitionError> {
        log::debug!("console recognizer: capture on");
        Ok(())
    }
    fn stop(&self) {
        log::debug!("console recognizer: capture off");
    }
}

/// Playback that just acknowledges clips (remote TTS is rarely configured in
/// the harness; the console voice below does the talking).
struct ConsolePlayback;

#[async_trait]
impl Playback for ConsolePlayback {
    async fn play(&self, clip: AudioClip) -> Result<(), SynthesisError> {
        println!("♪ playing {} bytes ({})", clip.bytes.len(), clip.mime);
        Ok(())
    }
    fn stop(&self) {}
}

/// On-device voice: prints the text it would speak.
struct ConsoleVoice;

#[async_trait]
impl LocalSynthesizer for ConsoleVoice {
    async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        println!("🔊 {text}");
        Ok(())
    }
    fn stop(&self) {}
}

/// A tiny two-page site the directives can act on.
struct ConsoleSite {
    route: Mutex<String>,
}

impl ConsoleSite {
    fn new() -> Self {
        Self {
            route: Mutex::new("/".to_string()),
        }
    }
}

impl PageActions for ConsoleSite {
    fn navigate(&self, path: &str) -> Result<(), ActionError> {
        *self.route.lock().unwrap() = path.to_string();
        println!("→ navigated to {path}");
        Ok(())
    }
    fn scroll_into_view(&self, label: &str) -> Result<(), ActionError> {
        println!("→ scrolled to \"{label}\"");
        Ok(())
    }
    fn emphasize(&self, label: &str) -> Result<(), ActionError> {
        println!("→ highlighting \"{label}\"");
        Ok(())
    }
    fn clear_emphasis(&self, _label: &str) {}
    fn click(&self, label: &str) -> Result<(), ActionError> {
        println!("→ clicked \"{label}\"");
        Ok(())
    }
}

impl PageIntrospector for ConsoleSite {
    fn snapshot(&self) -> PageSnapshot {
        let route = self.route.lock().unwrap().clone();
        match route.as_str() {
            "/quiz" => PageSnapshot {
                route,
                title: "Practice Quiz".into(),
                headings: vec!["Question 1".into(), "Scoring".into()],
                visible_links: vec!["Back to home".into()],
                visible_buttons: vec!["Next Question".into(), "Show Answer".into()],
            },
            _ => PageSnapshot {
                route,
                title: "Home".into(),
                headings: vec!["Welcome".into()],
                visible_links: vec!["Practice Quiz".into()],
                visible_buttons: vec!["Start".into()],
            },
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-agent harness starting up");

    // 2. Configuration
    let settings = EngineSettings::load().unwrap_or_else(|e| {
        log::warn!("Failed to load settings ({e}); using defaults");
        EngineSettings::default()
    });

    // 3. Tokio runtime (2 workers — generation + synthesis each take one)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    rt.block_on(run(settings))
}

async fn run(settings: EngineSettings) -> anyhow::Result<()> {
    // 4. Console platform collaborators
    let (recognition_tx, recognition_rx) = mpsc::channel::<RecognitionEvent>(16);
    let site = Arc::new(ConsoleSite::new());
    let store = Arc::new(JsonSessionStore::new(AppPaths::new().sessions_dir));

    let routes = RouteIndex::new(vec![
        ("/".into(), "Home".into()),
        ("/quiz".into(), "Practice Quiz".into()),
    ]);

    let platform = PlatformServices {
        recognizer: Arc::new(ConsoleRecognizer),
        recognition_events: recognition_rx,
        playback: Arc::new(ConsolePlayback),
        local_synthesizer: Some(Arc::new(ConsoleVoice)),
        page_actions: Arc::clone(&site) as Arc<dyn PageActions>,
        page_introspector: site as Arc<dyn PageIntrospector>,
        routes,
        session_store: store,
    };

    // 5. Engine
    let (engine, mut handle) = VoiceEngine::new(settings, platform);
    let commands = handle.commands.clone();
    tokio::spawn(engine.run());

    // 6a. Event printer
    tokio::spawn(async move {
        while let Some(event) = handle.events.recv().await {
            match event {
                EngineEvent::Transcript { text, is_final } => {
                    if is_final {
                        println!("you: {text}");
                    }
                }
                EngineEvent::Phase { status, .. } => println!("[{status}]"),
                EngineEvent::Reply { text } => println!("assistant: {text}"),
                EngineEvent::Toast { kind, title, detail } => {
                    println!("({kind:?}) {title}: {detail}")
                }
                EngineEvent::Suggestion { message } => println!("(suggestion) {message}"),
            }
        }
    });

    // 6b. Stdin reader — a blocking OS thread, like any platform input source.
    let (quit_tx, quit_rx) = oneshot::channel::<()>();
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            println!("type text to talk, /on /off /int /clear /quit");
            let stdin = std::io::stdin();
            let mut quit_tx = Some(quit_tx);
            let mut line = String::new();
            loop {
                line.clear();
                if stdin.read_line(&mut line).unwrap_or(0) == 0 {
                    break;
                }
                let trimmed = line.trim();
                let sent = match trimmed {
                    "" => true,
                    "/quit" => {
                        if let Some(tx) = quit_tx.take() {
                            let _ = tx.send(());
                        }
                        break;
                    }
                    "/on" => commands.blocking_send(EngineCommand::EnableVoice).is_ok(),
                    "/off" => commands.blocking_send(EngineCommand::DisableVoice).is_ok(),
                    "/int" => commands.blocking_send(EngineCommand::Interrupt).is_ok(),
                    "/clear" => commands
                        .blocking_send(EngineCommand::ClearConversation)
                        .is_ok(),
                    text => recognition_tx
                        .blocking_send(RecognitionEvent::Final(text.to_string()))
                        .is_ok(),
                };
                if !sent {
                    break;
                }
            }
        })
        .expect("failed to spawn stdin-reader thread");

    let _ = quit_rx.await;
    log::info!("voice-agent harness shutting down");
    Ok(())
}
