//! Continuous recognition loop — quiet-period debounce and restart policy.
//!
//! # Flow
//!
//! ```text
//! RecognitionEvent::Final(text)
//!   └─▶ buffer utterance, arm quiet-period timer (≈800 ms)
//! RecognitionEvent::Partial(text)
//!   └─▶ reset the armed timer (the user is still speaking)
//! timer fires, buffered utterance non-empty
//!   └─▶ EngineCommand::Submit(utterance)
//!
//! RecognitionEvent::Ended while voice mode is enabled
//!   └─▶ restart capture after ≈300 ms (unless an error is latched)
//! RecognitionEvent::Ended after explicit disable
//!   └─▶ nothing — the enabled flag is cleared *before* stop() is issued,
//!       so capture can never respawn after an explicit stop
//! ```
//!
//! Failure signals surface as a one-line error toast; they do not disable
//! voice mode, but they latch the loop against silent respawn until voice
//! mode is explicitly re-toggled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, sleep_until, Instant};

use crate::engine::EngineCommand;
use crate::events::{emit, toast, EngineEvent, EventSender, ToastKind};

use super::{RecognitionEvent, SpeechRecognizer};

// ---------------------------------------------------------------------------
// RecognitionHandle
// ---------------------------------------------------------------------------

/// Cheap-to-clone control surface over the recognition loop's state.
///
/// The engine uses it to toggle voice mode; the Interruption Coordinator
/// uses [`resume`](Self::resume) to re-enable capture as the final step of
/// the interrupt transition.
#[derive(Clone)]
pub struct RecognitionHandle {
    recognizer: Arc<dyn SpeechRecognizer>,
    enabled: Arc<AtomicBool>,
    error_latched: Arc<AtomicBool>,
    events: EventSender,
}

impl RecognitionHandle {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, events: EventSender) -> Self {
        Self {
            recognizer,
            enabled: Arc::new(AtomicBool::new(false)),
            error_latched: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    /// Turn voice mode on: clear any error latch and start capture.
    pub fn enable(&self) {
        self.error_latched.store(false, Ordering::SeqCst);
        self.enabled.store(true, Ordering::SeqCst);
        if let Err(e) = self.recognizer.start() {
            self.latch_error(&e.to_string());
        }
    }

    /// Turn voice mode off.
    ///
    /// The enabled flag is cleared *before* the recognizer is stopped: the
    /// platform's trailing end-of-session signal must find the flag down,
    /// otherwise capture restarts forever after an explicit stop.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        self.recognizer.stop();
    }

    /// Restart capture if voice mode is still on (interrupt path and the
    /// auto-restart policy both land here).
    pub fn resume(&self) {
        if !self.enabled.load(Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.recognizer.start() {
            self.latch_error(&e.to_string());
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub(crate) fn is_error_latched(&self) -> bool {
        self.error_latched.load(Ordering::SeqCst)
    }

    pub(crate) fn latch_error(&self, detail: &str) {
        self.error_latched.store(true, Ordering::SeqCst);
        toast(&self.events, ToastKind::Error, "Voice recognition error", detail);
    }
}

// ---------------------------------------------------------------------------
// RecognitionLoop
// ---------------------------------------------------------------------------

/// Consumes platform recognition events and turns them into submitted
/// utterances.
///
/// Create with [`RecognitionLoop::new`], then spawn [`run`](Self::run) as a
/// tokio task.
pub struct RecognitionLoop {
    handle: RecognitionHandle,
    quiet_period: Duration,
    restart_delay: Duration,
    events: EventSender,
    submit_tx: mpsc::Sender<EngineCommand>,
}

impl RecognitionLoop {
    pub fn new(
        handle: RecognitionHandle,
        quiet_period: Duration,
        restart_delay: Duration,
        events: EventSender,
        submit_tx: mpsc::Sender<EngineCommand>,
    ) -> Self {
        Self {
            handle,
            quiet_period,
            restart_delay,
            events,
            submit_tx,
        }
    }

    /// Run until the platform event channel closes.
    pub async fn run(self, mut rx: mpsc::Receiver<RecognitionEvent>) {
        // The utterance being assembled: final results accumulate here until
        // the quiet period elapses with no further interim updates.
        let mut pending: Option<String> = None;
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                maybe_event = rx.recv() => {
                    let Some(event) = maybe_event else { break };
                    match event {
                        RecognitionEvent::Partial(text) => {
                            emit(&self.events, EngineEvent::Transcript {
                                text,
                                is_final: false,
                            });
                            // The user is still speaking: push the submit out.
                            if deadline.is_some() {
                                deadline = Some(Instant::now() + self.quiet_period);
                            }
                        }

                        RecognitionEvent::Final(text) => {
                            emit(&self.events, EngineEvent::Transcript {
                                text: text.clone(),
                                is_final: true,
                            });
                            pending = Some(match pending.take() {
                                Some(prev) => format!("{prev} {text}"),
                                None => text,
                            });
                            deadline = Some(Instant::now() + self.quiet_period);
                        }

                        RecognitionEvent::Ended => {
                            self.maybe_restart().await;
                        }

                        RecognitionEvent::Error(e) => {
                            log::warn!("recognition: {e}");
                            self.handle.latch_error(&e.to_string());
                        }
                    }
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    if let Some(text) = pending.take() {
                        let utterance = text.trim().to_string();
                        if !utterance.is_empty() {
                            log::debug!("recognition: quiet period elapsed, submitting");
                            let _ = self
                                .submit_tx
                                .send(EngineCommand::Submit(utterance))
                                .await;
                        }
                    }
                }
            }
        }

        log::info!("recognition: platform event channel closed, loop shutting down");
    }

    /// Auto-restart after an unexpected end-of-session, unless voice mode was
    /// explicitly turned off or an error is latched.
    async fn maybe_restart(&self) {
        if !self.handle.is_enabled() || self.handle.is_error_latched() {
            return;
        }
        sleep(self.restart_delay).await;
        // Re-check: the user may have toggled voice off during the delay.
        if self.handle.is_enabled() && !self.handle.is_error_latched() {
            log::debug!("recognition: capture ended unexpectedly, restarting");
            self.handle.resume();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_channel;
    use crate::recognition::{MockRecognizer, RecognitionError};

    const QUIET: Duration = Duration::from_millis(100);
    const RESTART: Duration = Duration::from_millis(30);

    struct Fixture {
        recognizer: Arc<MockRecognizer>,
        handle: RecognitionHandle,
        event_rx: crate::events::EventReceiver,
        cmd_rx: mpsc::Receiver<EngineCommand>,
        platform_tx: mpsc::Sender<RecognitionEvent>,
    }

    fn spawn_loop() -> Fixture {
        let (event_tx, event_rx) = event_channel();
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (platform_tx, platform_rx) = mpsc::channel(16);

        let recognizer = Arc::new(MockRecognizer::default());
        let handle = RecognitionHandle::new(
            Arc::clone(&recognizer) as Arc<dyn SpeechRecognizer>,
            event_tx.clone(),
        );

        let looper = RecognitionLoop::new(
            handle.clone(),
            QUIET,
            RESTART,
            event_tx,
            cmd_tx,
        );
        tokio::spawn(looper.run(platform_rx));

        Fixture {
            recognizer,
            handle,
            event_rx,
            cmd_rx,
            platform_tx,
        }
    }

    async fn expect_submit(rx: &mut mpsc::Receiver<EngineCommand>) -> String {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(EngineCommand::Submit(text))) => text,
            other => panic!("expected Submit, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn final_result_submits_after_quiet_period() {
        let mut fx = spawn_loop();
        fx.platform_tx
            .send(RecognitionEvent::Final("next question".into()))
            .await
            .unwrap();

        let text = expect_submit(&mut fx.cmd_rx).await;
        assert_eq!(text, "next question");
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_finals_concatenate_into_one_utterance() {
        let mut fx = spawn_loop();
        fx.platform_tx
            .send(RecognitionEvent::Final("show".into()))
            .await
            .unwrap();
        fx.platform_tx
            .send(RecognitionEvent::Final("the answer".into()))
            .await
            .unwrap();

        let text = expect_submit(&mut fx.cmd_rx).await;
        assert_eq!(text, "show the answer");
    }

    /// An interim update arriving before the timer fires must reset it.
    #[tokio::test(start_paused = true)]
    async fn partial_resets_the_quiet_timer() {
        let mut fx = spawn_loop();
        fx.platform_tx
            .send(RecognitionEvent::Final("hello".into()))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        fx.platform_tx
            .send(RecognitionEvent::Partial("hello th".into()))
            .await
            .unwrap();

        // 125 ms after the final but only 75 ms after the partial — the reset
        // timer must not have fired yet.
        tokio::time::sleep(Duration::from_millis(75)).await;
        assert!(
            fx.cmd_rx.try_recv().is_err(),
            "submit fired before the reset quiet period elapsed"
        );

        let text = expect_submit(&mut fx.cmd_rx).await;
        assert_eq!(text, "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn blank_final_never_submits() {
        let mut fx = spawn_loop();
        fx.platform_tx
            .send(RecognitionEvent::Final("   ".into()))
            .await
            .unwrap();

        tokio::time::sleep(QUIET * 3).await;
        assert!(fx.cmd_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn transcript_events_flow_to_the_ui() {
        let mut fx = spawn_loop();
        fx.platform_tx
            .send(RecognitionEvent::Partial("he".into()))
            .await
            .unwrap();
        fx.platform_tx
            .send(RecognitionEvent::Final("hello".into()))
            .await
            .unwrap();

        // Drain until the final transcript appears.
        let mut saw_partial = false;
        let mut saw_final = false;
        for _ in 0..4 {
            match tokio::time::timeout(Duration::from_secs(1), fx.event_rx.recv()).await {
                Ok(Some(EngineEvent::Transcript { is_final, .. })) => {
                    if is_final {
                        saw_final = true;
                        break;
                    }
                    saw_partial = true;
                }
                _ => break,
            }
        }
        assert!(saw_partial && saw_final);
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_end_restarts_capture() {
        let fx = spawn_loop();
        fx.handle.enable();
        assert_eq!(fx.recognizer.start_count(), 1);

        fx.platform_tx.send(RecognitionEvent::Ended).await.unwrap();
        tokio::time::sleep(RESTART * 4).await;

        assert_eq!(fx.recognizer.start_count(), 2);
    }

    /// The state-leak guard: an end-of-session signal arriving after an
    /// explicit disable must never respawn capture.
    #[tokio::test(start_paused = true)]
    async fn end_after_explicit_disable_does_not_restart() {
        let fx = spawn_loop();
        fx.handle.enable();
        fx.handle.disable();
        assert_eq!(fx.recognizer.stop_count(), 1);

        fx.platform_tx.send(RecognitionEvent::Ended).await.unwrap();
        tokio::time::sleep(RESTART * 4).await;

        assert_eq!(fx.recognizer.start_count(), 1, "capture respawned after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn error_latches_the_loop_against_respawn() {
        let mut fx = spawn_loop();
        fx.handle.enable();

        fx.platform_tx
            .send(RecognitionEvent::Error(RecognitionError::Network(
                "offline".into(),
            )))
            .await
            .unwrap();
        fx.platform_tx.send(RecognitionEvent::Ended).await.unwrap();
        tokio::time::sleep(RESTART * 4).await;

        // No silent respawn after the failure signal.
        assert_eq!(fx.recognizer.start_count(), 1);

        // The failure surfaced as a one-line error toast.
        let mut saw_toast = false;
        while let Ok(ev) = fx.event_rx.try_recv() {
            if matches!(ev, EngineEvent::Toast { kind: ToastKind::Error, .. }) {
                saw_toast = true;
            }
        }
        assert!(saw_toast);
    }

    #[tokio::test(start_paused = true)]
    async fn re_enabling_clears_the_error_latch() {
        let fx = spawn_loop();
        fx.handle.enable();
        fx.handle.latch_error("boom");
        assert!(fx.handle.is_error_latched());

        fx.handle.enable();
        assert!(!fx.handle.is_error_latched());
        assert_eq!(fx.recognizer.start_count(), 2);
    }
}
