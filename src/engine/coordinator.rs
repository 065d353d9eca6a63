//! Interruption coordinator — the single owner of the engine's phase state
//! and cancellation tokens.
//!
//! No other component mutates the phase directly; Recognition, Generation
//! and Synthesis all go through the transition methods here.  The one
//! non-linear transition is [`interrupt`](InterruptionCoordinator::interrupt),
//! whose strict internal ordering is the correctness core of the whole
//! engine:
//!
//! 1. invalidate the current cancellation token — aborts any in-flight
//!    generation request;
//! 2. force-stop synthesis via the double-stop routine;
//! 3. set the phase to `Listening` **and only then** resume recognition —
//!    if recognition resumed first, the next end-of-utterance handler would
//!    see a stale phase and silently drop the user's new utterance.

use std::sync::{Arc, Mutex};

use crate::events::{emit, EngineEvent, EventSender};
use crate::recognition::RecognitionHandle;
use crate::synthesis::SynthesisPipeline;

use super::phase::Phase;
use super::token::{CancelToken, TokenSource};

// ---------------------------------------------------------------------------
// InterruptionCoordinator
// ---------------------------------------------------------------------------

/// Owns [`Phase`] and the [`TokenSource`]; exposes transitions, never a raw
/// setter.
pub struct InterruptionCoordinator {
    phase: Mutex<Phase>,
    tokens: TokenSource,
    events: EventSender,
    synthesis: Arc<SynthesisPipeline>,
    recognition: RecognitionHandle,
}

impl InterruptionCoordinator {
    pub fn new(
        events: EventSender,
        synthesis: Arc<SynthesisPipeline>,
        recognition: RecognitionHandle,
    ) -> Self {
        Self {
            phase: Mutex::new(Phase::Idle),
            tokens: TokenSource::new(),
            events,
            synthesis,
            recognition,
        }
    }

    /// Current phase snapshot.
    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap()
    }

    /// The single point where the phase flag changes; publishes the
    /// phase/status event in the same critical step.
    fn set_phase(&self, next: Phase) {
        {
            let mut phase = self.phase.lock().unwrap();
            if *phase == next {
                return;
            }
            log::debug!("phase: {} → {}", phase.label(), next.label());
            *phase = next;
        }
        emit(
            &self.events,
            EngineEvent::Phase {
                phase: next,
                status: next.status().to_string(),
            },
        );
    }

    // -----------------------------------------------------------------------
    // Linear transitions
    // -----------------------------------------------------------------------

    /// Voice mode explicitly disabled: stop looping, no auto-restart.
    pub fn to_idle(&self) {
        self.tokens.invalidate();
        self.set_phase(Phase::Idle);
    }

    /// Voice mode enabled, or a turn completed while voice mode is on.
    pub fn to_listening(&self) {
        self.set_phase(Phase::Listening);
    }

    /// Accept an utterance and open a turn: `Listening → Sending`, with a
    /// fresh cancellation token (issuing invalidates any prior token).
    ///
    /// Returns `None` when the engine is not in `Listening` — a new
    /// utterance cannot begin processing while a turn is in flight, except
    /// via the interrupt transition.
    pub fn begin_turn(&self) -> Option<CancelToken> {
        {
            let mut phase = self.phase.lock().unwrap();
            if *phase != Phase::Listening {
                log::debug!(
                    "turn: utterance ignored in phase {}",
                    phase.label()
                );
                return None;
            }
            *phase = Phase::Sending;
        }
        emit(
            &self.events,
            EngineEvent::Phase {
                phase: Phase::Sending,
                status: Phase::Sending.status().to_string(),
            },
        );
        Some(self.tokens.issue())
    }

    /// `Sending → Generating`, gated on the turn's token still being live.
    pub fn begin_generating(&self, token: &CancelToken) -> bool {
        if !token.is_current() {
            return false;
        }
        self.set_phase(Phase::Generating);
        true
    }

    /// `Generating → Speaking`, gated on the turn's token still being live.
    pub fn begin_speaking(&self, token: &CancelToken) -> bool {
        if !token.is_current() {
            return false;
        }
        self.set_phase(Phase::Speaking);
        true
    }

    /// Close a turn that ran to natural completion.
    ///
    /// With a stale token this is a no-op: an interrupt already moved the
    /// machine back to `Listening` and this turn must not touch the phase.
    pub fn finish_turn(&self, token: &CancelToken, voice_enabled: bool) {
        if !token.is_current() {
            return;
        }
        if voice_enabled {
            self.set_phase(Phase::Listening);
        } else {
            self.set_phase(Phase::Idle);
        }
    }

    // -----------------------------------------------------------------------
    // Interrupt transition
    // -----------------------------------------------------------------------

    /// The interrupt transition — valid from `Generating` or `Speaking` only.
    ///
    /// Returns `false` (and does nothing) from any other phase.  See the
    /// module docs for the strict internal ordering.
    pub async fn interrupt(&self) -> bool {
        if !self.phase().can_interrupt() {
            log::debug!("interrupt: ignored in phase {}", self.phase().label());
            return false;
        }

        // (1) Abort any in-flight generation request.
        self.tokens.invalidate();

        // (2) Force-stop synthesis (double-stop routine).
        self.synthesis.stop_current().await;

        // (3) Phase flag first, then capture — the next end-of-utterance
        //     handler must already see Listening.
        self.set_phase(Phase::Listening);
        self.recognition.resume();

        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_channel;
    use crate::recognition::{MockRecognizer, SpeechRecognizer};
    use crate::synthesis::{AudioClip, Playback, SynthesisError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingPlayback {
        stops: AtomicUsize,
    }

    #[async_trait]
    impl Playback for CountingPlayback {
        async fn play(&self, _clip: AudioClip) -> Result<(), SynthesisError> {
            Ok(())
        }
        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        coordinator: InterruptionCoordinator,
        recognizer: Arc<MockRecognizer>,
        playback: Arc<CountingPlayback>,
        event_rx: crate::events::EventReceiver,
    }

    fn fixture() -> Fixture {
        let (event_tx, event_rx) = event_channel();
        let playback = Arc::new(CountingPlayback::default());
        let synthesis = Arc::new(SynthesisPipeline::new(
            Vec::new(),
            Arc::clone(&playback) as Arc<dyn Playback>,
            None,
            Duration::from_secs(1),
        ));
        let recognizer = Arc::new(MockRecognizer::default());
        let recognition = RecognitionHandle::new(
            Arc::clone(&recognizer) as Arc<dyn SpeechRecognizer>,
            event_tx.clone(),
        );

        Fixture {
            coordinator: InterruptionCoordinator::new(event_tx, synthesis, recognition.clone()),
            recognizer,
            playback,
            event_rx,
        }
    }

    /// Walk a fixture to the Speaking phase with a live token.
    fn walk_to_speaking(fx: &Fixture) -> CancelToken {
        fx.coordinator.to_listening();
        let token = fx.coordinator.begin_turn().expect("turn should open");
        assert!(fx.coordinator.begin_generating(&token));
        assert!(fx.coordinator.begin_speaking(&token));
        token
    }

    #[test]
    fn starts_idle() {
        let fx = fixture();
        assert_eq!(fx.coordinator.phase(), Phase::Idle);
    }

    #[test]
    fn begin_turn_requires_listening() {
        let fx = fixture();
        assert!(fx.coordinator.begin_turn().is_none());

        fx.coordinator.to_listening();
        assert!(fx.coordinator.begin_turn().is_some());
        assert_eq!(fx.coordinator.phase(), Phase::Sending);

        // Busy now — a second utterance is rejected.
        assert!(fx.coordinator.begin_turn().is_none());
    }

    /// Opening a new turn invalidates the previous turn's token.
    #[test]
    fn new_turn_invalidates_previous_token() {
        let fx = fixture();
        fx.coordinator.to_listening();
        let first = fx.coordinator.begin_turn().unwrap();
        fx.coordinator.to_listening();
        let second = fx.coordinator.begin_turn().unwrap();

        assert!(!first.is_current());
        assert!(second.is_current());
    }

    #[test]
    fn full_turn_walks_every_phase() {
        let fx = fixture();
        let token = walk_to_speaking(&fx);
        assert_eq!(fx.coordinator.phase(), Phase::Speaking);

        fx.coordinator.finish_turn(&token, true);
        assert_eq!(fx.coordinator.phase(), Phase::Listening);
    }

    #[test]
    fn finish_turn_with_voice_off_returns_to_idle() {
        let fx = fixture();
        let token = walk_to_speaking(&fx);
        fx.coordinator.finish_turn(&token, false);
        assert_eq!(fx.coordinator.phase(), Phase::Idle);
    }

    #[test]
    fn stale_token_cannot_advance_phases() {
        let fx = fixture();
        fx.coordinator.to_listening();
        let token = fx.coordinator.begin_turn().unwrap();
        fx.coordinator.to_listening();
        let _newer = fx.coordinator.begin_turn().unwrap();

        assert!(!fx.coordinator.begin_generating(&token));
        assert!(!fx.coordinator.begin_speaking(&token));
    }

    /// A stale finish must not clobber the phase the interrupt left behind.
    #[tokio::test(start_paused = true)]
    async fn stale_finish_is_a_no_op() {
        let fx = fixture();
        fx.coordinator.recognition.enable();
        let token = walk_to_speaking(&fx);

        assert!(fx.coordinator.interrupt().await);
        assert_eq!(fx.coordinator.phase(), Phase::Listening);

        // The interrupted turn's epilogue runs late with its stale token.
        fx.coordinator.finish_turn(&token, false);
        assert_eq!(fx.coordinator.phase(), Phase::Listening);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_is_rejected_outside_generating_and_speaking() {
        let fx = fixture();
        assert!(!fx.coordinator.interrupt().await);

        fx.coordinator.to_listening();
        assert!(!fx.coordinator.interrupt().await);

        fx.coordinator.begin_turn().unwrap();
        // Sending is still not interruptible.
        assert!(!fx.coordinator.interrupt().await);
    }

    /// Interrupt invalidates the token, double-stops
    /// playback, lands in Listening and resumes capture.
    #[tokio::test(start_paused = true)]
    async fn interrupt_from_speaking_resets_everything() {
        let fx = fixture();
        fx.coordinator.recognition.enable();
        let starts_before = fx.recognizer.start_count();
        let token = walk_to_speaking(&fx);

        assert!(fx.coordinator.interrupt().await);

        assert!(!token.is_current(), "token must be invalidated");
        assert!(
            fx.playback.stops.load(Ordering::SeqCst) >= 2,
            "playback must be stopped twice"
        );
        assert_eq!(fx.coordinator.phase(), Phase::Listening);
        assert_eq!(
            fx.recognizer.start_count(),
            starts_before + 1,
            "recognition must resume"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_from_generating_is_legal() {
        let fx = fixture();
        fx.coordinator.recognition.enable();
        fx.coordinator.to_listening();
        let token = fx.coordinator.begin_turn().unwrap();
        fx.coordinator.begin_generating(&token);

        assert!(fx.coordinator.interrupt().await);
        assert!(!token.is_current());
        assert_eq!(fx.coordinator.phase(), Phase::Listening);
    }

    /// The phase is Listening before (and therefore when) recognition
    /// resumes, so the very next utterance opens a turn instead of being
    /// dropped.
    #[tokio::test(start_paused = true)]
    async fn next_utterance_after_interrupt_opens_a_turn() {
        let fx = fixture();
        fx.coordinator.recognition.enable();
        let _token = walk_to_speaking(&fx);

        fx.coordinator.interrupt().await;

        let token = fx.coordinator.begin_turn();
        assert!(token.is_some(), "post-interrupt utterance was dropped");
    }

    #[test]
    fn phase_changes_publish_status_events() {
        let mut fx = fixture();
        fx.coordinator.to_listening();
        fx.coordinator.begin_turn().unwrap();

        let mut phases = Vec::new();
        while let Ok(ev) = fx.event_rx.try_recv() {
            if let EngineEvent::Phase { phase, status } = ev {
                assert!(!status.is_empty());
                phases.push(phase);
            }
        }
        assert_eq!(phases, vec![Phase::Listening, Phase::Sending]);
    }
}
