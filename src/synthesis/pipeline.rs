//! Synthesis pipeline — provider fallback chain plus playback control.
//!
//! [`SynthesisPipeline::speak`] walks the configured voice providers in
//! priority order, plays the first successfully fetched clip through the
//! single shared [`Playback`] handle, and falls back to the on-device
//! [`LocalSynthesizer`] when every remote provider fails.  If no on-device
//! capability exists either, synthesis is silently skipped — the reply text
//! has already been displayed.
//!
//! Cancellation is indistinguishable from natural completion: `speak` simply
//! returns in both cases.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::engine::token::CancelToken;

use super::playback::double_stop;
use super::{LocalSynthesizer, Playback, VoiceProvider};

// ---------------------------------------------------------------------------
// SynthesisPipeline
// ---------------------------------------------------------------------------

/// Owns the voice-provider priority list and the shared playback handle.
pub struct SynthesisPipeline {
    providers: Vec<Arc<dyn VoiceProvider>>,
    playback: Arc<dyn Playback>,
    local: Option<Arc<dyn LocalSynthesizer>>,
    attempt_timeout: Duration,
}

impl SynthesisPipeline {
    /// Create a pipeline.
    ///
    /// # Arguments
    ///
    /// * `providers` — remote voice providers, highest priority first.
    /// * `playback`  — the single shared playback handle.
    /// * `local`     — on-device synthesis capability, or `None` when the
    ///                 platform has none.
    pub fn new(
        providers: Vec<Arc<dyn VoiceProvider>>,
        playback: Arc<dyn Playback>,
        local: Option<Arc<dyn LocalSynthesizer>>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            playback,
            local,
            attempt_timeout,
        }
    }

    /// Force-stop whatever is currently playing.
    ///
    /// Uses the double-stop routine against both the playback handle and the
    /// on-device synthesizer; safe to call when nothing is active.
    pub async fn stop_current(&self) {
        let playback = Arc::clone(&self.playback);
        double_stop(move || playback.stop()).await;

        if let Some(local) = &self.local {
            let local = Arc::clone(local);
            double_stop(move || local.stop()).await;
        }
    }

    /// Speak `text`, trying providers in priority order.
    ///
    /// Resolves once audio finishes naturally or the token is invalidated —
    /// callers cannot tell the two apart, by design.  Never returns an
    /// error: total synthesis failure just means the turn completes silently.
    pub async fn speak(&self, text: &str, token: &CancelToken) {
        // Only one playback handle is ever active: stop any prior audio
        // before starting the new clip.
        self.stop_current().await;

        if !token.is_current() {
            return;
        }

        for provider in &self.providers {
            let clip = match timeout(self.attempt_timeout, provider.synthesize(text)).await {
                Ok(Ok(clip)) => clip,
                Ok(Err(e)) => {
                    log::debug!("synthesis: provider {} failed: {e}", provider.name());
                    continue;
                }
                Err(_) => {
                    log::debug!("synthesis: provider {} timed out", provider.name());
                    continue;
                }
            };

            if !token.is_current() {
                return;
            }

            tokio::select! {
                result = self.playback.play(clip) => {
                    match result {
                        Ok(()) => return,
                        Err(e) => {
                            log::warn!(
                                "synthesis: playback failed for {}: {e}",
                                provider.name()
                            );
                            continue;
                        }
                    }
                }
                _ = token.cancelled() => {
                    self.stop_current().await;
                    return;
                }
            }
        }

        // Terminal fallback: on-device synthesis, no credential required.
        let Some(local) = &self.local else {
            log::info!("synthesis: no on-device capability — skipping playback");
            return;
        };

        tokio::select! {
            result = local.speak(text) => {
                if let Err(e) = result {
                    log::warn!("synthesis: on-device fallback failed: {e}");
                }
            }
            _ = token.cancelled() => {
                let local = Arc::clone(local);
                double_stop(move || local.stop()).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::token::TokenSource;
    use crate::synthesis::{AudioClip, SynthesisError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Voice provider that always succeeds with a tiny clip.
    struct OkVoice(&'static str);

    #[async_trait]
    impl VoiceProvider for OkVoice {
        fn name(&self) -> &str {
            self.0
        }
        async fn synthesize(&self, _text: &str) -> Result<AudioClip, SynthesisError> {
            Ok(AudioClip {
                bytes: vec![1, 2, 3],
                mime: "audio/mpeg".into(),
            })
        }
    }

    /// Voice provider that always fails.
    struct DownVoice(&'static str);

    #[async_trait]
    impl VoiceProvider for DownVoice {
        fn name(&self) -> &str {
            self.0
        }
        async fn synthesize(&self, _text: &str) -> Result<AudioClip, SynthesisError> {
            Err(SynthesisError::Unavailable("connection refused".into()))
        }
    }

    /// Playback recorder: counts plays and stops; `play` finishes instantly.
    #[derive(Default)]
    struct InstantPlayback {
        plays: AtomicUsize,
        stops: AtomicUsize,
    }

    #[async_trait]
    impl Playback for InstantPlayback {
        async fn play(&self, _clip: AudioClip) -> Result<(), SynthesisError> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Playback that blocks until `stop` is called.
    struct BlockingPlayback {
        stopped: Notify,
        stops: AtomicUsize,
    }

    impl BlockingPlayback {
        fn new() -> Self {
            Self {
                stopped: Notify::new(),
                stops: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Playback for BlockingPlayback {
        async fn play(&self, _clip: AudioClip) -> Result<(), SynthesisError> {
            self.stopped.notified().await;
            Ok(())
        }
        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.stopped.notify_waiters();
        }
    }

    /// On-device synthesizer recorder.
    #[derive(Default)]
    struct RecordingLocal {
        spoken: Mutex<Vec<String>>,
        stops: AtomicUsize,
    }

    #[async_trait]
    impl LocalSynthesizer for RecordingLocal {
        async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }
        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn pipeline(
        providers: Vec<Arc<dyn VoiceProvider>>,
        playback: Arc<dyn Playback>,
        local: Option<Arc<dyn LocalSynthesizer>>,
    ) -> SynthesisPipeline {
        SynthesisPipeline::new(providers, playback, local, Duration::from_secs(5))
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn first_working_provider_plays() {
        let playback = Arc::new(InstantPlayback::default());
        let p = pipeline(
            vec![Arc::new(OkVoice("a")), Arc::new(OkVoice("b"))],
            Arc::clone(&playback) as Arc<dyn Playback>,
            None,
        );
        let source = TokenSource::new();

        p.speak("hello", &source.issue()).await;
        assert_eq!(playback.plays.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_provider_advances_to_next() {
        let playback = Arc::new(InstantPlayback::default());
        let p = pipeline(
            vec![Arc::new(DownVoice("down")), Arc::new(OkVoice("up"))],
            Arc::clone(&playback) as Arc<dyn Playback>,
            None,
        );
        let source = TokenSource::new();

        p.speak("hello", &source.issue()).await;
        assert_eq!(playback.plays.load(Ordering::SeqCst), 1);
    }

    /// With every remote provider down, the on-device fallback speaks.
    #[tokio::test(start_paused = true)]
    async fn all_providers_down_falls_back_to_local() {
        let playback = Arc::new(InstantPlayback::default());
        let local = Arc::new(RecordingLocal::default());
        let p = pipeline(
            vec![Arc::new(DownVoice("a")), Arc::new(DownVoice("b"))],
            Arc::clone(&playback) as Arc<dyn Playback>,
            Some(Arc::clone(&local) as Arc<dyn LocalSynthesizer>),
        );
        let source = TokenSource::new();

        p.speak("read this aloud", &source.issue()).await;

        assert_eq!(playback.plays.load(Ordering::SeqCst), 0);
        assert_eq!(local.spoken.lock().unwrap().as_slice(), ["read this aloud"]);
    }

    /// No providers and no on-device capability — still returns cleanly.
    #[tokio::test(start_paused = true)]
    async fn no_capability_at_all_skips_silently() {
        let playback = Arc::new(InstantPlayback::default());
        let p = pipeline(
            vec![Arc::new(DownVoice("down"))],
            Arc::clone(&playback) as Arc<dyn Playback>,
            None,
        );
        let source = TokenSource::new();

        // Must simply return — no panic, no error surface.
        p.speak("silent", &source.issue()).await;
        assert_eq!(playback.plays.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn speak_stops_prior_playback_first() {
        let playback = Arc::new(InstantPlayback::default());
        let p = pipeline(
            vec![Arc::new(OkVoice("a"))],
            Arc::clone(&playback) as Arc<dyn Playback>,
            None,
        );
        let source = TokenSource::new();

        p.speak("one", &source.issue()).await;
        // Double-stop fired before the first clip: two stops per speak call.
        assert_eq!(playback.stops.load(Ordering::SeqCst), 2);

        p.speak("two", &source.issue()).await;
        assert_eq!(playback.stops.load(Ordering::SeqCst), 4);
        assert_eq!(playback.plays.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_token_skips_playback_entirely() {
        let playback = Arc::new(InstantPlayback::default());
        let p = pipeline(
            vec![Arc::new(OkVoice("a"))],
            Arc::clone(&playback) as Arc<dyn Playback>,
            None,
        );
        let source = TokenSource::new();
        let token = source.issue();
        source.invalidate();

        p.speak("never heard", &token).await;
        assert_eq!(playback.plays.load(Ordering::SeqCst), 0);
    }

    /// Cancellation mid-playback stops the handle and returns like a normal
    /// completion.
    #[tokio::test(start_paused = true)]
    async fn cancellation_mid_playback_is_clean() {
        let playback = Arc::new(BlockingPlayback::new());
        let p = Arc::new(pipeline(
            vec![Arc::new(OkVoice("a"))],
            Arc::clone(&playback) as Arc<dyn Playback>,
            None,
        ));
        let source = TokenSource::new();
        let token = source.issue();

        let speak_task = {
            let p = Arc::clone(&p);
            let token = token.clone();
            tokio::spawn(async move { p.speak("long reply", &token).await })
        };

        // Give speak() a chance to reach the blocking play.
        tokio::time::sleep(Duration::from_millis(50)).await;
        source.invalidate();

        tokio::time::timeout(Duration::from_secs(2), speak_task)
            .await
            .expect("speak must resolve after cancellation")
            .expect("speak task must not panic");

        // Initial double-stop (2) plus the post-cancellation double-stop (2).
        assert!(playback.stops.load(Ordering::SeqCst) >= 4);
    }
}
