//! Speech recognition: the platform capability seam and the continuous
//! recognition loop built on top of it.
//!
//! The platform recognizer (an external collaborator) pushes
//! [`RecognitionEvent`]s into a channel; [`RecognitionLoop`](listener::RecognitionLoop)
//! consumes them, applies the quiet-period debounce, and owns the restart
//! policy.

pub mod listener;

pub use listener::{RecognitionHandle, RecognitionLoop};

use thiserror::Error;

// ---------------------------------------------------------------------------
// RecognitionError
// ---------------------------------------------------------------------------

/// Failure signals from the platform recognition capability.
///
/// These are surfaced as a one-line non-fatal error state; they do not
/// disable voice mode automatically, but they do stop the loop from silently
/// respawning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecognitionError {
    /// Microphone or speech-recognition permission was denied.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The recognition service lost network connectivity.
    #[error("recognition network error: {0}")]
    Network(String),

    /// Any other platform-level failure.
    #[error("recognition failed: {0}")]
    Platform(String),
}

// ---------------------------------------------------------------------------
// RecognitionEvent
// ---------------------------------------------------------------------------

/// Events emitted by the platform recognizer.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// An interim (still-speaking) transcript update.
    Partial(String),

    /// A final-flagged recognition result — one end-of-utterance unit.
    Final(String),

    /// The platform ended the capture session (expected after explicit stop,
    /// unexpected while voice mode is still active).
    Ended,

    /// A failure signal; the loop stops auto-restarting until voice mode is
    /// explicitly re-toggled.
    Error(RecognitionError),
}

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// Object-safe seam over the platform's continuous speech-to-text capability.
///
/// `start` begins (or resumes) continuous capture; results flow into the
/// event channel handed to the loop at construction.  `stop` ceases capture;
/// the platform may emit a trailing [`RecognitionEvent::Ended`].
pub trait SpeechRecognizer: Send + Sync {
    fn start(&self) -> Result<(), RecognitionError>;
    fn stop(&self);
}

// Compile-time assertion: Box<dyn SpeechRecognizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechRecognizer>) {}
};

// ---------------------------------------------------------------------------
// MockRecognizer  (test-only)
// ---------------------------------------------------------------------------

/// Test double that counts `start`/`stop` calls.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockRecognizer {
    pub starts: std::sync::atomic::AtomicUsize,
    pub stops: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockRecognizer {
    pub fn start_count(&self) -> usize {
        self.starts.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl SpeechRecognizer for MockRecognizer {
    fn start(&self) -> Result<(), RecognitionError> {
        self.starts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stops
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
