//! Engine phase state and status strings.
//!
//! [`Phase`] drives the Interruption Coordinator's state machine.  UI
//! collaborators read it from the phase/status event stream to render the
//! appropriate indicator.

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// States of the voice conversation engine.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──voice mode on──▶ Listening
///      ──quiet period──▶ Sending ──request issued──▶ Generating
///                                 ──reply + directives──▶ Speaking
///                                 ──synthesis done──▶ Listening  (loop)
/// Generating / Speaking ──interrupt──▶ Listening
/// Listening ──voice mode off──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Voice mode is off; nothing is captured or in flight.
    Idle,

    /// Continuous recognition is active, waiting for an utterance.
    Listening,

    /// An utterance was accepted; the turn is being prepared.
    Sending,

    /// A generation request is in flight.
    Generating,

    /// The reply is being spoken through the playback handle.
    Speaking,
}

impl Phase {
    /// Returns `true` while a turn is in flight (a new utterance cannot begin
    /// processing, except via the interrupt transition).
    ///
    /// ```
    /// use voice_agent::engine::Phase;
    ///
    /// assert!(!Phase::Idle.is_busy());
    /// assert!(!Phase::Listening.is_busy());
    /// assert!(Phase::Sending.is_busy());
    /// assert!(Phase::Generating.is_busy());
    /// assert!(Phase::Speaking.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Sending | Phase::Generating | Phase::Speaking)
    }

    /// Returns `true` in the only two states where the interrupt transition
    /// is legal.
    pub fn can_interrupt(&self) -> bool {
        matches!(self, Phase::Generating | Phase::Speaking)
    }

    /// A short human-readable label suitable for a status bar.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Listening => "Listening",
            Phase::Sending => "Sending",
            Phase::Generating => "Thinking",
            Phase::Speaking => "Speaking",
        }
    }

    /// The full status line published on the phase/status stream.
    pub fn status(&self) -> &'static str {
        match self {
            Phase::Idle => "voice off",
            Phase::Listening => "listening",
            Phase::Sending => "sending…",
            Phase::Generating => "thinking…",
            Phase::Speaking => "AI speaking — press to interrupt",
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_and_listening_are_not_busy() {
        assert!(!Phase::Idle.is_busy());
        assert!(!Phase::Listening.is_busy());
    }

    #[test]
    fn in_flight_phases_are_busy() {
        assert!(Phase::Sending.is_busy());
        assert!(Phase::Generating.is_busy());
        assert!(Phase::Speaking.is_busy());
    }

    #[test]
    fn interrupt_is_legal_only_while_generating_or_speaking() {
        assert!(!Phase::Idle.can_interrupt());
        assert!(!Phase::Listening.can_interrupt());
        assert!(!Phase::Sending.can_interrupt());
        assert!(Phase::Generating.can_interrupt());
        assert!(Phase::Speaking.can_interrupt());
    }

    #[test]
    fn default_phase_is_idle() {
        assert_eq!(Phase::default(), Phase::Idle);
    }

    #[test]
    fn speaking_status_mentions_interrupt() {
        assert!(Phase::Speaking.status().contains("interrupt"));
    }
}
