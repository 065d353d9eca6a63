//! Outbound event stream consumed by UI collaborators.
//!
//! The engine pushes [`EngineEvent`]s onto an unbounded `tokio::sync::mpsc`
//! channel; a chat surface renders transcripts and replies, a status
//! indicator renders phase changes, and a notification widget renders toasts
//! and suggestions.  The engine never blocks on the consumer.

use tokio::sync::mpsc;

use crate::engine::Phase;

// ---------------------------------------------------------------------------
// ToastKind
// ---------------------------------------------------------------------------

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// EngineEvent
// ---------------------------------------------------------------------------

/// Everything the engine reports to the outside world.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Live recognition text — `is_final` distinguishes interim updates from
    /// end-of-utterance results.
    Transcript { text: String, is_final: bool },

    /// Phase change plus the human-readable status line for the indicator UI.
    Phase { phase: Phase, status: String },

    /// The assistant reply's display text (directives already stripped),
    /// ready to render in the chat surface.
    Reply { text: String },

    /// Transient notification about a directive outcome or a non-fatal
    /// failure (e.g. "Clicked: Next Question", "Button not found: …").
    Toast {
        kind: ToastKind,
        title: String,
        detail: String,
    },

    /// A `suggest` directive — shown as a lightweight notification, never as
    /// inline chat text.
    Suggestion { message: String },
}

/// Sending half of the engine's event stream.
pub type EventSender = mpsc::UnboundedSender<EngineEvent>;

/// Receiving half, handed to the UI collaborator.
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Create the event channel pair.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

// ---------------------------------------------------------------------------
// Emit helpers
// ---------------------------------------------------------------------------

/// Fire-and-forget send; a closed receiver just means the UI went away.
pub(crate) fn emit(tx: &EventSender, event: EngineEvent) {
    let _ = tx.send(event);
}

pub(crate) fn toast(tx: &EventSender, kind: ToastKind, title: &str, detail: &str) {
    emit(
        tx,
        EngineEvent::Toast {
            kind,
            title: title.to_string(),
            detail: detail.to_string(),
        },
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
