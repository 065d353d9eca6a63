//! Directive parsing — extracts structured page commands from reply text.
//!
//! Directives are embedded as `[[kind:payload]]` markers anywhere in the
//! generated text.  Parsing strips every balanced marker to produce the
//! display text and yields the well-formed directives in textual order.
//! A marker with an unknown kind or an empty payload is logged and dropped —
//! it must never block display of the surrounding text.
//!
//! The marker syntax lives entirely in this module so it stays swappable.

// ---------------------------------------------------------------------------
// ActionDirective
// ---------------------------------------------------------------------------

/// A structured action command parsed out of reply text.  Transient — never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionDirective {
    /// Change the current route.
    Navigate { path: String },
    /// Click the control whose visible label best matches `text`.
    Click { text: String },
    /// Scroll the best-matching content into view.
    Scroll { hint: String },
    /// Scroll to and emphasize content without clicking it.
    Highlight { hint: String },
    /// Surface a lightweight suggestion notification.
    Suggest { message: String },
}

// ---------------------------------------------------------------------------
// ParsedReply
// ---------------------------------------------------------------------------

/// Result of parsing one raw reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    /// The reply with every marker removed, trimmed.
    pub display_text: String,
    /// Well-formed directives in textual order.
    pub directives: Vec<ActionDirective>,
}

// ---------------------------------------------------------------------------
// parse_reply
// ---------------------------------------------------------------------------

const OPEN: &str = "[[";
const CLOSE: &str = "]]";

/// Split `raw` into display text and directives.
///
/// ```
/// use voice_agent::actions::{parse_reply, ActionDirective};
///
/// let parsed = parse_reply("Sure. [[click:Next Question]] Moving on.");
/// assert_eq!(parsed.display_text, "Sure.  Moving on.");
/// assert_eq!(
///     parsed.directives,
///     vec![ActionDirective::Click { text: "Next Question".into() }]
/// );
/// ```
pub fn parse_reply(raw: &str) -> ParsedReply {
    let mut display = String::with_capacity(raw.len());
    let mut directives = Vec::new();
    let mut rest = raw;

    loop {
        let Some(open) = rest.find(OPEN) else {
            display.push_str(rest);
            break;
        };
        let Some(close_rel) = rest[open + OPEN.len()..].find(CLOSE) else {
            // Unbalanced `[[` — not a marker, keep as prose.
            display.push_str(rest);
            break;
        };

        display.push_str(&rest[..open]);

        let inner = &rest[open + OPEN.len()..open + OPEN.len() + close_rel];
        match parse_marker(inner) {
            Some(directive) => directives.push(directive),
            None => log::debug!("directive: dropping malformed marker {inner:?}"),
        }

        rest = &rest[open + OPEN.len() + close_rel + CLOSE.len()..];
    }

    ParsedReply {
        display_text: display.trim().to_string(),
        directives,
    }
}

/// Parse the inside of one balanced marker into a directive, or `None` when
/// the payload is malformed.
fn parse_marker(inner: &str) -> Option<ActionDirective> {
    let (kind, payload) = inner.split_once(':')?;
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    match kind.trim().to_ascii_lowercase().as_str() {
        "navigate" => Some(ActionDirective::Navigate {
            path: payload.to_string(),
        }),
        "click" => Some(ActionDirective::Click {
            text: payload.to_string(),
        }),
        "scroll" => Some(ActionDirective::Scroll {
            hint: payload.to_string(),
        }),
        "highlight" => Some(ActionDirective::Highlight {
            hint: payload.to_string(),
        }),
        "suggest" => Some(ActionDirective::Suggest {
            message: payload.to_string(),
        }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
