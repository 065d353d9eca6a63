//! Deterministic local fallback replies.
//!
//! [`LocalReplies`] produces a canned reply from simple keyword rules when
//! every remote provider fails or none is configured.  The engine must
//! always produce *some* reply — this module is why `generate` never fails
//! the turn outright.

use crate::actions::page::PageSnapshot;

// ---------------------------------------------------------------------------
// Internal types
// ---------------------------------------------------------------------------

struct ReplyRule {
    keywords: &'static [&'static str],
    reply: &'static str,
}

// ---------------------------------------------------------------------------
// Static rules
// ---------------------------------------------------------------------------

/// Checked in order; the first rule with a keyword hit wins.
static RULES: &[ReplyRule] = &[
    ReplyRule {
        keywords: &["hello", "hi ", "hey"],
        reply: "Hello! Ask me about this page, or tell me where you want to go.",
    },
    ReplyRule {
        keywords: &["help", "what can you do", "how do i"],
        reply: "I can read this page with you, click buttons, and take you to \
                other pages. Try saying where you want to go.",
    },
    ReplyRule {
        keywords: &["thank", "thanks"],
        reply: "You're welcome!",
    },
    ReplyRule {
        keywords: &["bye", "goodbye", "stop listening"],
        reply: "Goodbye! Turn voice mode off whenever you're done.",
    },
];

const WHERE_KEYWORDS: &[&str] = &["where am i", "what page", "which page"];

const DEFAULT_REPLY: &str =
    "I couldn't reach the assistant service just now, so I can't answer that \
     properly. Please try again in a moment.";

// ---------------------------------------------------------------------------
// LocalReplies
// ---------------------------------------------------------------------------

/// Keyword-triggered canned replies — the terminal generation fallback.
///
/// Deterministic: the same transcript and page always produce the same
/// reply, and the reply is never empty.
///
/// # Example
/// ```rust
/// use voice_agent::generation::LocalReplies;
/// use voice_agent::actions::page::PageSnapshot;
///
/// let fallback = LocalReplies::new();
/// let reply = fallback.reply_for("hello there", &PageSnapshot::default());
/// assert!(reply.contains("Hello"));
/// ```
pub struct LocalReplies;

impl LocalReplies {
    pub fn new() -> Self {
        Self
    }

    /// Produce a reply for `transcript`.  Always non-empty.
    pub fn reply_for(&self, transcript: &str, page: &PageSnapshot) -> String {
        let lower = transcript.to_lowercase();

        // Page-aware rule first: "where am I" can be answered locally.
        if WHERE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            return if page.title.is_empty() {
                format!("You're on {}.", page.route)
            } else {
                format!("You're on the {} page.", page.title)
            };
        }

        for rule in RULES {
            if rule.keywords.iter().any(|kw| lower.contains(kw)) {
                return rule.reply.to_string();
            }
        }

        DEFAULT_REPLY.to_string()
    }
}

impl Default for LocalReplies {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageSnapshot {
        PageSnapshot {
            route: "/quiz".into(),
            title: "Practice Quiz".into(),
            ..PageSnapshot::default()
        }
    }

    #[test]
    fn greeting_triggers_greeting_rule() {
        let fallback = LocalReplies::new();
        assert!(fallback.reply_for("hello there", &page()).contains("Hello"));
    }

    #[test]
    fn help_triggers_capability_rule() {
        let fallback = LocalReplies::new();
        let reply = fallback.reply_for("can you help me", &page());
        assert!(reply.contains("click buttons"));
    }

    #[test]
    fn where_am_i_uses_the_page_title() {
        let fallback = LocalReplies::new();
        let reply = fallback.reply_for("where am I right now", &page());
        assert!(reply.contains("Practice Quiz"));
    }

    #[test]
    fn where_am_i_without_title_uses_the_route() {
        let fallback = LocalReplies::new();
        let bare = PageSnapshot {
            route: "/pricing".into(),
            ..PageSnapshot::default()
        };
        let reply = fallback.reply_for("what page is this", &bare);
        assert!(reply.contains("/pricing"));
    }

    /// Every transcript — including gibberish — yields a non-empty reply.
    #[test]
    fn unmatched_transcript_gets_the_default_reply() {
        let fallback = LocalReplies::new();
        let reply = fallback.reply_for("flibbertigibbet quantum marmalade", &page());
        assert!(!reply.is_empty());
        assert_eq!(reply, DEFAULT_REPLY);
    }

    #[test]
    fn replies_are_deterministic() {
        let fallback = LocalReplies::new();
        let a = fallback.reply_for("hello", &page());
        let b = fallback.reply_for("hello", &page());
        assert_eq!(a, b);
    }

    #[test]
    fn replies_never_contain_directive_markers() {
        let fallback = LocalReplies::new();
        for transcript in ["hello", "help", "thanks", "bye", "where am i", "xyz"] {
            assert!(!fallback.reply_for(transcript, &page()).contains("[["));
        }
    }
}
