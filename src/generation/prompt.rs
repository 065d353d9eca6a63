//! Prompt builder for the conversation assistant.
//!
//! [`PromptBuilder`] constructs the `(system, user)` chat-message pair sent
//! to every text provider.  The system message carries the assistant's
//! standing instructions, the directive syntax, the validated route list and
//! a snapshot of the current page; the user message carries the bounded
//! conversation history and the new transcript.

use crate::actions::page::{PageSnapshot, RouteIndex};
use crate::session::{Message, Role};

// ---------------------------------------------------------------------------
// System instruction
// ---------------------------------------------------------------------------

/// Standing instructions — spoken-reply style plus the directive vocabulary.
const SYSTEM_INSTRUCTION: &str = "\
You are a voice assistant embedded in a web application.
Your replies are spoken aloud, so keep them short and conversational.

You can act on the page by embedding directives in your reply.
Directive syntax (each on its own marker, anywhere in the reply):
[[navigate:/path]]      go to a route from the list below
[[click:Button label]]  press a visible control
[[scroll:Heading]]      bring content into view
[[highlight:Heading]]   point at content while you explain it
[[suggest:Message]]     offer a next step as a small notification

Rules:
1. Only navigate to routes listed under \"Available routes\".
2. Only click or highlight controls visible on the current page.
3. Never mention the directives in the spoken part of the reply.
4. One or two sentences of speech is almost always enough.";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the chat-message pair for a generation attempt.
///
/// # Example
/// ```rust
/// use voice_agent::generation::PromptBuilder;
/// use voice_agent::actions::page::{PageSnapshot, RouteIndex};
///
/// let builder = PromptBuilder::new("en");
/// let routes = RouteIndex::new(vec![("/".into(), "Home".into())]);
/// let (system, user) = builder.build_chat("go home", &[], &PageSnapshot::default(), &routes);
/// assert!(system.contains("voice assistant"));
/// assert!(user.contains("go home"));
/// ```
pub struct PromptBuilder {
    language: String,
}

impl PromptBuilder {
    /// Create a new builder for the given ISO-639-1 language code.
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    /// Build the `(system, user)` pair.
    ///
    /// System message structure (in order):
    /// 1. Standing instruction + directive syntax
    /// 2. Available routes (validated against the route index)
    /// 3. Current page snapshot (route, title, headings, controls)
    /// 4. Reply-language hint
    pub fn build_chat(
        &self,
        transcript: &str,
        history: &[Message],
        page: &PageSnapshot,
        routes: &RouteIndex,
    ) -> (String, String) {
        let mut system = String::with_capacity(2048);
        system.push_str(SYSTEM_INSTRUCTION);

        system.push_str("\n\nAvailable routes:\n");
        for (path, label) in routes.entries() {
            system.push_str(&format!("- {path} — {label}\n"));
        }

        system.push_str("\nCurrent page:\n");
        system.push_str(&format!("- route: {}\n", page.route));
        if !page.title.is_empty() {
            system.push_str(&format!("- title: {}\n", page.title));
        }
        if !page.headings.is_empty() {
            system.push_str(&format!("- headings: {}\n", page.headings.join(" | ")));
        }
        if !page.visible_buttons.is_empty() {
            system.push_str(&format!("- buttons: {}\n", page.visible_buttons.join(" | ")));
        }
        if !page.visible_links.is_empty() {
            system.push_str(&format!("- links: {}\n", page.visible_links.join(" | ")));
        }

        if self.language != "en" {
            system.push_str(&format!("\nReply in language: {}\n", self.language));
        }

        let mut user = String::with_capacity(1024);
        if !history.is_empty() {
            user.push_str("Conversation so far:\n");
            for message in history {
                let speaker = match message.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                };
                user.push_str(&format!("{speaker}: {}\n", message.display_text));
            }
            user.push('\n');
        }
        user.push_str(&format!("User said: {transcript}"));

        (system, user)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
