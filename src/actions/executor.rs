//! Directive execution against the live page.
//!
//! Directives run in textual order, each inside its own error boundary — a
//! failure executing directive *i* never prevents directive *i+1*.  Outcomes
//! surface as toast events; nothing here ever propagates an error to the
//! caller.
//!
//! # Control matching
//!
//! Click / scroll / highlight locate a control by a deterministic,
//! case-insensitive scoring rule over the page snapshot's visible buttons
//! followed by visible links:
//!
//! | rule                                  | score |
//! |---------------------------------------|-------|
//! | exact full-text match                 | 3     |
//! | label starts with the spoken text     | 2     |
//! | loose containment (either direction)  | 1     |
//!
//! Loose containment covers both raw substrings and word-set containment, so
//! "show the answer" still finds the "Show Answer" button.  The highest
//! score wins; ties break to the first control in document order.  A zero
//! score signals `ElementNotFound`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::events::{emit, toast, EngineEvent, EventSender, ToastKind};

use super::directive::ActionDirective;
use super::page::{ActionError, PageActions, PageIntrospector, RouteIndex};

// ---------------------------------------------------------------------------
// Label scoring
// ---------------------------------------------------------------------------

/// Score one control label against the spoken text.
fn match_score(label: &str, spoken: &str) -> u8 {
    let label = label.trim().to_lowercase();
    let spoken = spoken.trim().to_lowercase();
    if label.is_empty() || spoken.is_empty() {
        return 0;
    }

    if label == spoken {
        return 3;
    }
    if label.starts_with(&spoken) {
        return 2;
    }
    if label.contains(&spoken) || spoken.contains(&label) {
        return 1;
    }

    // Word-set containment: every word of the label appears in the spoken
    // text, or vice versa.
    let label_words: Vec<&str> = label.split_whitespace().collect();
    let spoken_words: Vec<&str> = spoken.split_whitespace().collect();
    let label_in_spoken = label_words.iter().all(|w| spoken_words.contains(w));
    let spoken_in_label = spoken_words.iter().all(|w| label_words.contains(w));
    if label_in_spoken || spoken_in_label {
        return 1;
    }

    0
}

/// Pick the best-matching control label, first occurrence winning ties.
pub(crate) fn best_label_match<'a, I>(controls: I, spoken: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, u8)> = None;
    for label in controls {
        let score = match_score(label, spoken);
        if score == 0 {
            continue;
        }
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((label, score)),
        }
    }
    best.map(|(label, _)| label)
}

// ---------------------------------------------------------------------------
// DirectiveExecutor
// ---------------------------------------------------------------------------

/// Executes parsed directives against the page seams.
pub struct DirectiveExecutor {
    page: Arc<dyn PageActions>,
    introspector: Arc<dyn PageIntrospector>,
    routes: RouteIndex,
    events: EventSender,
    dwell: Duration,
}

impl DirectiveExecutor {
    pub fn new(
        page: Arc<dyn PageActions>,
        introspector: Arc<dyn PageIntrospector>,
        routes: RouteIndex,
        events: EventSender,
        dwell: Duration,
    ) -> Self {
        Self {
            page,
            introspector,
            routes,
            events,
            dwell,
        }
    }

    /// Execute every directive in textual order, independently.
    pub async fn execute_all(&self, directives: &[ActionDirective]) {
        for directive in directives {
            match self.execute_one(directive).await {
                Ok(Some((title, detail))) => {
                    toast(&self.events, ToastKind::Success, &title, &detail);
                }
                Ok(None) => {}
                Err(e) => {
                    log::debug!("actions: directive failed: {e}");
                    let (title, detail) = warning_for(directive, &e);
                    toast(&self.events, ToastKind::Warning, &title, &detail);
                }
            }
        }
    }

    /// Run a single directive.  `Ok(Some(_))` carries the success toast;
    /// `Ok(None)` means the directive surfaces through another channel
    /// (suggestions).
    async fn execute_one(
        &self,
        directive: &ActionDirective,
    ) -> Result<Option<(String, String)>, ActionError> {
        match directive {
            ActionDirective::Navigate { path } => {
                if !self.routes.contains(path) {
                    return Err(ActionError::UnknownRoute(path.clone()));
                }
                self.page.navigate(path)?;
                Ok(Some(("Navigated".into(), path.clone())))
            }

            ActionDirective::Click { text } => {
                let label = self.locate(text)?;
                self.page.scroll_into_view(&label)?;
                self.page.emphasize(&label)?;
                sleep(self.dwell).await;
                let clicked = self.page.click(&label);
                // The emphasis comes off even when the click itself failed.
                self.page.clear_emphasis(&label);
                clicked?;
                Ok(Some(("Clicked".into(), label)))
            }

            ActionDirective::Scroll { hint } => {
                let label = self.point_at(hint).await?;
                Ok(Some(("Scrolled to".into(), label)))
            }

            ActionDirective::Highlight { hint } => {
                let label = self.point_at(hint).await?;
                Ok(Some(("Highlighted".into(), label)))
            }

            ActionDirective::Suggest { message } => {
                emit(
                    &self.events,
                    EngineEvent::Suggestion {
                        message: message.clone(),
                    },
                );
                Ok(None)
            }
        }
    }

    /// Resolve spoken text to a visible control label via the scoring rule.
    fn locate(&self, spoken: &str) -> Result<String, ActionError> {
        let snapshot = self.introspector.snapshot();
        let controls = snapshot
            .visible_buttons
            .iter()
            .chain(snapshot.visible_links.iter())
            .map(String::as_str);

        best_label_match(controls, spoken)
            .map(str::to_string)
            .ok_or_else(|| ActionError::ElementNotFound(spoken.to_string()))
    }

    /// Shared scroll-and-emphasize behaviour for scroll/highlight — the
    /// assistant "pointing at" content without acting on it.
    async fn point_at(&self, hint: &str) -> Result<String, ActionError> {
        let snapshot = self.introspector.snapshot();
        // Headings participate too: pointing often targets prose sections,
        // not controls.
        let candidates = snapshot
            .visible_buttons
            .iter()
            .chain(snapshot.visible_links.iter())
            .chain(snapshot.headings.iter())
            .map(String::as_str);

        let label = best_label_match(candidates, hint)
            .map(str::to_string)
            .ok_or_else(|| ActionError::ElementNotFound(hint.to_string()))?;

        self.page.scroll_into_view(&label)?;
        self.page.emphasize(&label)?;
        sleep(self.dwell).await;
        self.page.clear_emphasis(&label);
        Ok(label)
    }
}

fn warning_for(directive: &ActionDirective, error: &ActionError) -> (String, String) {
    let title = match (directive, error) {
        (ActionDirective::Navigate { .. }, _) => "Navigation failed",
        (ActionDirective::Click { .. }, ActionError::ElementNotFound(_)) => "Button not found",
        (ActionDirective::Click { .. }, _) => "Click failed",
        (ActionDirective::Scroll { .. }, _) | (ActionDirective::Highlight { .. }, _) => {
            "Couldn't find that on the page"
        }
        (ActionDirective::Suggest { .. }, _) => "Suggestion failed",
    };
    (title.to_string(), error.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
