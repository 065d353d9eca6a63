//! Page seams: the introspection snapshot, the live-page action surface and
//! the static route index.
//!
//! The engine never touches a document model directly.  An external
//! page-introspection collaborator supplies [`PageSnapshot`]s; an external
//! page-action collaborator implements [`PageActions`].  Both are injected
//! as trait objects at engine construction.

use thiserror::Error;

// ---------------------------------------------------------------------------
// ActionError
// ---------------------------------------------------------------------------

/// Failures while executing a page directive.
///
/// Every variant is recovered locally per-directive and surfaced as a
/// warning toast; a failing directive never affects its neighbours or the
/// displayed reply text.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// No visible control scored above the match threshold.
    #[error("no control matching \"{0}\"")]
    ElementNotFound(String),

    /// A navigate directive named a route missing from the route index.
    #[error("unknown route \"{0}\"")]
    UnknownRoute(String),

    /// The page collaborator rejected the operation.
    #[error("page action failed: {0}")]
    Page(String),
}

// ---------------------------------------------------------------------------
// PageSnapshot
// ---------------------------------------------------------------------------

/// What the page-introspection collaborator can see right now.
///
/// Used to ground generation prompts and to locate controls for click /
/// scroll / highlight directives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSnapshot {
    /// Current route path (e.g. `"/quiz"`).
    pub route: String,
    /// Document title.
    pub title: String,
    /// Visible heading texts, in document order.
    pub headings: Vec<String>,
    /// Visible link labels, in document order.
    pub visible_links: Vec<String>,
    /// Visible button labels, in document order.
    pub visible_buttons: Vec<String>,
}

/// Supplies [`PageSnapshot`]s on demand.
pub trait PageIntrospector: Send + Sync {
    fn snapshot(&self) -> PageSnapshot;
}

// ---------------------------------------------------------------------------
// PageActions
// ---------------------------------------------------------------------------

/// The live-page effect surface.
///
/// Labels passed to `scroll_into_view` / `emphasize` / `click` are exact
/// control labels previously observed in a snapshot — the scoring that maps
/// spoken text onto labels happens in the executor, not here.
pub trait PageActions: Send + Sync {
    /// Change the current route.
    fn navigate(&self, path: &str) -> Result<(), ActionError>;

    /// Smooth-scroll the labelled control into view.
    fn scroll_into_view(&self, label: &str) -> Result<(), ActionError>;

    /// Apply the transient visual emphasis (outline/glow).
    fn emphasize(&self, label: &str) -> Result<(), ActionError>;

    /// Remove the emphasis.  Infallible: a vanished element needs no cleanup.
    fn clear_emphasis(&self, label: &str);

    /// Programmatically invoke the control's click behaviour.
    fn click(&self, label: &str) -> Result<(), ActionError>;
}

// Compile-time assertions: the page seams must stay object-safe.
const _: fn() = || {
    fn _assert_actions(_: Box<dyn PageActions>) {}
    fn _assert_introspector(_: Box<dyn PageIntrospector>) {}
};

// ---------------------------------------------------------------------------
// RouteIndex
// ---------------------------------------------------------------------------

/// Static sitemap lookup: which routes actually exist.
///
/// Consulted by the prompt builder (so the model is only told about real
/// routes) and by the executor (so a hallucinated navigate target is dropped
/// with a warning instead of sent to the page).
#[derive(Debug, Clone, Default)]
pub struct RouteIndex {
    entries: Vec<(String, String)>,
}

impl RouteIndex {
    /// Build an index from `(path, label)` pairs.
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// `(path, label)` pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, l)| (p.as_str(), l.as_str()))
    }

    /// Whether `path` names a real route.  Trailing slashes are ignored so
    /// `/quiz` and `/quiz/` resolve identically.
    pub fn contains(&self, path: &str) -> bool {
        let normalized = Self::normalize(path);
        self.entries
            .iter()
            .any(|(p, _)| Self::normalize(p) == normalized)
    }

    fn normalize(path: &str) -> &str {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            "/"
        } else {
            trimmed
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
