//! Session persistence — a key-value store keyed by session id.
//!
//! [`JsonSessionStore`] writes each session as `<sessions-dir>/<id>.json`.
//! Load returns an empty session when no file exists yet so the engine never
//! special-cases a first run.  Failures to persist are surfaced to the caller
//! but treated as non-fatal by the engine (the in-memory transcript is the
//! source of truth for the current surface instance).

use std::path::PathBuf;

use anyhow::Result;

use super::ConversationSession;

// ---------------------------------------------------------------------------
// SessionStore trait
// ---------------------------------------------------------------------------

/// Object-safe persistence seam for conversation sessions.
pub trait SessionStore: Send + Sync {
    /// Load the session for `id`, or a fresh empty one when nothing is stored.
    fn load(&self, id: &str) -> Result<ConversationSession>;

    /// Persist `session`, overwriting any previous snapshot.
    fn save(&self, session: &ConversationSession) -> Result<()>;

    /// Remove any stored snapshot for `id`.
    fn remove(&self, id: &str) -> Result<()>;
}

// Compile-time assertion: Box<dyn SessionStore> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SessionStore>) {}
};

// ---------------------------------------------------------------------------
// JsonSessionStore
// ---------------------------------------------------------------------------

/// File-backed store: one pretty-printed JSON document per session id.
#[derive(Debug, Clone)]
pub struct JsonSessionStore {
    dir: PathBuf,
}

impl JsonSessionStore {
    /// Store sessions under `dir` (created lazily on first save).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        // Session ids come from config, not user speech; still, keep the
        // filename to a safe subset.
        let safe: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl SessionStore for JsonSessionStore {
    fn load(&self, id: &str) -> Result<ConversationSession> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(ConversationSession::new(id));
        }
        let content = std::fs::read_to_string(&path)?;
        let session: ConversationSession = serde_json::from_str(&content)?;
        Ok(session)
    }

    fn save(&self, session: &ConversationSession) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&session.id);
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<()> {
        let path = self.path_for(id);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
