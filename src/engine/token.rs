//! Cancellation tokens for in-flight asynchronous operations.
//!
//! A [`TokenSource`] publishes a single monotonically increasing generation
//! id through a `tokio::sync::watch` channel.  Each [`CancelToken`] carries
//! the id it was issued with; the token is *current* while the published id
//! still equals its own.  Issuing a new token bumps the id, which atomically
//! invalidates every previously issued token — so at most one token is ever
//! current.
//!
//! Cancellation is cooperative: async work either races the provider future
//! against [`CancelToken::cancelled`] or checks [`CancelToken::is_current`]
//! at response time and discards stale results.

use tokio::sync::watch;

// ---------------------------------------------------------------------------
// CancelToken
// ---------------------------------------------------------------------------

/// An opaque correlation value tied to one in-flight operation.
#[derive(Debug, Clone)]
pub struct CancelToken {
    id: u64,
    rx: watch::Receiver<u64>,
}

impl CancelToken {
    /// Returns `true` while this token is still the current one.
    ///
    /// A stale token means the operation it correlates with was interrupted;
    /// its result must be discarded, never written into shared state.
    pub fn is_current(&self) -> bool {
        *self.rx.borrow() == self.id
    }

    /// Resolves once this token has been invalidated.
    ///
    /// Used with `tokio::select!` to abort in-flight network calls.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() != self.id {
                return;
            }
            // Sender dropped means the engine is shutting down — treat as
            // cancelled rather than pending forever.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TokenSource
// ---------------------------------------------------------------------------

/// Issues and invalidates [`CancelToken`]s.
///
/// ```
/// use voice_agent::engine::token::TokenSource;
///
/// let source = TokenSource::new();
/// let first = source.issue();
/// assert!(first.is_current());
///
/// // Issuing a new token invalidates the prior one.
/// let second = source.issue();
/// assert!(!first.is_current());
/// assert!(second.is_current());
/// ```
#[derive(Debug)]
pub struct TokenSource {
    tx: watch::Sender<u64>,
}

impl TokenSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Issue a fresh token.  Any previously issued token becomes stale in the
    /// same atomic update.
    pub fn issue(&self) -> CancelToken {
        let mut id = 0;
        self.tx.send_modify(|v| {
            *v += 1;
            id = *v;
        });
        CancelToken {
            id,
            rx: self.tx.subscribe(),
        }
    }

    /// Invalidate the current token without issuing a new one.
    ///
    /// This is the first step of the interrupt transition.
    pub fn invalidate(&self) {
        self.tx.send_modify(|v| *v += 1);
    }
}

impl Default for TokenSource {
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
    use std::time::Duration;

    #[test]
    fn fresh_token_is_current() {
        let source = TokenSource::new();
        let token = source.issue();
        assert!(token.is_current());
    }

    /// Issuing a new token always invalidates the prior one, so at most one
    /// token is current at any instant.
    #[test]
    fn issuing_invalidates_prior_token() {
        let source = TokenSource::new();
        let first = source.issue();
        let second = source.issue();
        let third = source.issue();

        assert!(!first.is_current());
        assert!(!second.is_current());
        assert!(third.is_current());
    }

    #[test]
    fn invalidate_stales_current_token_without_issuing() {
        let source = TokenSource::new();
        let token = source.issue();
        source.invalidate();
        assert!(!token.is_current());
    }

    #[tokio::test]
    async fn cancelled_resolves_after_invalidate() {
        let source = TokenSource::new();
        let token = source.issue();

        let waiter = tokio::spawn(async move { token.cancelled().await });
        source.invalidate();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancelled() should resolve promptly")
            .expect("waiter task should not panic");
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_for_stale_token() {
        let source = TokenSource::new();
        let token = source.issue();
        source.issue(); // stales `token`

        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already-stale token must resolve at once");
    }

    #[tokio::test]
    async fn cancelled_pends_while_current() {
        let source = TokenSource::new();
        let token = source.issue();

        let result =
            tokio::time::timeout(Duration::from_millis(50), token.cancelled()).await;
        assert!(result.is_err(), "current token must not report cancellation");
    }

    #[tokio::test]
    async fn dropped_source_counts_as_cancelled() {
        let source = TokenSource::new();
        let token = source.issue();
        drop(source);

        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("dropped source should resolve cancelled()");
    }
}
