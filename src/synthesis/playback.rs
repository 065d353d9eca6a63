//! Stop routine for the shared playback handle.
//!
//! A known failure mode: a "stop" call against on-device synthesis does not
//! take effect synchronously on every platform.  [`double_stop`] issues the
//! stop request twice — immediately, then once more after a short tick —
//! before playback is considered terminated.

use std::time::Duration;

use tokio::time::sleep;

/// Delay between the two stop requests.
const STOP_SETTLE: Duration = Duration::from_millis(10);

/// Issue `stop` twice with a settle tick in between.
pub async fn double_stop(stop: impl Fn()) {
    stop();
    sleep(STOP_SETTLE).await;
    stop();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
