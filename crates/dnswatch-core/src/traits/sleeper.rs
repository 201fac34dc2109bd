use async_trait::async_trait;
use std::time::Duration;

/// Clock seam for the poll loop
///
/// Production uses [`crate::schedule::TokioSleeper`]. Tests inject a
/// recording implementation to drive many cycles without wall-clock delay.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}
