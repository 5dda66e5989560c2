use std::time::Duration;

use async_trait::async_trait;

/// Source of delays for debounced and deferred work.
///
/// Production code uses `TokioTimer`; tests can pause Tokio's clock or
/// substitute a timer they release by hand.
#[async_trait]
pub trait Timer: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// `Timer` backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_follows_paused_clock() {
        let start = tokio::time::Instant::now();
        TokioTimer.sleep(Duration::from_secs(5)).await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }
}
