//! Processing-delay strategy for the server-side transform step.
//!
//! The reference behavior inserts a bounded random pause before every
//! reply, modeling variable processing latency. The strategy is a value
//! passed into each handler so tests can run with no delay at all
//! without touching handler logic.

use rand::Rng;
use std::time::Duration;

/// How long a handler pauses between transforming a payload and
/// enqueueing the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingDelay {
    /// No artificial pause. The deterministic choice for tests.
    None,
    /// Pause for a duration drawn uniformly from `min_ms..=max_ms`.
    Uniform { min_ms: u64, max_ms: u64 },
}

impl ProcessingDelay {
    /// Suspend the calling task for one drawn interval.
    pub async fn wait(&self) {
        match *self {
            Self::None => {}
            Self::Uniform { min_ms, max_ms } => {
                // The rng handle is not held across the await point.
                let ms = rand::thread_rng().gen_range(min_ms..=max_ms);
                if ms > 0 {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_none_completes_immediately() {
        let result =
            tokio::time::timeout(Duration::from_millis(50), ProcessingDelay::None.wait()).await;
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_uniform_waits_the_drawn_interval() {
        let start = tokio::time::Instant::now();
        ProcessingDelay::Uniform {
            min_ms: 50,
            max_ms: 50,
        }
        .wait()
        .await;
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }
}
