//! Per-job iteration pacing.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Token bucket with capacity one: the first acquisition is immediate, every
/// later one waits until a full interval has passed since the previous
/// acquisition.
///
/// This bounds how often a job polls the remote systems regardless of how
/// fast local operations complete. It is not a retry backoff: failed
/// iterations wait for the next token exactly like successful ones, so the
/// effect is a fixed minimum spacing between all iterations.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_ready: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_ready: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next token. Callers that need cancellation race this
    /// against their shutdown signal; the token is only consumed when the
    /// future completes.
    pub async fn acquire(&mut self) {
        if let Some(at) = self.next_ready {
            sleep_until(at).await;
        }
        self.next_ready = Some(Instant::now() + self.interval);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let mut limiter = RateLimiter::new(Duration::from_secs(60));
        let started = Instant::now();
        limiter.acquire().await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn acquisitions_are_spaced_by_the_interval() {
        let mut limiter = RateLimiter::new(Duration::from_secs(60));
        let started = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        // 1 immediate + 3 spaced.
        assert_eq!(started.elapsed(), Duration::from_secs(180));
    }

    #[tokio::test(start_paused = true)]
    async fn iteration_count_is_bounded_by_the_window() {
        let interval = Duration::from_secs(60);
        let window = Duration::from_secs(299);
        let mut limiter = RateLimiter::new(interval);

        let deadline = Instant::now() + window;
        let mut iterations: u32 = 0;
        while Instant::now() < deadline {
            tokio::select! {
                _ = limiter.acquire() => iterations += 1,
                _ = sleep_until(deadline) => break,
            }
        }

        let bound = (window.as_secs() / interval.as_secs() + 1) as u32;
        assert!(iterations <= bound, "{iterations} iterations > bound {bound}");
        assert_eq!(iterations, 5, "one immediate plus four spaced tokens");
    }

    #[tokio::test(start_paused = true)]
    async fn fast_iterations_do_not_accumulate_tokens() {
        // Capacity is one: a long gap between acquisitions never earns a
        // burst afterwards.
        let mut limiter = RateLimiter::new(Duration::from_secs(60));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(600)).await;

        let started = Instant::now();
        limiter.acquire().await; // overdue, immediate
        limiter.acquire().await; // must still wait a full interval
        assert_eq!(started.elapsed(), Duration::from_secs(60));
    }
}
