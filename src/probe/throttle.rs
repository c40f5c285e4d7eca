use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Returned by [`RateLimiter::acquire`] once the limiter has shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterClosed;

/// Global token bucket shared by all workers.
///
/// One token is added every `1 / per_second` seconds, up to `burst` tokens.
/// The bucket starts empty and the first token arrives immediately.
pub struct RateLimiter {
    tokens: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl RateLimiter {
    /// `None` when `per_second` is 0 (unlimited). Must be called inside a tokio runtime.
    pub fn new(per_second: u32, burst: u32, cancel: &CancellationToken) -> Option<Self> {
        if per_second == 0 {
            return None;
        }
        let burst = burst.max(1) as usize;
        let period = Duration::from_secs_f64(1.0 / per_second as f64);
        let tokens = Arc::new(Semaphore::new(0));
        let shutdown = cancel.child_token();

        let refill_tokens = tokens.clone();
        let refill_shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = refill_shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        if refill_tokens.available_permits() < burst {
                            refill_tokens.add_permits(1);
                        }
                    }
                }
            }
            refill_tokens.close();
        });

        tracing::debug!(per_second, burst, "rate limiter started");
        Some(Self { tokens, shutdown })
    }

    /// Wait for a token. Fails once the limiter is shut down.
    pub async fn acquire(&self) -> Result<(), LimiterClosed> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(LimiterClosed),
            permit = self.tokens.acquire() => match permit {
                Ok(permit) => {
                    permit.forget();
                    Ok(())
                }
                Err(_) => Err(LimiterClosed),
            },
        }
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_unlimited_is_none() {
        assert!(RateLimiter::new(0, 1, &CancellationToken::new()).is_none());
    }

    #[tokio::test]
    async fn test_rate_is_enforced() {
        let limiter = RateLimiter::new(20, 1, &CancellationToken::new()).unwrap();
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await.unwrap();
        }
        // 5 tokens at 20/s: the first is immediate, then 4 periods of 50ms
        assert!(start.elapsed() >= Duration::from_millis(190));
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let limiter = Arc::new(RateLimiter::new(50, 1, &CancellationToken::new()).unwrap());
        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..3 {
                    limiter.acquire().await.unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        // 12 tokens at 50/s across all tasks
        assert!(start.elapsed() >= Duration::from_millis(210));
    }

    #[tokio::test]
    async fn test_cancel_unblocks_waiters() {
        let cancel = CancellationToken::new();
        let limiter = Arc::new(RateLimiter::new(1, 1, &cancel).unwrap());
        limiter.acquire().await.unwrap();

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        assert_eq!(waiter.await.unwrap(), Err(LimiterClosed));
    }
}
