use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::time::{sleep, Instant};

use crate::core::error::FalconError;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_REQUESTS: u32 = 60;

#[derive(Debug, Clone, Copy)]
struct RateLimitState {
    last_request_at: Option<Instant>,
    count_in_window: u32,
    window_start: Instant,
}

impl RateLimitState {
    fn new(now: Instant) -> Self {
        Self {
            last_request_at: None,
            count_in_window: 0,
            window_start: now,
        }
    }
}

/// Per-source throttle: minimum spacing between calls plus a rolling quota.
///
/// Each source has its own lock, held across the spacing delay, so callers of
/// one source queue behind each other while other sources proceed.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    states: Mutex<HashMap<String, Arc<tokio::sync::Mutex<RateLimitState>>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_REQUESTS)
    }
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve one request slot for `source`.
    ///
    /// Fails immediately with [`FalconError::RateLimitExceeded`] when the quota
    /// for the current window is used up; otherwise sleeps until
    /// `min_interval` has passed since the previous request.
    pub async fn acquire(
        &self,
        source: &str,
        min_interval: Option<Duration>,
    ) -> Result<(), FalconError> {
        let slot = self.slot(source);
        let mut state = slot.lock().await;

        let now = Instant::now();
        if now.duration_since(state.window_start) > self.window {
            state.count_in_window = 0;
            state.window_start = now;
        }

        if state.count_in_window >= self.max_requests {
            let elapsed = now.duration_since(state.window_start);
            let wait = self.window.saturating_sub(elapsed);
            tracing::warn!(source, wait_ms = wait.as_millis() as u64, "rate limit exceeded");
            return Err(FalconError::RateLimitExceeded {
                provider: source.to_string(),
                wait_ms: wait.as_millis() as u64,
            });
        }

        if let (Some(interval), Some(last)) = (min_interval, state.last_request_at) {
            let since_last = now.duration_since(last);
            if since_last < interval {
                let wait = interval - since_last;
                tracing::debug!(source, wait_ms = wait.as_millis() as u64, "spacing request");
                sleep(wait).await;
            }
        }

        state.last_request_at = Some(Instant::now());
        state.count_in_window += 1;
        Ok(())
    }

    /// Forget throttle state for one source, or for all of them.
    pub fn reset(&self, source: Option<&str>) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        match source {
            Some(name) => {
                states.remove(name);
            }
            None => states.clear(),
        }
    }

    /// Requests recorded for `source` in the current window.
    pub async fn requests_in_window(&self, source: &str) -> u32 {
        let slot = {
            let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
            states.get(source).cloned()
        };
        match slot {
            Some(slot) => slot.lock().await.count_in_window,
            None => 0,
        }
    }

    fn slot(&self, source: &str) -> Arc<tokio::sync::Mutex<RateLimitState>> {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states
            .entry(source.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(RateLimitState::new(Instant::now()))))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sixty_first_call_in_window_fails() {
        let limiter = RateLimiter::default();
        for _ in 0..60 {
            limiter.acquire("hibp", None).await.unwrap();
        }
        let err = limiter.acquire("hibp", None).await.unwrap_err();
        match err {
            FalconError::RateLimitExceeded { provider, wait_ms } => {
                assert_eq!(provider, "hibp");
                assert!(wait_ms <= 60_000);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(limiter.requests_in_window("hibp").await, 60);
    }

    #[tokio::test]
    async fn sources_have_independent_quotas() {
        let limiter = RateLimiter::new(DEFAULT_WINDOW, 2);
        limiter.acquire("ipinfo", None).await.unwrap();
        limiter.acquire("ipinfo", None).await.unwrap();
        assert!(limiter.acquire("ipinfo", None).await.is_err());
        assert!(limiter.acquire("abuseipdb", None).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn window_rolls_over() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        limiter.acquire("shodan", None).await.unwrap();
        assert!(limiter.acquire("shodan", None).await.is_err());
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.acquire("shodan", None).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn spacing_delays_second_call() {
        let limiter = RateLimiter::default();
        let interval = Some(Duration::from_millis(1_500));
        let start = Instant::now();
        limiter.acquire("hibp", interval).await.unwrap();
        limiter.acquire("hibp", interval).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1_500));
    }

    #[tokio::test]
    async fn reset_clears_state() {
        let limiter = RateLimiter::new(DEFAULT_WINDOW, 1);
        limiter.acquire("emailrep", None).await.unwrap();
        limiter.reset(Some("emailrep"));
        assert!(limiter.acquire("emailrep", None).await.is_ok());
        limiter.reset(None);
        assert_eq!(limiter.requests_in_window("emailrep").await, 0);
    }
}
