//! Fixed-window admission control.
//!
//! Each client key gets `limit` requests per `window`. Budgets reset lazily
//! on the first request after the window has passed; a periodic sweep drops
//! records idle beyond twice the window so the table stays bounded under
//! client churn (many distinct source addresses).

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Duration as StdDuration,
};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::clock::Clock;

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    /// Whether the request is admitted.
    pub allowed: bool,
    /// Budget left in the current window after this decision.
    pub remaining: u32,
    /// When the current window ends and the budget restores.
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug)]
struct ClientBudget {
    remaining: u32,
    window_start: DateTime<Utc>,
}

/// Per-client fixed-window rate limiter.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    clients: RwLock<HashMap<String, ClientBudget>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: StdDuration, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            window: Duration::from_std(window).unwrap_or_else(|_| Duration::seconds(60)),
            clients: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Configured budget per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Check and consume budget for `client_key`.
    ///
    /// The decrement happens under the same lock as the decision, before any
    /// downstream work, so a request cancelled later can never leave the
    /// budget inconsistent.
    pub fn allow(&self, client_key: &str) -> Decision {
        let now = self.clock.now();
        let mut clients = self.clients.write().expect("rate limit table poisoned");

        let budget = clients
            .entry(client_key.to_string())
            .or_insert_with(|| ClientBudget {
                remaining: self.limit,
                window_start: now,
            });

        // Lazy reset: the whole budget restores at once, never partially.
        if now - budget.window_start > self.window {
            budget.remaining = self.limit;
            budget.window_start = now;
        }

        let reset_at = budget.window_start + self.window;
        if budget.remaining > 0 {
            budget.remaining -= 1;
            Decision {
                allowed: true,
                remaining: budget.remaining,
                reset_at,
            }
        } else {
            Decision {
                allowed: false,
                remaining: 0,
                reset_at,
            }
        }
    }

    /// Drop records untouched for more than twice the window. Returns the
    /// number of records removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut clients = self.clients.write().expect("rate limit table poisoned");
        let before = clients.len();
        clients.retain(|_, budget| now - budget.window_start <= self.window * 2);
        before - clients.len()
    }

    /// Spawn the periodic sweep task. The interval equals the window, so
    /// sweep contention on the table lock stays infrequent.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        let period = limiter
            .window
            .to_std()
            .unwrap_or(StdDuration::from_secs(60));
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            // The first tick completes immediately; skip it.
            tick.tick().await;
            loop {
                tick.tick().await;
                let removed = limiter.sweep();
                if removed > 0 {
                    debug!(removed, "swept idle rate-limit clients");
                }
            }
        })
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.clients.read().expect("rate limit table poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    const WINDOW: StdDuration = StdDuration::from_secs(60);

    fn limiter(limit: u32) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        (RateLimiter::new(limit, WINDOW, clock.clone()), clock)
    }

    #[test]
    fn admits_up_to_limit_then_rejects() {
        let (limiter, _clock) = limiter(5);

        for expected_remaining in (0..5).rev() {
            let decision = limiter.allow("10.0.0.1");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let rejected = limiter.allow("10.0.0.1");
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
    }

    #[test]
    fn reset_at_is_window_start_plus_window() {
        let (limiter, clock) = limiter(2);
        let start = clock.now();

        let first = limiter.allow("10.0.0.1");
        assert_eq!(first.reset_at, start + Duration::seconds(60));

        // Later requests in the same window share the same reset point.
        clock.advance(Duration::seconds(30));
        let second = limiter.allow("10.0.0.1");
        assert_eq!(second.reset_at, start + Duration::seconds(60));
    }

    #[test]
    fn budget_fully_restores_after_window() {
        let (limiter, clock) = limiter(3);

        for _ in 0..3 {
            assert!(limiter.allow("10.0.0.1").allowed);
        }
        assert!(!limiter.allow("10.0.0.1").allowed);

        clock.advance(Duration::seconds(61));
        let decision = limiter.allow("10.0.0.1");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2, "reset restores the full budget");
    }

    #[test]
    fn budget_does_not_restore_within_window() {
        let (limiter, clock) = limiter(1);

        assert!(limiter.allow("10.0.0.1").allowed);
        clock.advance(Duration::seconds(59));
        assert!(!limiter.allow("10.0.0.1").allowed);
    }

    #[test]
    fn distinct_keys_have_independent_budgets() {
        let (limiter, _clock) = limiter(2);

        assert!(limiter.allow("10.0.0.1").allowed);
        assert!(limiter.allow("10.0.0.1").allowed);
        assert!(!limiter.allow("10.0.0.1").allowed);

        let other = limiter.allow("10.0.0.2");
        assert!(other.allowed, "exhausting one key must not affect another");
        assert_eq!(other.remaining, 1);
    }

    #[test]
    fn sweep_drops_only_idle_clients() {
        let (limiter, clock) = limiter(5);

        limiter.allow("stale");
        clock.advance(Duration::seconds(90));
        limiter.allow("fresh");
        assert_eq!(limiter.tracked_clients(), 2);

        // "stale" is now 121s idle (> 2x window), "fresh" only 31s.
        clock.advance(Duration::seconds(31));
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_clients(), 1);

        // A swept client starts over with a full window.
        let decision = limiter.allow("stale");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }
}
