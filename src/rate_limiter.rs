//! Fixed-window request admission.
//!
//! Each client key gets a counter on its first request. A deferred expiry
//! removes the counter once the window elapses, whatever the key does in the
//! meantime. Bursts straddling two windows may admit up to twice the limit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

use crate::rate_limit_config::RateLimitConfig;

/// Admission control keyed by client identity
pub trait RateLimiter: Send + Sync {
    /// Returns whether the request is admitted and, when it is not, how long
    /// the client should wait before retrying.
    fn allow(&self, key: &str) -> (bool, Duration);

    /// Whether requests are being counted at all
    fn is_enabled(&self) -> bool;
}

#[derive(Clone)]
pub struct FixedWindowRateLimiter {
    config: Arc<RateLimitConfig>,
    state: Arc<Mutex<WindowState>>,
}

#[derive(Default)]
struct WindowState {
    clients: HashMap<String, ClientWindow>,
    next_generation: u64,
}

/// Counter for one key within one window
struct ClientWindow {
    count: u64,
    generation: u64,
}

impl FixedWindowRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(WindowState::default())),
        }
    }

    /// Requests counted for `key` in its current window; 0 when absent.
    pub fn current_count(&self, key: &str) -> u64 {
        lock(&self.state)
            .clients
            .get(key)
            .map_or(0, |client| client.count)
    }

    /// Number of keys with an open window
    pub fn tracked_clients(&self) -> usize {
        lock(&self.state).clients.len()
    }

    /// Outside a tokio runtime every newly opened window gets its own
    /// sleeping OS thread, so synchronous callers with many distinct keys
    /// pay one thread per key per window. The HTTP path always runs inside
    /// a runtime and uses tasks instead.
    fn schedule_expiry(&self, key: String, generation: u64) {
        let state = Arc::clone(&self.state);
        let window = self.config.window;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(window).await;
                    expire(&state, &key, generation);
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    std::thread::sleep(window);
                    expire(&state, &key, generation);
                });
            }
        }
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn allow(&self, key: &str) -> (bool, Duration) {
        if !self.config.enabled {
            return (true, Duration::ZERO);
        }

        let mut opened = None;
        let count = {
            let mut guard = lock(&self.state);
            let WindowState {
                clients,
                next_generation,
            } = &mut *guard;

            let client = clients.entry(key.to_string()).or_insert_with(|| {
                *next_generation += 1;
                opened = Some(*next_generation);
                ClientWindow {
                    count: 0,
                    generation: *next_generation,
                }
            });
            client.count += 1;
            client.count
        };

        if let Some(generation) = opened {
            self.schedule_expiry(key.to_string(), generation);
        }

        if count > self.config.requests_per_window {
            (false, self.config.window)
        } else {
            (true, Duration::ZERO)
        }
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Drop the counter for `key` if it still belongs to `generation`.
fn expire(state: &Mutex<WindowState>, key: &str, generation: u64) {
    let mut state = lock(state);
    let current = state
        .clients
        .get(key)
        .is_some_and(|client| client.generation == generation);

    if current {
        state.clients.remove(key);
        debug!(client_key = %key, generation, "rate limit window expired");
    }
}

fn lock(state: &Mutex<WindowState>) -> MutexGuard<'_, WindowState> {
    // Counters stay consistent even if a holder panicked mid-request.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn limiter(limit: u64, window: Duration) -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::new(RateLimitConfig::new(limit, window))
    }

    #[tokio::test]
    async fn test_admits_up_to_limit_then_denies() {
        let limiter = limiter(5, Duration::from_secs(60));

        for _ in 0..5 {
            assert_eq!(limiter.allow("k"), (true, Duration::ZERO));
        }
        assert_eq!(limiter.allow("k"), (false, Duration::from_secs(60)));
        assert_eq!(limiter.current_count("k"), 6);
    }

    #[tokio::test]
    async fn test_keys_are_counted_independently() {
        let limiter = limiter(1, Duration::from_secs(60));

        assert!(limiter.allow("a").0);
        assert!(!limiter.allow("a").0);
        assert!(limiter.allow("b").0);
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_counter() {
        let limiter = limiter(5, Duration::from_millis(100));

        for _ in 0..5 {
            assert!(limiter.allow("k").0);
        }
        assert!(!limiter.allow("k").0);

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(limiter.current_count("k"), 0);
        assert_eq!(limiter.allow("k"), (true, Duration::ZERO));
    }

    #[test]
    fn test_expiry_without_runtime_uses_thread() {
        let limiter = limiter(1, Duration::from_millis(50));

        assert!(limiter.allow("k").0);
        assert!(!limiter.allow("k").0);

        thread::sleep(Duration::from_millis(200));
        assert!(limiter.allow("k").0);
    }

    #[test]
    fn test_expiry_scheduled_once_per_window() {
        let limiter = limiter(3, Duration::from_millis(50));

        for _ in 0..10 {
            limiter.allow("k");
        }
        assert_eq!(lock(&limiter.state).next_generation, 1);

        thread::sleep(Duration::from_millis(200));
        limiter.allow("k");
        assert_eq!(lock(&limiter.state).next_generation, 2);
    }

    #[tokio::test]
    async fn test_disabled_admits_everything() {
        let limiter = FixedWindowRateLimiter::new(RateLimitConfig::disabled());

        for _ in 0..1_000 {
            assert_eq!(limiter.allow("k"), (true, Duration::ZERO));
        }
        assert!(!limiter.is_enabled());
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[tokio::test]
    async fn test_stale_expiry_keeps_newer_window() {
        let limiter = limiter(5, Duration::from_secs(60));

        limiter.allow("k");
        let stale = lock(&limiter.state).clients["k"].generation;

        // Simulate the window closing, then a fresh one opening.
        lock(&limiter.state).clients.remove("k");
        limiter.allow("k");
        limiter.allow("k");

        expire(&limiter.state, "k", stale);
        assert_eq!(limiter.current_count("k"), 2);

        let fresh = lock(&limiter.state).clients["k"].generation;
        expire(&limiter.state, "k", fresh);
        assert_eq!(limiter.current_count("k"), 0);
    }

    #[test]
    fn test_concurrent_allow_loses_no_counts() {
        let limiter = limiter(50, Duration::from_secs(60));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                thread::spawn(move || (0..10).filter(|_| limiter.allow("shared").0).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
        assert_eq!(limiter.current_count("shared"), 80);
    }
}
