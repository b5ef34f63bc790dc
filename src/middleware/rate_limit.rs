use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

pub const MAX_LOGIN_FAILURES: usize = 5;
pub const LOGIN_WINDOW: Duration = Duration::from_secs(300);

/// Sliding-window counter of failed login attempts, keyed by email.
/// Process-local: restarts clear it, and multi-instance deployments each
/// track their own window.
#[derive(Debug, Default)]
pub struct LoginRateLimiter {
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a login attempt for this key may proceed.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Records a failed attempt.
    pub fn record(&self, key: &str) {
        self.record_at(key, Instant::now());
    }

    /// Clears the window after a successful login.
    pub fn clear(&self, key: &str) {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.remove(key);
        }
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let Ok(mut attempts) = self.attempts.lock() else {
            return true;
        };
        match attempts.get_mut(key) {
            Some(window) => {
                window.retain(|t| now.duration_since(*t) < LOGIN_WINDOW);
                if window.is_empty() {
                    attempts.remove(key);
                    true
                } else {
                    window.len() < MAX_LOGIN_FAILURES
                }
            }
            None => true,
        }
    }

    fn record_at(&self, key: &str, now: Instant) {
        if let Ok(mut attempts) = self.attempts.lock() {
            let window = attempts.entry(key.to_string()).or_default();
            window.retain(|t| now.duration_since(*t) < LOGIN_WINDOW);
            window.push(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_until_the_limit() {
        let limiter = LoginRateLimiter::new();
        let now = Instant::now();

        for _ in 0..MAX_LOGIN_FAILURES - 1 {
            limiter.record_at("a@example.com", now);
            assert!(limiter.allow_at("a@example.com", now));
        }

        limiter.record_at("a@example.com", now);
        assert!(!limiter.allow_at("a@example.com", now));
    }

    #[test]
    fn window_expires() {
        let limiter = LoginRateLimiter::new();
        let start = Instant::now();

        for _ in 0..MAX_LOGIN_FAILURES {
            limiter.record_at("a@example.com", start);
        }
        assert!(!limiter.allow_at("a@example.com", start));

        let later = start + LOGIN_WINDOW + Duration::from_secs(1);
        assert!(limiter.allow_at("a@example.com", later));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = LoginRateLimiter::new();
        let now = Instant::now();

        for _ in 0..MAX_LOGIN_FAILURES {
            limiter.record_at("a@example.com", now);
        }
        assert!(!limiter.allow_at("a@example.com", now));
        assert!(limiter.allow_at("b@example.com", now));
    }

    #[test]
    fn clear_resets_the_window() {
        let limiter = LoginRateLimiter::new();
        let now = Instant::now();

        for _ in 0..MAX_LOGIN_FAILURES {
            limiter.record_at("a@example.com", now);
        }
        limiter.clear("a@example.com");
        assert!(limiter.allow_at("a@example.com", now));
    }
}
