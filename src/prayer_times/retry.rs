use std::fmt::Display;
use std::thread;
use std::time::Duration;

/// Retry with exponential backoff. One attempt means no retry at all.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay slept after the `attempt`-th failure (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    pub fn run<T, E, F>(&self, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Result<T, E>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    let delay = self.backoff_for(attempt);
                    log::warn!(
                        "attempt {}/{} failed: {} (retrying in {:?})",
                        attempt,
                        attempts,
                        e,
                        delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
            multiplier: 2,
            max_backoff: Duration::ZERO,
        }
    }

    #[test]
    fn stops_at_first_success() {
        let mut calls = 0;
        let out: Result<u32, String> = instant().run(|| {
            calls += 1;
            if calls < 2 { Err("flaky".to_string()) } else { Ok(7) }
        });
        assert_eq!(out, Ok(7));
        assert_eq!(calls, 2);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let out: Result<(), String> = instant().run(|| {
            calls += 1;
            Err(format!("fail {}", calls))
        });
        assert_eq!(out, Err("fail 3".to_string()));
        assert_eq!(calls, 3);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let mut calls = 0;
        let policy = RetryPolicy {
            max_attempts: 0,
            ..instant()
        };
        let _: Result<(), &str> = policy.run(|| {
            calls += 1;
            Err("down")
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            multiplier: 2,
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(350));
        assert_eq!(policy.backoff_for(40), Duration::from_millis(350));
    }
}
