use std::fmt::Display;
use std::future::Future;
use tokio::time::{sleep, Duration};

/// Retry schedule for writing epoch records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistPolicy {
    /// Total attempts, the first one included. Zero behaves like one.
    pub attempts: u32,

    /// Pause between attempts
    pub backoff: Duration,
}

impl Default for PersistPolicy {
    /// Retry once after 200 ms
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::from_millis(200),
        }
    }
}

impl PersistPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }

    /// Single attempt, no waiting
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Run `op` until it succeeds or the attempts are used up; the last error
    /// is returned
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    log::warn!("{} failed (attempt {}/{}): {}", what, attempt, attempts, e);
                    attempt += 1;
                    sleep(self.backoff).await;
                }
                Err(e) => {
                    log::error!("{} failed after {} attempts: {}", what, attempts, e);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let policy = PersistPolicy::new(3, Duration::from_millis(100));
        let mut calls = 0;

        let result: Result<u32, String> = policy
            .run("write", || {
                calls += 1;
                let result = if calls < 3 {
                    Err(format!("failure {}", calls))
                } else {
                    Ok(calls)
                };
                async move { result }
            })
            .await;

        assert_eq!(result, Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error() {
        let policy = PersistPolicy::default();
        let mut calls = 0;

        let result: Result<(), String> = policy
            .run("write", || {
                calls += 1;
                let failure = format!("failure {}", calls);
                async move { Err(failure) }
            })
            .await;

        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let policy = PersistPolicy::new(0, Duration::ZERO);
        let mut calls = 0;

        let _: Result<(), &str> = policy
            .run("write", || {
                calls += 1;
                std::future::ready(Err("nope"))
            })
            .await;

        assert_eq!(calls, 1);
    }
}
