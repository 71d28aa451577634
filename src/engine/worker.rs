use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use super::LoopState;

/// Flips the liveness flag when the task ends, including by panic
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A spawned loop with cooperative cancellation.
///
/// The body receives a fresh `CancellationToken` and is expected to check it
/// once per iteration; cancelling never aborts an in-flight await.
pub struct BackgroundLoop {
    name: String,
    token: CancellationToken,
    alive: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl BackgroundLoop {
    /// Spawn `body` on the current tokio runtime
    pub fn spawn<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let token = CancellationToken::new();
        let alive = Arc::new(AtomicBool::new(true));

        let guard = AliveGuard(Arc::clone(&alive));
        let future = body(token.clone());
        let task_name = name.clone();

        let task = tokio::spawn(async move {
            let _guard = guard;
            log::debug!("{} loop started", task_name);
            future.await;
            log::debug!("{} loop exited", task_name);
        });

        Self {
            name,
            token,
            alive,
            task: Some(task),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LoopState {
        if !self.alive.load(Ordering::Acquire) {
            LoopState::Stopped
        } else if self.token.is_cancelled() {
            LoopState::Stopping
        } else {
            LoopState::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    pub fn request_stop(&self) {
        self.token.cancel();
    }

    /// Wait for the task to exit
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("{} loop terminated abnormally: {}", self.name, e);
            }
        }
    }
}

impl Drop for BackgroundLoop {
    fn drop(&mut self) {
        // Can't await the task here, but the body will see the cancellation
        self.token.cancel();
    }
}

/// Holder for at most one live `BackgroundLoop`
#[derive(Default)]
pub struct LoopSlot {
    current: Mutex<Option<BackgroundLoop>>,
}

impl LoopSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoopState {
        self.current
            .lock()
            .as_ref()
            .map_or(LoopState::Idle, BackgroundLoop::state)
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Spawn a new loop unless one is already running.
    ///
    /// A previous loop that is stopping keeps finishing its iteration in the
    /// background. Returns `false` when a loop was already running.
    pub fn try_start<F, Fut>(&self, name: &str, body: F) -> bool
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(BackgroundLoop::is_running) {
            return false;
        }
        *current = Some(BackgroundLoop::spawn(name, body));
        true
    }

    /// Ask the running loop to stop. Returns `false` when nothing was running.
    pub fn request_stop(&self) -> bool {
        match self.current.lock().as_ref() {
            Some(background) if background.is_running() => {
                background.request_stop();
                true
            }
            _ => false,
        }
    }

    /// Wait for the current loop, if any, to exit and empty the slot
    pub async fn join(&self) {
        let background = self.current.lock().take();
        if let Some(background) = background {
            background.join().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_loop_runs_until_stopped() {
        let slot = LoopSlot::new();
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&ticks);

        assert_eq!(slot.state(), LoopState::Idle);
        assert!(slot.try_start("ticker", move |token| async move {
            while !token.is_cancelled() {
                counter.fetch_add(1, Ordering::Relaxed);
                sleep(Duration::from_millis(1)).await;
            }
        }));
        assert!(slot.is_running());

        sleep(Duration::from_millis(20)).await;
        assert!(slot.request_stop());
        slot.join().await;

        assert_eq!(slot.state(), LoopState::Idle);
        assert!(ticks.load(Ordering::Relaxed) > 0);
    }

    #[tokio::test]
    async fn test_second_start_is_refused_while_running() {
        let slot = LoopSlot::new();
        assert!(slot.try_start("idle", |token| async move { token.cancelled().await }));
        assert!(!slot.try_start("idle", |token| async move { token.cancelled().await }));

        assert!(slot.request_stop());
        assert!(!slot.request_stop());
        slot.join().await;
    }

    #[tokio::test]
    async fn test_panicking_body_reports_stopped() {
        let slot = LoopSlot::new();
        slot.try_start("doomed", |_token| async move {
            panic!("boom");
        });

        sleep(Duration::from_millis(20)).await;
        assert_eq!(slot.state(), LoopState::Stopped);
        assert!(!slot.is_running());
        slot.join().await;
    }
}
