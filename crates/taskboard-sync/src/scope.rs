use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use taskboard_core::{BoardError, BoardResult};
use tokio::task::{AbortHandle, JoinHandle};

/// Cancellation scope for async work owned by one component.
///
/// Work spawned through the scope runs on tokio and is aborted when the
/// scope is cancelled or when the last handle to it is dropped. Once
/// cancelled, the scope stays closed and new work resolves to `Cancelled`
/// without running.
#[derive(Clone, Default)]
pub struct TaskScope {
    inner: Arc<ScopeInner>,
}

#[derive(Default)]
struct ScopeInner {
    handles: Mutex<Vec<AbortHandle>>,
    cancelled: AtomicBool,
}

impl TaskScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F, T>(&self, future: F) -> ScopedTask<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_cancelled() {
            return ScopedTask { handle: None };
        }

        let handle = tokio::spawn(future);
        let mut handles = self
            .inner
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle.abort_handle());

        // cancel() may have run between the check above and the push.
        if self.is_cancelled() {
            handle.abort();
        }
        ScopedTask {
            handle: Some(handle),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Number of spawned tasks that have not finished yet.
    pub fn active(&self) -> usize {
        self.inner
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }
}

impl ScopeInner {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let handles = std::mem::take(
            &mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner),
        );
        if !handles.is_empty() {
            tracing::debug!("Cancelling {} scoped task(s)", handles.len());
        }
        for handle in handles {
            handle.abort();
        }
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Handle to work spawned in a [`TaskScope`].
pub struct ScopedTask<T> {
    handle: Option<JoinHandle<T>>,
}

impl<T> ScopedTask<T> {
    /// Wait for the work to finish. Returns `Cancelled` when the scope was
    /// cancelled first. Panics inside the task are resumed on the caller.
    pub async fn join(self) -> BoardResult<T> {
        let Some(handle) = self.handle else {
            return Err(BoardError::Cancelled("scope already closed".to_string()));
        };
        match handle.await {
            Ok(value) => Ok(value),
            Err(e) if e.is_cancelled() => {
                Err(BoardError::Cancelled("scoped task aborted".to_string()))
            }
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_join_returns_value() {
        let scope = TaskScope::new();
        let value = scope.spawn(async { 41 + 1 }).join().await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_work() {
        let scope = TaskScope::new();
        let task = scope.spawn(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "stale"
        });

        scope.cancel();
        let result = task.join().await;
        assert!(matches!(result, Err(BoardError::Cancelled(_))));
        assert!(scope.is_cancelled());
    }

    #[tokio::test]
    async fn test_spawn_after_cancel_never_runs() {
        let scope = TaskScope::new();
        scope.cancel();

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let result = scope
            .spawn(async move { flag.store(true, Ordering::SeqCst) })
            .join()
            .await;

        assert!(matches!(result, Err(BoardError::Cancelled(_))));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dropping_last_handle_cancels() {
        let scope = TaskScope::new();
        let task = scope.spawn(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        drop(scope);
        assert!(matches!(task.join().await, Err(BoardError::Cancelled(_))));
    }

    #[tokio::test]
    async fn test_clones_share_cancellation() {
        let scope = TaskScope::new();
        let clone = scope.clone();
        clone.cancel();
        assert!(scope.is_cancelled());
    }
}
