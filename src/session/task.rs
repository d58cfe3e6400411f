use std::{future::Future, panic};

use tokio::task::JoinHandle;

/// A spawned session operation that can be cancelled.
///
/// Dropping the handle cancels the operation, so work cannot outlive the
/// context that started it. Call [`TaskHandle::join`] to wait for the result.
///
/// # Example
///
/// ```
/// let task = TaskHandle::spawn(async { 42 });
/// assert_eq!(task.join().await, Some(42));
///
/// let task = TaskHandle::spawn(std::future::pending::<()>());
/// task.cancel();
/// assert_eq!(task.join().await, None);
/// ```
#[derive(Debug)]
pub struct TaskHandle<T> {
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Spawns `future` on the current tokio runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }
}

impl<T> TaskHandle<T> {
    /// Requests cancellation. The operation stops at its next `.await`.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the operation has completed or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the operation. `None` if it was cancelled first. A panic
    /// inside the operation is resumed on the caller.
    pub async fn join(mut self) -> Option<T> {
        match (&mut self.handle).await {
            Ok(value) => Some(value),
            Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
            Err(_) => None,
        }
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
