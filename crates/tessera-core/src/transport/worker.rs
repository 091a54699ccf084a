use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::transport::error::TransportError;

/// Runs long network jobs one at a time off the caller's task.
///
/// Jobs queue on a single permit. Each job receives its own cancellation
/// token; the caller keeps a [`JobHandle`] to cancel it or wait for it.
#[derive(Debug, Clone)]
pub struct BackgroundWorker {
    permits: Arc<Semaphore>,
}

impl Default for BackgroundWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundWorker {
    pub fn new() -> Self {
        Self { permits: Arc::new(Semaphore::new(1)) }
    }

    pub fn submit<F, Fut, T>(&self, job: F) -> JobHandle<T>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.submit_with(CancellationToken::new(), job)
    }

    /// Like [`submit`](Self::submit), with a token supplied by the caller
    pub fn submit_with<F, Fut, T>(&self, cancel: CancellationToken, job: F) -> JobHandle<T>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let token = cancel.clone();
        let permits = self.permits.clone();
        let join = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            job(token).await
        });
        JobHandle { join, cancel }
    }

    /// Whether a job currently holds the worker
    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

pub struct JobHandle<T> {
    join: JoinHandle<T>,
    cancel: CancellationToken,
}

impl<T> JobHandle<T> {
    /// Asks the job to stop; in-flight downloads are dropped
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the job to complete
    pub async fn wait(self) -> Result<T, TransportError> {
        self.join.await.map_err(|e| TransportError::Worker(e.to_string()))
    }
}
