use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// A background job dispatched by [`crate::IndexSearcher`]: per `SPEC_FULL.md`
/// §5, "the core defines job payloads... not the queue technology". The
/// trait lets a caller swap a real async runtime spawn for a synchronous or
/// inspectable one in tests without `IndexSearcher` knowing the difference.
pub trait JobQueue: Send + Sync {
    fn enqueue(&self, job: Pin<Box<dyn Future<Output = ()> + Send>>);
}

/// The production [`JobQueue`]: fire-and-forget via `tokio::spawn`. Losing a
/// warmer task is acceptable per `spec.md` §5 ("it only affects latency of
/// an as-yet-unmade request"), so the `JoinHandle` is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioJobQueue;

impl JobQueue for TokioJobQueue {
    fn enqueue(&self, job: Pin<Box<dyn Future<Output = ()> + Send>>) {
        tokio::spawn(job);
    }
}

/// A [`JobQueue`] that retains every spawned task's `JoinHandle`, so a test
/// can deterministically wait for a warming job to finish before asserting
/// on cache contents (`spec.md` §8 scenario 5).
#[derive(Default, Clone)]
pub struct CollectingJobQueue {
    handles: Arc<Mutex<Vec<tokio::task::JoinHandle<()>>>>,
}

impl CollectingJobQueue {
    pub fn new() -> Self {
        CollectingJobQueue::default()
    }

    /// Awaits and clears every job enqueued so far.
    pub async fn join_all(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.handles.lock().unwrap());
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl JobQueue for CollectingJobQueue {
    fn enqueue(&self, job: Pin<Box<dyn Future<Output = ()> + Send>>) {
        let handle = tokio::spawn(job);
        self.handles.lock().unwrap().push(handle);
    }
}
