// Main-thread executor
//
// World and entity mutation belongs to a single thread. Other contexts hand
// work to it through a bounded channel of boxed jobs and await the result on
// a oneshot. The runner side is drained either by a dedicated std::thread
// (run_blocking) or, inside a host tick loop, by run_pending.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Length of one simulation tick.
pub const TICK: Duration = Duration::from_millis(50);

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Errors returned when work cannot be run on the main thread
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Main thread is no longer accepting work")]
    Closed,

    #[error("Main thread dropped the job before it completed")]
    JobDropped,
}

/// Cloneable handle for submitting work to the main thread.
#[derive(Clone, Debug)]
pub struct MainThread {
    job_tx: mpsc::Sender<Job>,
}

/// Receiving side of [`MainThread`]; owns the job queue.
pub struct MainThreadRunner {
    job_rx: mpsc::Receiver<Job>,
}

impl MainThread {
    /// Create a handle/runner pair with a bounded queue of `capacity` jobs.
    pub fn channel(capacity: usize) -> (MainThread, MainThreadRunner) {
        let (job_tx, job_rx) = mpsc::channel(capacity);
        (MainThread { job_tx }, MainThreadRunner { job_rx })
    }

    /// Run `f` on the main thread and resolve with its result.
    ///
    /// Waits for queue space if the main thread is backed up. Not cancellable
    /// once queued: dropping the returned future does not unqueue the job.
    pub async fn submit<F, R>(&self, f: F) -> Result<R, SchedulerError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            // Caller may have stopped waiting
            let _ = result_tx.send(f());
        });

        self.job_tx
            .send(job)
            .await
            .map_err(|_| SchedulerError::Closed)?;

        result_rx.await.map_err(|_| SchedulerError::JobDropped)
    }

    /// Run `f` on the main thread once `delay` has elapsed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule_after<F>(&self, delay: Duration, f: F) -> JoinHandle<Result<(), SchedulerError>>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            handle.submit(f).await
        })
    }

    /// [`schedule_after`](Self::schedule_after) expressed in simulation ticks.
    pub fn schedule_after_ticks<F>(&self, ticks: u32, f: F) -> JoinHandle<Result<(), SchedulerError>>
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_after(TICK * ticks, f)
    }
}

impl MainThreadRunner {
    /// Drain jobs on the current async task until every handle is dropped.
    pub async fn run(mut self) {
        tracing::debug!("Main thread runner started");
        while let Some(job) = self.job_rx.recv().await {
            Self::execute(job);
        }
        tracing::debug!("Main thread runner stopped");
    }

    /// Drain jobs on the current OS thread until every handle is dropped.
    ///
    /// Must not be called from inside an async context.
    pub fn run_blocking(mut self) {
        tracing::debug!("Main thread runner started (blocking)");
        while let Some(job) = self.job_rx.blocking_recv() {
            Self::execute(job);
        }
        tracing::debug!("Main thread runner stopped");
    }

    /// Run every job queued right now and return how many ran.
    ///
    /// Intended for a host tick loop that interleaves plugin work with its own.
    pub fn run_pending(&mut self) -> usize {
        let mut executed = 0;
        while let Ok(job) = self.job_rx.try_recv() {
            Self::execute(job);
            executed += 1;
        }
        executed
    }

    fn execute(job: Job) {
        // A panicking job drops its result sender; the submitter sees JobDropped
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::error!("Main thread job panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_submit_returns_result() {
        let (main_thread, runner) = MainThread::channel(8);
        tokio::spawn(runner.run());

        let value = main_thread.submit(|| 21 * 2).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_submit_after_runner_gone_is_closed() {
        let (main_thread, runner) = MainThread::channel(8);
        drop(runner);

        assert_eq!(main_thread.submit(|| ()).await, Err(SchedulerError::Closed));
    }

    #[tokio::test]
    async fn test_panicking_job_reports_dropped() {
        let (main_thread, runner) = MainThread::channel(8);
        tokio::spawn(runner.run());

        let result = main_thread.submit(|| -> usize { panic!("boom") }).await;
        assert_eq!(result, Err(SchedulerError::JobDropped));

        // Runner keeps serving after a panic
        assert_eq!(main_thread.submit(|| 1).await, Ok(1));
    }

    #[tokio::test]
    async fn test_schedule_after_waits_for_delay() {
        let (main_thread, runner) = MainThread::channel(8);
        tokio::spawn(runner.run());

        let ran = Arc::new(AtomicUsize::new(0));
        let flag = ran.clone();
        let task = main_thread.schedule_after_ticks(4, move || {
            flag.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        task.await.unwrap().unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_pending_drains_queue() {
        let (main_thread, mut runner) = MainThread::channel(8);
        let counter = Arc::new(AtomicUsize::new(0));

        let mut pending: Vec<_> = (0..3)
            .map(|_| {
                let counter = counter.clone();
                let handle = main_thread.clone();
                tokio_test::task::spawn(async move {
                    handle
                        .submit(move || counter.fetch_add(1, Ordering::SeqCst))
                        .await
                })
            })
            .collect();

        for task in pending.iter_mut() {
            assert!(task.poll().is_pending());
        }

        assert_eq!(runner.run_pending(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        for task in pending.iter_mut() {
            assert!(task.poll().is_ready());
        }
    }
}
