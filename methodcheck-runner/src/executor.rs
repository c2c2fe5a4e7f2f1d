//! Bounded Executor
//!
//! Runs units of work on a fixed-width rayon pool and waits for each under a
//! wall-clock deadline.
//!
//! ```text
//! submit(work) ──► pool worker ──► catch_unwind(work) ──► channel ──┐
//!                                                                    │
//! await_result(handle) ◄── recv_timeout(deadline) ◄──────────────────┘
//!        │
//!        ├── value     → Completed
//!        ├── panic     → Raised(Panicked)
//!        ├── deadline  → Cancelled (task abandoned, keeps running)
//!        └── hang-up   → Raised(Lost)
//! ```
//!
//! Cancellation is advisory. A task past its deadline is marked abandoned and
//! its eventual result is discarded; the worker thread stays occupied until
//! the work returns on its own.
//!
//! Abandoned tasks are tracked per pool generation. Once every worker of the
//! current generation is held by an abandoned task, the next submission
//! retires that pool and starts a fresh one of the same width, so runaway work
//! never starves later tasks. Retired threads exit when their work returns.

use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

const RUNNING: u8 = 0;
const DONE: u8 = 1;
const ABANDONED: u8 = 2;

/// Worker pool failures
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The rayon pool could not be started
    #[error("Failed to build worker pool: {0}")]
    PoolBuild(String),

    /// Submission after [`BoundedExecutor::shutdown`]
    #[error("Executor has been shut down")]
    ShutDown,
}

/// Why a task produced no value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// The work panicked
    Panicked {
        /// Panic payload rendered as text
        message: String,
    },
    /// The pool dropped the task without reporting back
    Lost,
}

/// Outcome of awaiting a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T> {
    /// The work returned a value
    Completed(T),
    /// Deadline reached; the task may still be running
    Cancelled,
    /// The work failed without a value
    Raised(TaskFailure),
}

/// Pending result of a submitted task
#[derive(Debug)]
pub struct TaskHandle<T> {
    id: u64,
    receiver: Receiver<Result<T, TaskFailure>>,
    state: Arc<AtomicU8>,
    tracker: Arc<AbandonTracker>,
}

impl<T> TaskHandle<T> {
    /// Executor-wide task number
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        // An unawaited handle abandons its task.
        self.tracker.abandon(self.id, &self.state);
    }
}

/// Abandoned-task bookkeeping for one pool generation.
#[derive(Debug)]
struct AbandonTracker {
    generation: u64,
    stalled: AtomicUsize,
    total: Arc<AtomicUsize>,
    workers: usize,
}

impl AbandonTracker {
    fn abandon(&self, id: u64, state: &AtomicU8) -> bool {
        if state
            .compare_exchange(RUNNING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let stalled = self.stalled.fetch_add(1, Ordering::AcqRel) + 1;
        self.total.fetch_add(1, Ordering::AcqRel);
        debug!(task = id, generation = self.generation, stalled, "task abandoned");
        true
    }

    fn release(&self, id: u64) {
        self.stalled.fetch_sub(1, Ordering::AcqRel);
        self.total.fetch_sub(1, Ordering::AcqRel);
        debug!(task = id, generation = self.generation, "abandoned task finished");
    }

    /// Every worker of this generation is held by abandoned work.
    fn saturated(&self) -> bool {
        self.stalled.load(Ordering::Acquire) >= self.workers
    }
}

struct Generation {
    pool: ThreadPool,
    tracker: Arc<AbandonTracker>,
}

/// Fixed-width pool with per-task deadlines
pub struct BoundedExecutor {
    current: Mutex<Option<Generation>>,
    timeout: Duration,
    workers: usize,
    next_id: AtomicU64,
    generations: AtomicU64,
    abandoned: Arc<AtomicUsize>,
}

impl BoundedExecutor {
    /// Build a pool of `workers` threads whose tasks are awaited for at most `timeout`.
    pub fn new(workers: usize, timeout: Duration) -> Result<Self, ExecutorError> {
        let workers = workers.max(1);
        let abandoned = Arc::new(AtomicUsize::new(0));
        let first = Self::start_generation(0, workers, &abandoned)?;

        Ok(Self {
            current: Mutex::new(Some(first)),
            timeout,
            workers,
            next_id: AtomicU64::new(0),
            generations: AtomicU64::new(1),
            abandoned,
        })
    }

    fn start_generation(
        generation: u64,
        workers: usize,
        abandoned: &Arc<AtomicUsize>,
    ) -> Result<Generation, ExecutorError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("methodcheck-worker-{}-{}", generation, i))
            .panic_handler(|panic| {
                error!(panic = %panic_message(panic.as_ref()), "worker panicked outside a task");
            })
            .build()
            .map_err(|e| ExecutorError::PoolBuild(e.to_string()))?;

        Ok(Generation {
            pool,
            tracker: Arc::new(AbandonTracker {
                generation,
                stalled: AtomicUsize::new(0),
                total: Arc::clone(abandoned),
                workers,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Generation>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Per-task deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Threads per pool generation
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Tasks past their deadline that have not finished yet, across all generations
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::Acquire)
    }

    /// Number of pools started so far, the initial one included
    pub fn generations(&self) -> u64 {
        self.generations.load(Ordering::Acquire)
    }

    /// Whether [`shutdown`](Self::shutdown) has run
    pub fn is_shut_down(&self) -> bool {
        self.lock().is_none()
    }

    /// Queue `work` on the pool. Never blocks on running work.
    ///
    /// Replaces the pool first if abandoned tasks occupy all of its workers.
    pub fn submit<T, F>(&self, work: F) -> Result<TaskHandle<T>, ExecutorError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut current = self.lock();
        let generation = current.as_mut().ok_or(ExecutorError::ShutDown)?;

        if generation.tracker.saturated() {
            let number = self.generations.fetch_add(1, Ordering::AcqRel);
            let fresh = Self::start_generation(number, self.workers, &self.abandoned)?;
            let retired = std::mem::replace(generation, fresh);
            warn!(
                retired = retired.tracker.generation,
                workers = self.workers,
                abandoned = self.abandoned(),
                "every worker is held by an abandoned task; starting a fresh pool"
            );
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel();
        let state = Arc::new(AtomicU8::new(RUNNING));

        let task_state = Arc::clone(&state);
        let tracker = Arc::clone(&generation.tracker);
        generation.pool.spawn(move || {
            if task_state.load(Ordering::Acquire) == ABANDONED {
                tracker.release(id);
                return;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(work)).map_err(|panic| {
                TaskFailure::Panicked {
                    message: panic_message(panic.as_ref()),
                }
            });

            if task_state
                .compare_exchange(RUNNING, DONE, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                tracker.release(id);
                return;
            }
            let _ = sender.send(outcome);
        });

        debug!(task = id, generation = generation.tracker.generation, "task submitted");
        Ok(TaskHandle {
            id,
            receiver,
            state,
            tracker: Arc::clone(&generation.tracker),
        })
    }

    /// Wait for a task, at most for the configured deadline.
    ///
    /// The deadline is counted from this call, not from submission.
    pub fn await_result<T>(&self, handle: TaskHandle<T>) -> TaskOutcome<T> {
        match handle.receiver.recv_timeout(self.timeout) {
            Ok(Ok(value)) => TaskOutcome::Completed(value),
            Ok(Err(failure)) => TaskOutcome::Raised(failure),
            Err(RecvTimeoutError::Timeout) => {
                if handle.tracker.abandon(handle.id, &handle.state) {
                    return TaskOutcome::Cancelled;
                }
                // Finished at the deadline; the result is already on its way.
                match handle.receiver.recv() {
                    Ok(Ok(value)) => TaskOutcome::Completed(value),
                    Ok(Err(failure)) => TaskOutcome::Raised(failure),
                    Err(_) => TaskOutcome::Raised(TaskFailure::Lost),
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                handle.state.store(DONE, Ordering::Release);
                TaskOutcome::Raised(TaskFailure::Lost)
            }
        }
    }

    /// Release the pool. In-flight work is not waited for.
    pub fn shutdown(&mut self) {
        let current = self
            .current
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(generation) = current.take() {
            debug!(
                workers = self.workers,
                generations = self.generations.load(Ordering::Acquire),
                abandoned = self.abandoned.load(Ordering::Acquire),
                "worker pool released"
            );
            drop(generation);
        }
    }
}

impl Drop for BoundedExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
