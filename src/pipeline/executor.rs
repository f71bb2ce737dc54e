//! Bounded-concurrency batch execution
//!
//! Items are dispatched to a dedicated rayon pool of `concurrency` workers;
//! each worker runs one item's task to completion and reports back over a
//! channel. The dispatching thread collects outcomes in completion order,
//! reports progress and returns once every item has finished. A failing or
//! panicking task never affects the others.

use crate::config::settings::resolve_threads;
use crate::error::{Result, XtractorError};
use crossbeam_channel::unbounded;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// A task that did not complete successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Position of the item in the input
    pub index: usize,
    pub error: String,
    /// False for panics and batch-level errors
    pub recoverable: bool,
}

/// Outcome of a whole batch
#[derive(Debug)]
pub struct BatchSummary<O> {
    pub total: usize,
    /// Successful outputs, ordered by input position
    pub completed: Vec<(usize, O)>,
    /// Failures, ordered by input position
    pub failures: Vec<BatchFailure>,
}

impl<O> BatchSummary<O> {
    fn new(total: usize) -> Self {
        Self {
            total,
            completed: Vec::with_capacity(total),
            failures: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.completed.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    fn finished(&self) -> usize {
        self.succeeded() + self.failed()
    }
}

/// Run `task` over every item with at most `concurrency` running at once
///
/// `concurrency` 0 means one worker per CPU. `on_progress(completed, total)`
/// is called on the calling thread after every item.
pub fn run_batch<T, O, F, P>(
    items: Vec<T>,
    concurrency: usize,
    task: F,
    mut on_progress: P,
) -> Result<BatchSummary<O>>
where
    T: Send,
    O: Send,
    F: Fn(T) -> Result<O> + Sync,
    P: FnMut(usize, usize),
{
    let total = items.len();
    let mut summary = BatchSummary::new(total);
    if total == 0 {
        return Ok(summary);
    }

    let workers = resolve_threads(concurrency).min(total);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("xtractor-worker-{}", i))
        .build()
        .map_err(|e| XtractorError::Config(format!("Failed to build worker pool: {}", e)))?;
    debug!("Dispatching {} items to {} workers", total, workers);

    let (tx, rx) = unbounded();
    let task = &task;

    pool.in_place_scope(|scope| {
        for (index, item) in items.into_iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(item)));
                // the receiver outlives every worker
                let _ = tx.send((index, outcome));
            });
        }
        drop(tx);

        for (index, outcome) in rx.iter() {
            match outcome {
                Ok(Ok(output)) => summary.completed.push((index, output)),
                Ok(Err(e)) => {
                    debug!("Item {} failed: {}", index, e);
                    summary.failures.push(BatchFailure {
                        index,
                        recoverable: e.is_recoverable(),
                        error: e.to_string(),
                    });
                }
                Err(payload) => summary.failures.push(BatchFailure {
                    index,
                    error: format!("worker panicked: {}", panic_message(payload.as_ref())),
                    recoverable: false,
                }),
            }
            on_progress(summary.finished(), total);
        }
    });

    summary.completed.sort_by_key(|(index, _)| *index);
    summary.failures.sort_by_key(|f| f.index);
    Ok(summary)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
