//! Bounded worker pool with message passing.
//!
//! Workers never touch shared result containers. Each job returns its
//! output over an mpsc channel tagged with the item's submission index; the
//! coordinating thread drains the channel in completion order and is the only
//! place results are merged. Draining the receiver to the end is the barrier:
//! it returns once every job has finished and dropped its sender.
//!
//! A job that panics still yields its message, carrying the panic text, so
//! one bad file cannot take the batch (or the process) down with it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use super::ScanError;

/// Hard upper bound on worker threads.
pub const MAX_WORKERS: usize = 8;

/// Resolve the worker count: `min(available parallelism, MAX_WORKERS, requested)`.
///
/// `None` or `Some(0)` means "no extra limit"; the result is always at least 1.
#[must_use]
pub fn effective_workers(requested: Option<usize>) -> usize {
    let available = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    let cap = available.min(MAX_WORKERS);
    match requested {
        Some(n) if n > 0 => n.min(cap),
        _ => cap,
    }
    .max(1)
}

/// Build a rayon pool with exactly `workers` threads.
///
/// # Errors
///
/// Returns [`ScanError::Pool`] if the threads cannot be spawned.
pub fn build_pool(workers: usize, name: &'static str) -> Result<rayon::ThreadPool, ScanError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(move |i| format!("{name}-{i}"))
        .build()
        .map_err(|e| ScanError::Pool(e.to_string()))
}

/// Output of one job: its value, or the message of the panic it raised.
pub type JobOutput<R> = Result<R, String>;

/// Submit one job per item and return the completion channel.
///
/// Every item yields exactly one `(index, output)` message, including items
/// whose job panicked.
pub fn dispatch<I, R, F>(
    pool: &rayon::ThreadPool,
    items: Vec<I>,
    job: F,
) -> Receiver<(usize, JobOutput<R>)>
where
    I: Send + 'static,
    R: Send + 'static,
    F: Fn(I) -> R + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel();
    let job = Arc::new(job);

    for (index, item) in items.into_iter().enumerate() {
        let tx = tx.clone();
        let job = Arc::clone(&job);
        pool.spawn(move || {
            let output = panic::catch_unwind(AssertUnwindSafe(|| job(item)))
                .map_err(|payload| panic_message(payload.as_ref()));
            // Receiver gone means the coordinator gave up; nothing to report to.
            let _ = tx.send((index, output));
        });
    }

    rx
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
