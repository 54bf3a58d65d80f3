//! Bounded-concurrency transfer execution.

use crate::error::{ErrorKind, Result};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::future::Future;
use std::num::NonZeroUsize;

/// Default number of downloads in flight during a pull.
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 50;
/// Default number of uploads in flight during a push.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 10;

/// Everything a batch of transfers produced, successes and failures apart.
#[derive(Debug)]
pub struct Outcome<T, E> {
    pub results: Vec<T>,
    pub errors: Vec<E>,
}
impl<T, E> Default for Outcome<T, E> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Runs a batch of transfer futures with at most `concurrency` of them in
/// flight at once.
///
/// A failing task never cancels its siblings, and completion order is
/// whatever order the tasks happen to finish in. Tasks are started in the
/// order given: as soon as one settles, the next pending task takes its
/// place.
///
/// # Examples
///
/// ```
/// use wsync_engine::TransferScheduler;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let scheduler = TransferScheduler::new(2).unwrap();
/// let tasks = (0..5u32).map(|i| async move { if i == 3 { Err(i) } else { Ok(i * 10) } });
/// let outcome = scheduler.run(tasks).await;
/// assert_eq!(outcome.results.len(), 4);
/// assert_eq!(outcome.errors, vec![3]);
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TransferScheduler {
    concurrency: NonZeroUsize,
}

impl TransferScheduler {
    /// # Errors
    ///
    /// Returns [`Construction`](ErrorKind::Construction) if `concurrency` is zero.
    pub fn new(concurrency: usize) -> Result<Self> {
        let Some(concurrency) = NonZeroUsize::new(concurrency) else {
            exn::bail!(ErrorKind::Construction("concurrency must be at least 1".to_string()));
        };
        Ok(Self { concurrency })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.get()
    }

    pub async fn run<I, F, T, E>(&self, tasks: I) -> Outcome<T, E>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = std::result::Result<T, E>>,
    {
        self.run_with(tasks, |_, _, _| {}).await
    }

    /// Like [`run()`](Self::run), calling `on_settled(result, settled, total)`
    /// each time a task finishes.
    pub async fn run_with<I, F, T, E, C>(&self, tasks: I, mut on_settled: C) -> Outcome<T, E>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = std::result::Result<T, E>>,
        C: FnMut(&std::result::Result<T, E>, usize, usize),
    {
        let tasks: Vec<F> = tasks.into_iter().collect();
        let total = tasks.len();
        let mut pending = tasks.into_iter();
        let mut processing: FuturesUnordered<F> = pending.by_ref().take(self.concurrency.get()).collect();
        let mut outcome = Outcome::default();
        let mut settled = 0;

        while let Some(result) = processing.next().await {
            settled += 1;
            on_settled(&result, settled, total);
            match result {
                Ok(value) => outcome.results.push(value),
                Err(err) => outcome.errors.push(err),
            }
            // FIFO refill: the next task only starts once a slot frees up.
            if let Some(next) = pending.next() {
                processing.push(next);
            }
        }
        outcome
    }
}
