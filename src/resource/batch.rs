//! Bulk processing with per-item failure isolation
//!
//! A failing item never stops the remaining ones: every error is collected and
//! reported together once the whole collection has been processed.

use crate::idc::error::{IdcError, Result};
use crate::progress::ProgressReporter;
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Collected outcome of a bulk operation
#[derive(Debug)]
pub struct BatchOutcome<R> {
    /// Successful results, in source order
    pub results: Vec<R>,
    /// Ids of the successful items, in source order
    pub succeeded: Vec<String>,
    /// Per-item failures, in source order
    pub errors: Vec<IdcError>,
}

impl<R> BatchOutcome<R> {
    fn new() -> Self {
        Self {
            results: Vec::new(),
            succeeded: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn record(&mut self, id: String, result: Result<R>) {
        match result {
            Ok(value) => {
                self.results.push(value);
                self.succeeded.push(id);
            }
            Err(err) => {
                tracing::debug!("Item {} failed: {}", id, err);
                self.errors.push(err);
            }
        }
    }

    /// `Ok` when nothing failed, otherwise one aggregated partial-batch error
    pub fn into_result(self, message: impl Into<String>) -> Result<Vec<R>> {
        if self.errors.is_empty() {
            Ok(self.results)
        } else {
            Err(IdcError::partial_batch(message, self.errors, self.succeeded))
        }
    }
}

/// Process items one at a time, in order
pub async fn run_sequential<T, R, F, Fut>(
    progress: &dyn ProgressReporter,
    noun: &str,
    items: Vec<(String, T)>,
    mut op: F,
) -> BatchOutcome<R>
where
    F: FnMut(String, T) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let total = items.len();
    let indicator = progress.create(total, &format!("Processing {}...", noun));
    let mut outcome = BatchOutcome::new();

    for (id, item) in items {
        progress.update(indicator, &format!("Processing {} {}", noun, id));
        let result = op(id.clone(), item).await;
        outcome.record(id, result);
    }

    progress.stop(
        indicator,
        &format!("Processed {} of {} {}.", outcome.succeeded.len(), total, noun),
    );
    outcome
}

/// Process items with at most `limit` in flight; results keep source order
pub async fn run_bounded<T, R, F, Fut>(
    progress: &dyn ProgressReporter,
    noun: &str,
    items: Vec<(String, T)>,
    limit: usize,
    mut op: F,
) -> BatchOutcome<R>
where
    F: FnMut(String, T) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let total = items.len();
    let indicator = progress.create(total, &format!("Processing {}...", noun));

    let futures: Vec<_> = items
        .into_iter()
        .map(|(id, item)| {
            let fut = op(id.clone(), item);
            async move { (id, fut.await) }
        })
        .collect();

    let completed: Vec<(String, Result<R>)> = stream::iter(futures)
        .buffered(limit.max(1))
        .collect()
        .await;

    let mut outcome = BatchOutcome::new();
    for (id, result) in completed {
        progress.update(indicator, &format!("Processed {} {}", noun, id));
        outcome.record(id, result);
    }

    progress.stop(
        indicator,
        &format!("Processed {} of {} {}.", outcome.succeeded.len(), total, noun),
    );
    outcome
}
