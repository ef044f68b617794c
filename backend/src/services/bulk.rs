//! Bounded-concurrency fan-out/fan-in executor for per-request bulk work.
//!
//! Every bulk endpoint (CSV import, invitation dispatch, roster teardown)
//! funnels through [`run_bulk`]: N independent items, at most `limit`
//! operations in flight, one outcome per item. The pool is request-scoped
//! and ephemeral; nothing is queued across requests.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Default in-flight cap for bulk operations, sized for the throughput
/// limits of the downstream SMTP and image backends.
pub const DEFAULT_BULK_CONCURRENCY: usize = 10;

/// Per-item result: the input item paired with what happened to it.
#[derive(Debug)]
pub struct BulkOutcome<T, R> {
    pub item: T,
    pub result: Result<R, String>,
}

/// Runs `op` over every item with at most `limit` operations in flight.
///
/// Join semantics: the call returns only after every item has an outcome.
/// Outcomes arrive in completion order, not input order. A failing item is
/// recorded and never blocks the rest; an aborted worker is reconciled into
/// a failed outcome for its item rather than crashing the pool. There is no
/// retry and no mid-flight cancellation: if the caller goes away, in-flight
/// work still runs to completion.
pub async fn run_bulk<T, R, F, Fut>(items: Vec<T>, limit: usize, op: F) -> Vec<BulkOutcome<T, R>>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let op = Arc::new(op);
    let mut tasks = JoinSet::new();

    for (index, item) in items.iter().cloned().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let op = Arc::clone(&op);
        tasks.spawn(async move {
            // Each logical task blocks here until a slot frees up.
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return (
                        index,
                        BulkOutcome {
                            item,
                            result: Err("worker pool shut down".to_string()),
                        },
                    )
                }
            };
            let result = op(item.clone()).await.map_err(|err| format!("{err:#}"));
            (index, BulkOutcome { item, result })
        });
    }

    let mut outcomes = Vec::with_capacity(items.len());
    let mut completed = vec![false; items.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => {
                completed[index] = true;
                outcomes.push(outcome);
            }
            Err(err) => {
                tracing::error!(error = %err, "bulk worker aborted before reporting an outcome");
            }
        }
    }

    // An aborted worker loses its moved item; restore the outcome from the
    // caller's copy so every input is accounted for exactly once.
    for (index, done) in completed.iter().enumerate() {
        if !done {
            outcomes.push(BulkOutcome {
                item: items[index].clone(),
                result: Err("worker aborted".to_string()),
            });
        }
    }

    outcomes
}
