//! Bounded worker pool for batch query processing.
//!
//! A bounded channel decouples the producer from a fixed set of worker tasks.
//! The producer sends every query and then drops its sender: the closed
//! channel is the termination signal, observed exactly once by each worker
//! after all real work has been taken. No value on the queue is reserved,
//! so no query text can collide with a stop marker.
//!
//! An optional shutdown signal interrupts workers blocked on the queue. An
//! interrupted worker exits without taking further work; queries it never
//! dequeued are dropped with the channel.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, instrument, warn};

use crate::DocumentId;
use crate::api::FailureKind;
use crate::download::FailureReason;
use crate::query::Query;
use crate::search::SearchPaginator;

/// Capacity of the query channel.
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Summary of a finished pool run.
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    /// Queries run to completion.
    pub processed: usize,
    /// Workers that exited on channel close.
    pub workers_finished: usize,
    /// Workers that exited on the shutdown signal.
    pub workers_interrupted: usize,
    /// Workers that panicked.
    pub workers_failed: usize,
    /// One [`FailureKind::InterruptedWait`] entry per interrupted worker.
    pub interruptions: Vec<FailureReason>,
    /// Unique ids per processed query, in completion order.
    pub results: Vec<(String, HashSet<DocumentId>)>,
}

/// How a worker left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerExit {
    Closed,
    Interrupted,
}

/// What a worker got while waiting on the queue.
enum Next {
    Received(Option<Query>),
    Interrupted,
    SignalGone,
}

#[derive(Debug)]
struct WorkerReport {
    worker_id: usize,
    exit: WorkerExit,
    results: Vec<(String, HashSet<DocumentId>)>,
}

/// Fixed-size pool of search workers fed through a bounded queue.
#[derive(Debug)]
pub struct WorkerPool {
    paginator: Arc<SearchPaginator>,
    workers: usize,
    capacity: usize,
    shutdown: Option<watch::Receiver<bool>>,
}

impl WorkerPool {
    /// Creates a pool with `workers` tasks (at least one) and the default queue capacity.
    #[must_use]
    pub fn new(paginator: Arc<SearchPaginator>, workers: usize) -> Self {
        Self {
            paginator,
            workers: workers.max(MIN_WORKERS),
            capacity: DEFAULT_QUEUE_CAPACITY,
            shutdown: None,
        }
    }

    /// Sets the queue capacity (at least one).
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Installs a shutdown signal; raising it to `true` interrupts waiting workers.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Returns the number of workers.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every query on the pool and waits for all workers to exit.
    ///
    /// The pool is consumed by the call, so no query can be submitted once
    /// the queue has been closed.
    #[instrument(skip(self, queries), fields(workers = self.workers, queries = queries.len()))]
    pub async fn execute_all(self, queries: Vec<Query>) -> PoolReport {
        let (tx, rx) = mpsc::channel::<Query>(self.capacity);
        let rx = Arc::new(Mutex::new(rx));

        let handles: Vec<_> = (0..self.workers)
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let paginator = Arc::clone(&self.paginator);
                let shutdown = self.shutdown.clone();
                tokio::spawn(worker_loop(worker_id, rx, paginator, shutdown))
            })
            .collect();
        // Workers own the receiver from here on; the channel closes for the
        // producer once they have all exited.
        drop(rx);

        for query in queries {
            if tx.send(query).await.is_err() {
                warn!("all workers exited, remaining queries not queued");
                break;
            }
        }
        drop(tx);

        let mut report = PoolReport::default();
        for handle in handles {
            match handle.await {
                Ok(worker) => {
                    match worker.exit {
                        WorkerExit::Closed => report.workers_finished += 1,
                        WorkerExit::Interrupted => {
                            report.workers_interrupted += 1;
                            report.interruptions.push(FailureReason::new(
                                FailureKind::InterruptedWait,
                                format!("worker {} interrupted while waiting for a query", worker.worker_id),
                            ));
                        }
                    }
                    report.processed += worker.results.len();
                    report.results.extend(worker.results);
                }
                Err(e) => {
                    warn!(error = %e, "worker task failed");
                    report.workers_failed += 1;
                }
            }
        }

        info!(
            processed = report.processed,
            finished = report.workers_finished,
            interrupted = report.workers_interrupted,
            failed = report.workers_failed,
            "worker pool done"
        );
        report
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<Query>>>,
    paginator: Arc<SearchPaginator>,
    mut shutdown: Option<watch::Receiver<bool>>,
) -> WorkerReport {
    let mut results = Vec::new();

    let exit = loop {
        let next = match shutdown.as_mut() {
            Some(signal) => {
                let mut guard = rx.lock().await;
                tokio::select! {
                    biased;
                    changed = signal.wait_for(|stop| *stop) => {
                        if changed.is_ok() { Next::Interrupted } else { Next::SignalGone }
                    }
                    query = guard.recv() => Next::Received(query),
                }
            }
            None => Next::Received(rx.lock().await.recv().await),
        };

        match next {
            Next::Interrupted => {
                warn!(worker_id, "worker interrupted while waiting for a query");
                break WorkerExit::Interrupted;
            }
            Next::SignalGone => {
                // Sender dropped without raising shutdown: keep working unsignalled.
                shutdown = None;
            }
            Next::Received(None) => {
                debug!(worker_id, "queue closed, worker exiting");
                break WorkerExit::Closed;
            }
            Next::Received(Some(query)) => {
                info!(worker_id, query = %query, "Processing");
                let report = paginator.run(&query).await;
                info!(
                    worker_id,
                    query = %query,
                    unique = report.unique_count(),
                    "Done with query"
                );
                results.push((report.query, report.doc_ids));
            }
        }
    };

    WorkerReport {
        worker_id,
        exit,
        results,
    }
}
