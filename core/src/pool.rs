//! # Worker Pool
//!
//! Bounded fan-out for entity-parallel phases. At most `capacity` workers run at once; every
//! launched worker runs to completion even after a sibling failed. Failures are collected and
//! reported together once the last worker has finished.

use std::future::Future;
use std::sync::Arc;

use ssot_common::error::{AggregateWorkerError, WorkerFailure};
use ssot_common::{Result, SsotError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use ssot_common::config::DEFAULT_CONCURRENCY;

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    capacity: usize,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Runs `work` for every `(entity, item)` pair and waits for all of them.
    ///
    /// Returns the number of items processed, or [`SsotError::Workers`] carrying every
    /// failure (a panicking worker counts as a failure) after the drain.
    pub async fn run<T, F, Fut>(&self, items: Vec<(String, T)>, work: F) -> Result<usize>
    where
        T: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.capacity));
        let work = Arc::new(work);
        let mut workers = JoinSet::new();

        for (entity, item) in items {
            let semaphore = Arc::clone(&semaphore);
            let work = Arc::clone(&work);
            workers.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (entity, Err(SsotError::Panicked("worker pool".into())));
                };
                // Runs in its own task so a panic surfaces as a JoinError here.
                let outcome = match tokio::spawn((*work)(item)).await {
                    Ok(result) => result,
                    Err(join) if join.is_panic() => Err(SsotError::Panicked(entity.clone())),
                    Err(join) => Err(SsotError::Panicked(format!("{entity} ({join})"))),
                };
                (entity, outcome)
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((entity, Err(error))) => {
                    warn!(entity = %entity, error = %error, "worker failed");
                    failures.push(WorkerFailure { entity, error });
                }
                Err(join) => {
                    warn!(error = %join, "worker task lost");
                    failures.push(WorkerFailure {
                        entity: "<unknown>".into(),
                        error: SsotError::Panicked(join.to_string()),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(total)
        } else {
            Err(AggregateWorkerError { total, failures }.into())
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn items(n: usize) -> Vec<(String, usize)> {
        (0..n).map(|i| (format!("vm-{i}"), i)).collect()
    }

    #[tokio::test]
    async fn failures_are_reported_after_full_drain() {
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);

        let result = WorkerPool::new(50)
            .run(items(200), move |i| {
                let counter = Arc::clone(&counter);
                async move {
                    tokio::time::sleep(Duration::from_millis((i % 7) as u64)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    if i == 3 || i == 100 || i == 199 {
                        return Err(SsotError::invalid_record(format!("bad vm {i}")));
                    }
                    Ok(())
                }
            })
            .await;

        assert_eq!(done.load(Ordering::SeqCst), 200);
        match result {
            Err(SsotError::Workers(agg)) => {
                assert_eq!(agg.total, 200);
                assert_eq!(agg.failures.len(), 3);
                let mut entities: Vec<_> = agg.failures.iter().map(|f| f.entity.as_str()).collect();
                entities.sort();
                assert_eq!(entities, ["vm-100", "vm-199", "vm-3"]);
            }
            other => panic!("expected aggregated failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_capacity() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (r, p) = (Arc::clone(&running), Arc::clone(&peak));

        let processed = WorkerPool::new(4)
            .run(items(40), move |_| {
                let (running, peak) = (Arc::clone(&r), Arc::clone(&p));
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await
            .unwrap();

        assert_eq!(processed, 40);
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn panicking_worker_is_a_failure() {
        let result = WorkerPool::new(2)
            .run(items(3), |i| async move {
                if i == 1 {
                    panic!("boom");
                }
                Ok(())
            })
            .await;

        let Err(SsotError::Workers(agg)) = result else {
            panic!("expected aggregated failure");
        };
        assert_eq!(agg.failures.len(), 1);
        assert_eq!(agg.failures[0].entity, "vm-1");
        assert!(matches!(agg.failures[0].error, SsotError::Panicked(_)));
    }

    #[tokio::test]
    async fn empty_input_is_ok() {
        let processed = WorkerPool::default()
            .run(Vec::<(String, ())>::new(), |_| async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(processed, 0);
    }
}
