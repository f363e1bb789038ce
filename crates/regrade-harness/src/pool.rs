//! Bounded worker pool for independent tasks.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// Runs one task per item with at most `max_concurrent` in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    max_concurrent: usize,
}

impl WorkerPool {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run `task` over `items`.
    ///
    /// Results come back at the index of their input, whatever order the
    /// tasks finished in. When `shutdown` resolves, every in-flight task is
    /// aborted and its slot stays `None`; a task that panicked also leaves
    /// `None`.
    pub async fn run<T, R, F, Fut, S>(&self, items: Vec<T>, task: F, shutdown: S) -> Vec<Option<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        S: Future,
    {
        let mut slots: Vec<Option<R>> = items.iter().map(|_| None).collect();
        let task = Arc::new(task);
        let sem = Arc::new(Semaphore::new(self.max_concurrent));

        let mut join_set = JoinSet::new();
        for (idx, item) in items.into_iter().enumerate() {
            let task = Arc::clone(&task);
            let sem = Arc::clone(&sem);
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                (idx, task(item).await)
            });
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                joined = join_set.join_next() => match joined {
                    Some(Ok((idx, result))) => slots[idx] = Some(result),
                    Some(Err(e)) => warn!(error = %e, "Worker task did not complete"),
                    None => break,
                },
                _ = &mut shutdown => {
                    warn!(in_flight = join_set.len(), "Shutdown requested, aborting workers");
                    join_set.abort_all();
                    while let Some(joined) = join_set.join_next().await {
                        if let Ok((idx, result)) = joined {
                            slots[idx] = Some(result);
                        }
                    }
                    break;
                }
            }
        }

        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_follow_input_order() {
        let pool = WorkerPool::new(4);
        let items: Vec<u64> = vec![40, 10, 30, 0, 20];
        let results = pool
            .run(
                items,
                |delay| async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    delay * 2
                },
                futures::future::pending::<()>(),
            )
            .await;
        assert_eq!(
            results,
            vec![Some(80), Some(20), Some(60), Some(0), Some(40)]
        );
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
        let results = pool
            .run(
                (0..8).collect::<Vec<u32>>(),
                move |i| {
                    let active = Arc::clone(&a);
                    let peak = Arc::clone(&p);
                    async move {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                        i
                    }
                },
                futures::future::pending::<()>(),
            )
            .await;

        assert_eq!(results.iter().flatten().count(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_shutdown_leaves_unfinished_slots_empty() {
        let pool = WorkerPool::new(4);
        let results = pool
            .run(
                vec![0u64, 10_000],
                |delay| async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    delay
                },
                tokio::time::sleep(Duration::from_millis(200)),
            )
            .await;
        assert_eq!(results, vec![Some(0), None]);
    }

    #[test]
    fn test_zero_workers_rounds_up() {
        assert_eq!(WorkerPool::new(0).max_concurrent(), 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let results = WorkerPool::new(3)
            .run(
                Vec::<u8>::new(),
                |x| async move { x },
                futures::future::pending::<()>(),
            )
            .await;
        assert!(results.is_empty());
    }
}
