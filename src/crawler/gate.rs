//! Bounded admission for page fetches

use crate::CrawlError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Limits how many fetches run at the same time
///
/// However many crawl branches are open, at most `capacity` tasks are inside
/// [`run`](Self::run) at once. The rest wait in the semaphore's queue.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Creates a gate with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of free slots right now
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free slot, then runs the task while holding it
    ///
    /// The slot is released when the task finishes, fails, or when the
    /// returned future is dropped mid-flight.
    pub async fn run<F, Fut, T>(&self, task: F) -> Result<T, CrawlError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CrawlError>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| CrawlError::GateClosed)?;
        task().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.capacity(), 1);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_never_exceeds_capacity() {
        let gate = ConcurrencyGate::new(3);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let gate = gate.clone();
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                gate.run(|| async {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), CrawlError>(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(gate.available(), 3);
    }

    #[tokio::test]
    async fn test_slot_released_on_failure() {
        let gate = ConcurrencyGate::new(1);
        let result: Result<(), CrawlError> = gate
            .run(|| async {
                Err::<(), CrawlError>(CrawlError::from(FetchError::Timeout {
                    url: "https://example.com".to_string(),
                }))
            })
            .await;

        assert!(matches!(result, Err(CrawlError::Fetch(_))));
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_slot_released_when_task_is_dropped() {
        let gate = ConcurrencyGate::new(1);
        let pending = gate.run(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<(), CrawlError>(())
        });

        let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert_eq!(gate.available(), 1);
    }
}
