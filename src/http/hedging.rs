//! Request hedging: race a duplicate attempt once the first one is slow.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use futures_util::future::{Either, select};
use log::debug;

/// Run `attempt`, and if it has not finished after `after`, run it a second
/// time and return whichever attempt finishes first.
///
/// Exactly one result is returned. The other attempt, if any, is dropped
/// when this function returns, which cancels whatever it had in flight.
/// The first attempt to finish wins even if it failed; there is no
/// preference for success and no preference for the original attempt.
///
/// Dropping the returned future cancels both attempts.
///
/// `attempt` must be safe to run twice concurrently (idempotent, no
/// side effects).
pub async fn hedge<F, Fut, T>(after: Duration, attempt: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let first = attempt();
    tokio::pin!(first);
    let delay = tokio::time::sleep(after);
    tokio::pin!(delay);

    let first = match select(first, delay).await {
        Either::Left((result, _)) => return result,
        Either::Right(((), first)) => first,
    };

    debug!("No response after {:?}, hedging with a second attempt", after);
    let second = attempt();
    tokio::pin!(second);

    match select(first, second).await {
        Either::Left((result, _)) | Either::Right((result, _)) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::time::{Instant, sleep};

    /// Sets the flag when dropped before `completed` was set.
    struct CancelProbe {
        completed: bool,
        cancelled: Arc<AtomicBool>,
    }

    impl Drop for CancelProbe {
        fn drop(&mut self) {
            if !self.completed {
                self.cancelled.store(true, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_fast_first_attempt_never_hedges() {
        let calls = Arc::new(AtomicUsize::new(0));

        let result = hedge(Duration::from_millis(200), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>("fast")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "fast");
        // Give a would-be second attempt time to start.
        sleep(Duration::from_millis(300)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_first_attempt_is_hedged_and_second_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let first_cancelled = Arc::new(AtomicBool::new(false));

        let started = Instant::now();
        let result = hedge(Duration::from_millis(50), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let cancelled = first_cancelled.clone();
            async move {
                if n == 0 {
                    let mut probe = CancelProbe {
                        completed: false,
                        cancelled,
                    };
                    sleep(Duration::from_secs(10)).await;
                    probe.completed = true;
                    Ok("first")
                } else {
                    Ok("second")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "second");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(first_cancelled.load(Ordering::SeqCst));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_first_attempt_can_still_win_after_hedge() {
        let calls = Arc::new(AtomicUsize::new(0));
        let second_cancelled = Arc::new(AtomicBool::new(false));

        let result = hedge(Duration::from_millis(30), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let cancelled = second_cancelled.clone();
            async move {
                if n == 0 {
                    sleep(Duration::from_millis(80)).await;
                    Ok("first")
                } else {
                    let mut probe = CancelProbe {
                        completed: false,
                        cancelled,
                    };
                    sleep(Duration::from_secs(10)).await;
                    probe.completed = true;
                    Ok("second")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "first");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(second_cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_first_to_finish_wins_even_when_failing() {
        let calls = Arc::new(AtomicUsize::new(0));

        let result: Result<&str> = hedge(Duration::from_millis(30), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    sleep(Duration::from_secs(10)).await;
                    Ok("slow success")
                } else {
                    Err(anyhow!("fast failure"))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap_err().to_string(), "fast failure");
    }

    #[tokio::test]
    async fn test_early_failure_is_returned_without_hedging() {
        let calls = Arc::new(AtomicUsize::new(0));

        let result: Result<()> = hedge(Duration::from_millis(200), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow!("connection refused")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropping_the_call_cancels_both_attempts() {
        let cancelled = Arc::new(AtomicUsize::new(0));

        let call = hedge(Duration::from_millis(20), || {
            let cancelled = cancelled.clone();
            async move {
                struct Guard(Arc<AtomicUsize>);
                impl Drop for Guard {
                    fn drop(&mut self) {
                        self.0.fetch_add(1, Ordering::SeqCst);
                    }
                }
                let _guard = Guard(cancelled);
                sleep(Duration::from_secs(10)).await;
                Ok::<_, anyhow::Error>(())
            }
        });

        let outcome = tokio::time::timeout(Duration::from_millis(100), call).await;
        assert!(outcome.is_err());
        assert_eq!(cancelled.load(Ordering::SeqCst), 2);
    }
}
