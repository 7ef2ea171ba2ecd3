//! Bounded polling for long-running generation jobs.

use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

use super::errors::GatewayError;

/// Poll `poll` at a fixed `interval` until it yields a completed value.
///
/// Each iteration waits out the interval, then performs one status poll;
/// every wait is a suspend point that honours `cancel`, so a waiting UI
/// stays responsive and can abort between polls. The loop is bounded by
/// `max_attempts` rather than running forever.
///
/// # Errors
///
/// Returns [`GatewayError::Cancelled`] when `cancel` fires between polls,
/// [`GatewayError::TimedOut`] when `max_attempts` polls complete without a
/// result, or the first error the poll function itself produces.
pub async fn poll_until_complete<F, Fut, T>(
    interval: Duration,
    max_attempts: u32,
    cancel: &CancellationToken,
    mut poll: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, GatewayError>>,
{
    for _ in 0..max_attempts {
        tokio::select! {
            () = cancel.cancelled() => return Err(GatewayError::Cancelled),
            () = tokio::time::sleep(interval) => {}
        }

        if let Some(value) = poll().await? {
            return Ok(value);
        }
    }

    Err(GatewayError::TimedOut {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use testresult::TestResult;

    use super::*;

    const INTERVAL: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn three_pending_polls_then_done_polls_exactly_four_times() -> TestResult {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let counter = Arc::clone(&calls);
        let result = poll_until_complete(INTERVAL, 10, &cancel, move || {
            let counter = Arc::clone(&counter);
            async move {
                let seen = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if seen < 4 {
                    Ok(None)
                } else {
                    Ok(Some("media-ref"))
                }
            }
        })
        .await?;

        assert_eq!(result, "media-ref");
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_the_budget_times_out() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let counter = Arc::clone(&calls);
        let result: Result<&str, GatewayError> =
            poll_until_complete(INTERVAL, 3, &cancel, move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            })
            .await;

        assert!(
            matches!(result, Err(GatewayError::TimedOut { attempts: 3 })),
            "expected TimedOut, got {result:?}"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_wins_before_the_first_poll() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<&str, GatewayError> =
            poll_until_complete(INTERVAL, 10, &cancel, || async { Ok(Some("unreached")) }).await;

        assert!(
            matches!(result, Err(GatewayError::Cancelled)),
            "expected Cancelled, got {result:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn poll_errors_propagate_immediately() {
        let cancel = CancellationToken::new();

        let result: Result<&str, GatewayError> =
            poll_until_complete(INTERVAL, 10, &cancel, || async {
                Err(GatewayError::UnexpectedResponse("boom".to_owned()))
            })
            .await;

        assert!(
            matches!(result, Err(GatewayError::UnexpectedResponse(_))),
            "expected UnexpectedResponse, got {result:?}"
        );
    }
}
