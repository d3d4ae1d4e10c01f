//! Callback-style dispatch for callers that prefer handlers over `.await`.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Error, Result};

/// Runs `call` on the tokio runtime and invokes exactly one of the handlers
/// when it completes.
///
/// Handlers run on whichever runtime worker finished the call. Concurrent
/// dispatches complete independently, in no particular order.
///
/// # Example
///
/// ```rust,ignore
/// use cogsdk_rest::dispatch;
///
/// let handle = dispatch(
///     async move { classifier.classify("10D41B-nlc-1", "hello").await },
///     |resp| println!("top class: {}", resp.payload.top_class),
///     |err| eprintln!("classify failed: {err}"),
/// );
/// handle.await?;
/// ```
pub fn dispatch<T, Fut, S, F>(call: Fut, on_success: S, on_failure: F) -> JoinHandle<()>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    S: FnOnce(T) + Send + 'static,
    F: FnOnce(Error) + Send + 'static,
{
    tokio::spawn(async move {
        match call.await {
            Ok(value) => on_success(value),
            Err(err) => {
                debug!(error = %err, "dispatching failure");
                on_failure(err)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_success_handler() {
        let (tx, rx) = oneshot::channel();
        dispatch(
            async { Ok::<_, Error>(7) },
            move |v| {
                let _ = tx.send(v);
            },
            |_| panic!("failure handler must not run"),
        )
        .await
        .unwrap();
        assert_eq!(rx.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_failure_handler() {
        let (tx, rx) = oneshot::channel();
        dispatch(
            async { Err::<u32, _>(Error::service(500, "boom")) },
            |_| panic!("success handler must not run"),
            move |e| {
                let _ = tx.send(e);
            },
        )
        .await
        .unwrap();
        assert!(rx.await.unwrap().is_server_error());
    }

    #[tokio::test]
    async fn test_independent_completion() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let slow_tx = tx.clone();
        let slow = dispatch(
            async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok::<_, Error>("slow")
            },
            move |v| {
                let _ = slow_tx.send(v);
            },
            |_| {},
        );
        let fast = dispatch(
            async { Ok::<_, Error>("fast") },
            move |v| {
                let _ = tx.send(v);
            },
            |_| {},
        );

        fast.await.unwrap();
        assert_eq!(rx.recv().await, Some("fast"));
        slow.await.unwrap();
        assert_eq!(rx.recv().await, Some("slow"));
    }
}
