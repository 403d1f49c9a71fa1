//! Cancellable delayed work.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs a future once after a delay unless cancelled first.
///
/// Cancellation only covers the waiting period. Once the delay has
/// elapsed the work runs to completion. Dropping the task cancels it.
#[derive(Debug)]
pub struct DelayedTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl DelayedTask {
    pub fn spawn<F>(delay: Duration, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                _ = tokio::time::sleep(delay) => work.await,
            }
        });
        Self { token, handle }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
