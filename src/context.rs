//! Operation context
//!
//! Carries the host's cancellation signal into every HTTP call and poll
//! sleep. Clones share the same signal.

use crate::error::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Context {
    cancel: Arc<watch::Sender<bool>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            cancel: Arc::new(tx),
        }
    }

    /// Signal cancellation to every holder of this context
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once the context is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        // the sender lives as long as self, so this only ends on cancellation
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Run a future unless the context is cancelled first
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            res = fut => res,
            _ = self.cancelled() => Err(Error::Cancelled),
        }
    }

    /// Sleep for `dur`, returning early with [`Error::Cancelled`]
    pub async fn sleep(&self, dur: std::time::Duration) -> Result<()> {
        self.run(async {
            tokio::time::sleep(dur).await;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = Context::new();
        let v = ctx.run(async { Ok(7) }).await.unwrap();
        assert_eq!(v, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_sleep() {
        let ctx = Context::new();
        let other = ctx.clone();
        let handle = tokio::spawn(async move { other.sleep(Duration::from_secs(3600)).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        ctx.cancel();
        let res = handle.await.unwrap();
        assert!(matches!(res, Err(Error::Cancelled)));
    }

    #[test]
    fn test_already_cancelled() {
        let ctx = Context::new();
        ctx.cancel();
        let res: Result<()> = tokio_test::block_on(ctx.run(async { Ok(()) }));
        assert!(matches!(res, Err(Error::Cancelled)));
    }
}
