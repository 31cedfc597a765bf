//! Cancellation signalling for in-flight scoring calls.
//!
//! A single [`CancelHandle`] is held by the caller; cloned [`CancelToken`]s
//! travel with each batch request. Both the retry delay and the backend
//! network call select against the token, so a fired signal surfaces as
//! `ScoreError::Cancelled` promptly instead of after the full wait.

use tokio::sync::watch;

/// A cloneable token that observes a cancellation signal.
///
/// Tokens created via [`CancelToken::none`] can never fire; this is the
/// default for contexts that carry no external deadline.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// Creates a token that is never cancelled.
    pub fn none() -> Self {
        Self { rx: None }
    }

    /// Returns `true` if the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolves once the signal fires.
    ///
    /// If the handle was dropped without firing, the future stays pending
    /// forever — the call can no longer be cancelled.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            std::future::pending::<()>().await;
            return;
        };

        let mut rx = rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::none()
    }
}

/// The sending side of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Creates a fresh handle/token pair.
    pub fn new() -> (Self, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelToken { rx: Some(rx) })
    }

    /// Fires the signal. All derived tokens observe it.
    pub fn cancel(&self) {
        // Receivers may already be gone; nothing to do then.
        let _ = self.tx.send(true);
    }

    /// Returns another token observing this handle.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: Some(self.tx.subscribe()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_token_starts_uncancelled() {
        let (_handle, token) = CancelHandle::new();
        assert!(!token.is_cancelled());
        assert!(!CancelToken::none().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_observed_by_clones() {
        let (handle, token) = CancelHandle::new();
        let clone = token.clone();

        handle.cancel();

        assert!(token.is_cancelled());
        assert!(clone.is_cancelled());
        assert!(handle.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let (handle, token) = CancelHandle::new();

        let waiter = tokio::spawn(async move { token.cancelled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancelled() should resolve after cancel()")
            .unwrap();
    }

    #[tokio::test]
    async fn test_none_token_never_fires() {
        let token = CancelToken::none();
        let result =
            tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(result.is_err());
    }
}
