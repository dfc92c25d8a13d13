//! Scoped cancellation for remote catalog calls
//!
//! A [`CallContext`] is handed down from the caller of a lookup to every
//! catalog client call it triggers. Each remote call runs under a child
//! scope, so cancelling the caller aborts whatever call is in flight,
//! while cancelling a child never reaches the parent.
//!
//! ```text
//! caller ctx ──► child (source A call) ──► dropped: cancelled
//!            └─► child (source B call) ──► dropped: cancelled
//! ```

use futures::future::{select_all, FutureExt};
use std::sync::Arc;
use tokio::sync::watch;

/// Cancellable call context threaded through catalog queries
#[derive(Debug, Clone)]
pub struct CallContext {
    own: Arc<watch::Sender<bool>>,
    ancestors: Vec<Arc<watch::Sender<bool>>>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}

impl CallContext {
    /// A root context that is only cancelled explicitly
    pub fn background() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            own: Arc::new(tx),
            ancestors: Vec::new(),
        }
    }

    /// Derive a child scope that is cancelled whenever this context is
    pub fn child(&self) -> Self {
        let (tx, _) = watch::channel(false);
        let mut ancestors = Vec::with_capacity(self.ancestors.len() + 1);
        ancestors.push(Arc::clone(&self.own));
        ancestors.extend(self.ancestors.iter().cloned());
        Self {
            own: Arc::new(tx),
            ancestors,
        }
    }

    /// Cancel this scope and every scope derived from it
    pub fn cancel(&self) {
        self.own.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.own.borrow() || self.ancestors.iter().any(|tx| *tx.borrow())
    }

    /// Resolves once this scope or any ancestor is cancelled
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }

        let waits = std::iter::once(&self.own)
            .chain(self.ancestors.iter())
            .map(|tx| {
                let mut rx = tx.subscribe();
                async move {
                    // Senders live as long as `self`, so this only returns on cancel.
                    let _ = rx.wait_for(|cancelled| *cancelled).await;
                }
                .boxed()
            });

        select_all(waits).await;
    }

    /// Guard that cancels this scope when dropped
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop { ctx: self.clone() }
    }
}

/// Cancels its context on drop; returned by [`CallContext::drop_guard`]
#[derive(Debug)]
pub struct CancelOnDrop {
    ctx: CallContext,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.ctx.cancel();
    }
}
