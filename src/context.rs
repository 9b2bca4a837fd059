//! Cancellation contexts
//!
//! Every store operation takes a [`Context`]. A context reports cancelled
//! once its [`CancelHandle`] fires or its deadline passes.
//!
//! ## Signal
//! The cancel signal is a `crossbeam` channel that never carries a message:
//! cancelling drops the only sender, which disconnects every receiver at once.
//! Probing is a non-blocking `try_recv`.
//!
//! ## Contract with the stores
//! Stores check the context before starting work, between short waits for
//! their lock, and again once the lock is held, right before mutating.
//! Cancellation seen at a checkpoint aborts the operation with no side effect. Once a mutation is applied the operation
//! finishes and reports its real outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

use crate::error::{Result, StoreError};

/// Cancellation token passed to every operation. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// Disconnected once cancelled. `None` for contexts with no cancel handle.
    done: Option<Receiver<()>>,
    deadline: Option<Instant>,
    parent: Option<Context>,
}

/// Cancels the context(s) it was created with.
///
/// Dropping the handle also cancels, so bind it (`_handle`, not `_`) for as
/// long as the context should stay live.
#[derive(Debug)]
pub struct CancelHandle {
    sender: Mutex<Option<Sender<()>>>,
}

impl Context {
    /// A context that is never cancelled
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner {
                done: None,
                deadline: None,
                parent: None,
            }),
        }
    }

    /// A fresh cancellable context
    pub fn with_cancel() -> (Self, CancelHandle) {
        Self::background().child_with_cancel()
    }

    /// A cancellable child of `self`; cancelled when either fires
    pub fn child_with_cancel(&self) -> (Self, CancelHandle) {
        let (sender, receiver) = channel::bounded(0);
        let ctx = Self {
            inner: Arc::new(Inner {
                done: Some(receiver),
                deadline: None,
                parent: Some(self.clone()),
            }),
        };
        let handle = CancelHandle {
            sender: Mutex::new(Some(sender)),
        };
        (ctx, handle)
    }

    /// A child of `self` that also expires at `deadline`
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            inner: Arc::new(Inner {
                done: None,
                deadline: Some(deadline),
                parent: Some(self.clone()),
            }),
        }
    }

    /// A child of `self` that expires after `timeout`
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Non-blocking probe
    pub fn is_cancelled(&self) -> bool {
        let inner = &self.inner;

        if let Some(done) = &inner.done {
            if let Err(TryRecvError::Disconnected) = done.try_recv() {
                return true;
            }
        }

        if let Some(deadline) = inner.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }

        match &inner.parent {
            Some(parent) => parent.is_cancelled(),
            None => false,
        }
    }

    /// `Err(StoreError::Cancelled)` if the context is cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(StoreError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// The earliest deadline along the parent chain
    pub fn deadline(&self) -> Option<Instant> {
        let own = self.inner.deadline;
        let parent = self.inner.parent.as_ref().and_then(Context::deadline);
        match (own, parent) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl CancelHandle {
    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.sender.lock().take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.sender.lock().is_none()
    }
}
