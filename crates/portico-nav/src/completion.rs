//! Single-threaded oneshot completions for navigation operations.
//!
//! Navigation operations return a [`Completion`] the caller can await;
//! the controller resolves the paired [`CompletionHandle`] when the
//! transition ends or the modal closes. Everything runs on the UI
//! thread, so the shared state is `Rc<RefCell<..>>`, not a channel.
//!
//! # Invariants
//!
//! 1. A handle resolves at most once; a second resolve is a no-op.
//! 2. Dropping the handle unresolved resolves the completion with the
//!    type's default, so callers never hang on an abandoned operation.
//! 3. `poll` after resolution keeps returning the value's clone.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

struct Shared<T> {
    value: Option<T>,
    waker: Option<Waker>,
    resolved: bool,
}

/// The awaitable half of a navigation operation.
pub struct Completion<T> {
    inner: Rc<RefCell<Shared<T>>>,
}

/// The controller-held resolver half.
pub struct CompletionHandle<T: Default> {
    inner: Rc<RefCell<Shared<T>>>,
}

/// Create a connected completion/handle pair.
pub fn completion_pair<T: Default>() -> (Completion<T>, CompletionHandle<T>) {
    let inner = Rc::new(RefCell::new(Shared {
        value: None,
        waker: None,
        resolved: false,
    }));
    (
        Completion {
            inner: Rc::clone(&inner),
        },
        CompletionHandle { inner },
    )
}

impl<T> Completion<T> {
    /// A completion that is already resolved with `value`.
    pub fn ready(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Shared {
                value: Some(value),
                waker: None,
                resolved: true,
            })),
        }
    }

    /// Whether the operation has finished.
    pub fn is_resolved(&self) -> bool {
        self.inner.borrow().resolved
    }

    /// Take the value if already resolved, without an executor.
    pub fn try_take(&self) -> Option<T> {
        self.inner.borrow_mut().value.take()
    }
}

impl<T: Default> CompletionHandle<T> {
    /// Resolve the completion. Later resolves are no-ops.
    pub fn resolve(&self, value: T) {
        let waker = {
            let mut shared = self.inner.borrow_mut();
            if shared.resolved {
                return;
            }
            shared.resolved = true;
            shared.value = Some(value);
            shared.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl<T: Default> Drop for CompletionHandle<T> {
    fn drop(&mut self) {
        self.resolve(T::default());
    }
}

impl<T> Future for Completion<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut shared = self.inner.borrow_mut();
        if let Some(value) = shared.value.take() {
            Poll::Ready(value)
        } else {
            shared.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
