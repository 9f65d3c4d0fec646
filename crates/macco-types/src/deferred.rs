//! Single-threaded deferred results.
//!
//! A lobby operation hands back a [`Deferred`] immediately and keeps the
//! matching [`Resolver`]. The caller attaches a success and a failure
//! continuation with [`Deferred::then`]; whichever fits runs once the
//! resolver fires, on the same thread that drives the main loop.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{MaccoError, Result};

type Continuation<T> = Box<dyn FnOnce(Result<T>)>;

struct Slot<T> {
    outcome: Option<Result<T>>,
    continuation: Option<Continuation<T>>,
}

/// Handle to a result that may not exist yet.
pub struct Deferred<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

/// Completing half of a [`Deferred`].
///
/// Dropping a resolver without calling [`Resolver::resolve`] means the
/// continuations never run.
pub struct Resolver<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

impl<T: 'static> Deferred<T> {
    /// Create an unresolved handle and its resolver.
    pub fn pending() -> (Self, Resolver<T>) {
        let slot = Rc::new(RefCell::new(Slot {
            outcome: None,
            continuation: None,
        }));
        (
            Self {
                slot: Rc::clone(&slot),
            },
            Resolver { slot },
        )
    }

    /// A handle that already succeeded.
    pub fn succeeded(value: T) -> Self {
        let (deferred, resolver) = Self::pending();
        resolver.resolve(Ok(value));
        deferred
    }

    /// A handle that already failed.
    pub fn failed(error: MaccoError) -> Self {
        let (deferred, resolver) = Self::pending();
        resolver.resolve(Err(error));
        deferred
    }

    /// Whether the outcome is known and not yet consumed.
    pub fn is_resolved(&self) -> bool {
        self.slot.borrow().outcome.is_some()
    }

    /// Attach the success and failure continuations.
    ///
    /// Runs one of them immediately if the handle already fired.
    pub fn then<S, F>(self, on_success: S, on_failure: F)
    where
        S: FnOnce(T) + 'static,
        F: FnOnce(MaccoError) + 'static,
    {
        let continuation: Continuation<T> = Box::new(move |outcome| match outcome {
            Ok(value) => on_success(value),
            Err(err) => on_failure(err),
        });

        let outcome = {
            let mut slot = self.slot.borrow_mut();
            match slot.outcome.take() {
                Some(outcome) => outcome,
                None => {
                    slot.continuation = Some(continuation);
                    return;
                },
            }
        };
        continuation(outcome);
    }
}

impl<T> Resolver<T> {
    /// Fire the handle.
    pub fn resolve(self, outcome: Result<T>) {
        let continuation = {
            let mut slot = self.slot.borrow_mut();
            match slot.continuation.take() {
                Some(c) => c,
                None => {
                    slot.outcome = Some(outcome);
                    return;
                },
            }
        };
        continuation(outcome);
    }
}
