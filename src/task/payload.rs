//! Type-erased task payloads.
//!
//! Every payload is wrapped in `catch_unwind` before it is stored, so a
//! panicking task never unwinds into a worker thread.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use futures::channel::oneshot;

use crate::error::TaskError;
use crate::task::ResultHandle;

/// Result of one payload invocation; `Err` holds the panic message.
pub(crate) type Outcome = std::result::Result<(), String>;

pub(crate) enum Payload {
    Once(Box<dyn FnOnce() -> Outcome + Send>),
    Repeat(Box<dyn FnMut() -> Outcome + Send>),
}

impl Payload {
    /// Wrap a one-shot closure whose result is delivered through the returned handle.
    pub(crate) fn once<F, T>(f: F) -> (Self, ResultHandle<T>)
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job = move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f)).map_err(|p| panic_message(&*p));
            let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
            // Receiver gone means the caller dropped the handle
            let _ = tx.send(result.map_err(TaskError::Panicked));
            outcome
        };
        (Self::Once(Box::new(job)), ResultHandle::new(rx))
    }

    /// Wrap a one-shot closure with no result handle.
    #[cfg(test)]
    pub(crate) fn once_detached<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::Once(Box::new(move || {
            panic::catch_unwind(AssertUnwindSafe(f)).map_err(|p| panic_message(&*p))
        }))
    }

    /// Wrap a closure that runs on every firing of a periodic task.
    pub(crate) fn repeat<F>(mut f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::Repeat(Box::new(move || {
            panic::catch_unwind(AssertUnwindSafe(&mut f)).map_err(|p| panic_message(&*p))
        }))
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
