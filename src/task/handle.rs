//! Result handles returned by task submission.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::channel::oneshot;

use crate::error::TaskError;

/// The eventual result of a submitted task.
///
/// Block on it with [`ResultHandle::wait`], check it with
/// [`ResultHandle::try_take`], or `.await` it. Dropping the handle does not
/// cancel the task.
#[derive(Debug)]
#[must_use = "dropping a ResultHandle discards the task's result"]
pub struct ResultHandle<T> {
    rx: oneshot::Receiver<Result<T, TaskError>>,
}

impl<T> ResultHandle<T> {
    pub(crate) fn new(rx: oneshot::Receiver<Result<T, TaskError>>) -> Self {
        Self { rx }
    }

    /// A handle that has already failed with [`TaskError::Rejected`].
    pub(crate) fn rejected() -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(TaskError::Rejected));
        Self { rx }
    }

    /// Block the current thread until the task finishes.
    pub fn wait(self) -> Result<T, TaskError> {
        futures::executor::block_on(self)
    }

    /// Take the result if the task has finished; `None` while it is pending or running.
    pub fn try_take(&mut self) -> Option<Result<T, TaskError>> {
        match self.rx.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(TaskError::Discarded)),
        }
    }
}

impl<T> Future for ResultHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut()
            .rx
            .poll_unpin(cx)
            .map(|received| received.unwrap_or(Err(TaskError::Discarded)))
    }
}
