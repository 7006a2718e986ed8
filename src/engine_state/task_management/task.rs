//! # Task System Core Types
//!
//! This module defines the building blocks of the task system:
//!
//! - [`Task`]: a self-contained unit of work executed on a worker thread
//! - [`TaskHandle`]: the caller's side of a submitted job, which yields the
//!   job's result exactly once
//!
//! ## Task Lifecycle
//! 1. A job is submitted via [`TaskManager::submit`](super::TaskManager::submit)
//!    or [`TaskManager::publish_task`](super::TaskManager::publish_task), which
//!    returns a [`TaskHandle`]
//! 2. A worker thread runs the job and sends its return value down a
//!    [`futures::channel::oneshot`] channel
//! 3. The owner polls [`TaskHandle::try_take`] each pass, or awaits the handle
//!    as a [`Future`]
//!
//! ## Failure
//! If a job panics, or is dropped before it runs because the manager shut
//! down, its sender is dropped unsent and the handle resolves to
//! [`StreamingError::TaskPanicked`] instead of hanging forever.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use futures::{
    channel::oneshot::{self, Canceled, Receiver, Sender},
    FutureExt,
};

use crate::error::StreamingError;

/// A unit of work that can be executed on a worker thread.
///
/// Tasks own everything they need. Shared state is reached through
/// [`MtResource`](crate::core::MtResource) handles captured at construction,
/// never through references into the scheduler.
pub trait Task: Send + 'static {
    type Output: Send + 'static;

    /// Performs the work. Runs on a worker thread.
    fn process(self) -> Self::Output;
}

/// The result side of a submitted job.
///
/// The result can be taken once, either by [`TaskHandle::try_take`] or by
/// awaiting the handle. Dropping a handle does not cancel the job; its result
/// is simply discarded.
pub struct TaskHandle<T> {
    receiver: Receiver<T>,
    taken: bool,
}

/// Creates a connected sender and handle.
pub(crate) fn task_pair<T>() -> (Sender<T>, TaskHandle<T>) {
    let (sender, receiver) = oneshot::channel();
    (
        sender,
        TaskHandle {
            receiver,
            taken: false,
        },
    )
}

fn to_task_result<T>(result: Result<T, Canceled>) -> Result<T, StreamingError> {
    result.map_err(|Canceled| StreamingError::TaskPanicked)
}

impl<T> TaskHandle<T> {
    /// Takes the result if the job has finished.
    ///
    /// Returns `None` while the job is running and on every call after the
    /// result has been taken.
    pub fn try_take(&mut self) -> Option<Result<T, StreamingError>> {
        if self.taken {
            return None;
        }

        let result = self.receiver.try_recv().transpose()?;
        self.taken = true;
        Some(to_task_result(result))
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, StreamingError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        assert!(!self.taken, "TaskHandle polled after its result was taken");

        let poll = self.receiver.poll_unpin(cx);
        if poll.is_ready() {
            self.taken = true;
        }
        poll.map(to_task_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_result_is_taken_once() {
        let (sender, mut handle) = task_pair();
        assert!(handle.try_take().is_none());

        sender.send(7).unwrap();

        assert!(matches!(handle.try_take(), Some(Ok(7))));
        assert!(handle.try_take().is_none());
        assert!(handle.try_take().is_none());
    }

    #[test]
    fn test_dropped_sender_reports_panic() {
        let (sender, mut handle) = task_pair::<u32>();
        drop(sender);

        assert!(matches!(handle.try_take(), Some(Err(StreamingError::TaskPanicked))));
        assert!(handle.try_take().is_none());
    }

    #[test]
    fn test_await_from_another_thread() {
        let (sender, handle) = task_pair();
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            sender.send(String::from("done")).unwrap();
        });

        let result = pollster::block_on(handle);
        worker.join().unwrap();

        assert_eq!(result.unwrap(), "done");
    }

    #[test]
    fn test_await_sender_dropped_on_panicking_thread() {
        let (sender, handle) = task_pair::<u8>();
        let worker = thread::spawn(move || {
            let _sender = sender;
            thread::sleep(Duration::from_millis(10));
            panic!("job failed");
        });

        assert!(matches!(
            pollster::block_on(handle),
            Err(StreamingError::TaskPanicked)
        ));
        assert!(worker.join().is_err());
    }
}
