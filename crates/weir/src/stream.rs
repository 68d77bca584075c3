//! The consumer-facing [`BridgeStream`] — one consumption step at a time.
//!
//! A `BridgeStream` is obtained at most once per bridge via
//! [`Bridge::stream`](crate::Bridge::stream). Each consumption step
//! evaluates, fresh: pending error first (ahead of any buffered items),
//! then the oldest buffered item, then completion, otherwise the step
//! suspends until a producer call wakes it.
//!
//! # API Styles
//!
//! - [`Stream`]`<Item = Result<T, E>>` — idiomatic consumption with
//!   `StreamExt` combinators; the producer error is yielded once as `Err`,
//!   then the stream is terminated.
//! - [`advance`](BridgeStream::advance) — one explicit step returning the
//!   tagged [`Step`], making cancellation and completion ordinary
//!   control-flow values.
//!
//! # Lifecycle
//!
//! Dropping the stream before it terminates on its own counts as consumer
//! abandonment: the bridge is disposed deterministically (buffer discarded,
//! `disposed` observers fired) rather than leaking a permanently-suspended
//! loop. [`cancel`](BridgeStream::cancel) does the same explicitly.

use std::fmt;
use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio_stream::Stream;

use crate::bridge::Shared;
use crate::error::BoxError;

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// Outcome of one consumption step.
#[derive(Debug, PartialEq, Eq)]
pub enum Step<T, E> {
    /// The oldest buffered item was delivered.
    Item(T),
    /// The bridge was closed and the buffer is drained; normal, error-free
    /// completion.
    Completed,
    /// The producer recorded this error; buffered-but-undelivered items
    /// were discarded.
    Errored(E),
    /// The consumer abandoned the stream via [`BridgeStream::cancel`].
    Abandoned,
}

// ---------------------------------------------------------------------------
// BridgeStream
// ---------------------------------------------------------------------------

/// Pull-based async sequence of the items pushed into a bridge.
///
/// Yields items strictly in push order. The stream terminates — and
/// disposes the bridge — on the first of: a pending producer error, the
/// buffer draining after [`close`](crate::Bridge::close), or consumer
/// abandonment ([`cancel`](BridgeStream::cancel) or drop).
///
/// All fields are `Unpin`, so the stream works directly with
/// `tokio::select!` without explicit pinning.
///
/// # Panics
///
/// All methods on this type panic if the bridge's internal `Mutex` has
/// been poisoned. This should not occur under normal operation.
pub struct BridgeStream<T, E = BoxError> {
    /// State shared with the producer handle.
    shared: Arc<Shared<T, E>>,
    /// Whether the stream has reached a terminal state.
    terminated: bool,
    /// Whether termination was consumer-initiated.
    abandoned: bool,
}

#[allow(clippy::missing_panics_doc)] // All methods panic only on a poisoned Mutex
impl<T, E> BridgeStream<T, E> {
    pub(crate) fn new(shared: Arc<Shared<T, E>>) -> Self {
        Self {
            shared,
            terminated: false,
            abandoned: false,
        }
    }

    /// Performs one consumption step.
    ///
    /// Suspends while the buffer is empty and the bridge is neither closed
    /// nor errored. After a terminal step the result is sticky:
    /// [`Step::Abandoned`] after cancellation, [`Step::Completed`]
    /// otherwise.
    pub async fn advance(&mut self) -> Step<T, E> {
        poll_fn(|cx| self.poll_step(cx)).await
    }

    /// Abandons the stream and disposes the bridge.
    ///
    /// Buffered-but-undelivered items are discarded; no error is reported.
    /// Subsequent [`advance`](BridgeStream::advance) calls return
    /// [`Step::Abandoned`] and `poll_next` returns `None`.
    pub fn cancel(&mut self) {
        if !self.terminated {
            self.terminated = true;
            self.abandoned = true;
            self.shared.dispose();
        }
    }

    /// Returns `true` if the stream has reached a terminal state.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn poll_step(&mut self, cx: &mut Context<'_>) -> Poll<Step<T, E>> {
        if self.terminated {
            return Poll::Ready(if self.abandoned {
                Step::Abandoned
            } else {
                Step::Completed
            });
        }

        let mut state = self.shared.state.lock().unwrap();

        if let Some(error) = state.error.take() {
            drop(state);
            self.terminated = true;
            self.shared.dispose();
            return Poll::Ready(Step::Errored(error));
        }

        if let Some(item) = state.buffer.pop_front() {
            let remaining = state.buffer.len();
            drop(state);
            self.shared.notify_pull(remaining);
            return Poll::Ready(Step::Item(item));
        }

        if state.done {
            drop(state);
            self.terminated = true;
            self.shared.dispose();
            return Poll::Ready(Step::Completed);
        }

        // Buffer empty, not done: park the waker and suspend. Producer
        // calls take it and wake — never wake_by_ref from inside the poll,
        // which would busy-spin.
        match &mut state.waker {
            Some(waker) if waker.will_wake(cx.waker()) => {}
            slot => *slot = Some(cx.waker().clone()),
        }
        Poll::Pending
    }
}

impl<T, E> Stream for BridgeStream<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // All fields are Unpin, so get_mut is safe.
        let this = self.get_mut();

        if this.terminated {
            return Poll::Ready(None);
        }

        match this.poll_step(cx) {
            Poll::Ready(Step::Item(item)) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Step::Errored(error)) => Poll::Ready(Some(Err(error))),
            Poll::Ready(Step::Completed | Step::Abandoned) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> Drop for BridgeStream<T, E> {
    fn drop(&mut self) {
        if !self.terminated {
            self.shared.dispose();
        }
    }
}

impl<T, E> fmt::Debug for BridgeStream<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeStream")
            .field("terminated", &self.terminated)
            .field("abandoned", &self.abandoned)
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
