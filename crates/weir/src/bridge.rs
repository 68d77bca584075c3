//! The producer-facing [`Bridge`] handle and the state shared with its
//! stream.
//!
//! A bridge decouples producer timing from consumer timing: the producer
//! delivers items one at a time with synchronous, never-blocking calls
//! ([`push`](Bridge::push), [`fail`](Bridge::fail), [`close`](Bridge::close))
//! while a single consumer drains them as an async stream obtained once via
//! [`stream`](Bridge::stream). Items are buffered without bound — the
//! producer is never throttled; memory is bounded only by how quickly the
//! consumer pulls.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tokio_stream::StreamExt;
//! use weir::Bridge;
//!
//! let bridge = Bridge::<u64>::new();
//!
//! // Producer side — from any callback context, any thread.
//! bridge.push(1);
//! bridge.push(2);
//! bridge.close();
//!
//! // Consumer side — at most once per bridge.
//! let mut items = bridge.stream()?;
//! while let Some(item) = items.next().await {
//!     process(item?);
//! }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::task::Waker;

use crate::error::{BoxError, BridgeError};
use crate::observer::{BridgeObserver, Observers};
use crate::stream::BridgeStream;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Mutable state owned by a bridge, shared with its stream.
pub(crate) struct State<T, E> {
    /// Items awaiting delivery, in push order.
    pub(crate) buffer: VecDeque<T>,
    /// Pending producer error. Once set, never overwritten; delivered ahead
    /// of any buffered items at the next consumption step.
    pub(crate) error: Option<E>,
    /// Set once by `close`; never cleared.
    pub(crate) done: bool,
    /// True once the stream has been taken.
    pub(crate) consumed: bool,
    /// Terminal flag; no state transitions once set.
    pub(crate) disposed: bool,
    /// Waker of the consumer task, parked while the buffer is empty and the
    /// bridge is not done.
    pub(crate) waker: Option<Waker>,
    /// Registered notification callbacks.
    pub(crate) observers: Observers,
}

/// State shared between a [`Bridge`] and its [`BridgeStream`].
pub(crate) struct Shared<T, E> {
    pub(crate) state: Mutex<State<T, E>>,
}

impl<T, E> Shared<T, E> {
    /// Marks the bridge disposed, discards the buffer, and runs the
    /// `disposed` callbacks. Idempotent.
    pub(crate) fn dispose(&self) {
        let callbacks = {
            let mut state = self.state.lock().unwrap();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.buffer.clear();
            state.waker = None;
            state.observers.pull.clear();
            std::mem::take(&mut state.observers.disposed)
        };
        tracing::debug!("bridge disposed");
        for callback in callbacks {
            callback();
        }
    }

    /// Runs the `pull` callbacks with the remaining buffer length.
    ///
    /// Callbacks are taken out of the state and invoked without the lock
    /// held; registrations made from inside a callback land at the tail.
    pub(crate) fn notify_pull(&self, remaining: usize) {
        let mut callbacks = std::mem::take(&mut self.state.lock().unwrap().observers.pull);
        for callback in &mut callbacks {
            callback(remaining);
        }
        let mut state = self.state.lock().unwrap();
        let added = std::mem::replace(&mut state.observers.pull, callbacks);
        state.observers.pull.extend(added);
    }
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

/// Push-to-pull bridge between a synchronous producer and one async
/// consumer.
///
/// Items pushed into the bridge are buffered in FIFO order and drained by
/// the [`BridgeStream`] obtained from [`stream`](Bridge::stream). Producer
/// calls never block and wake a suspended consumer; a pending error set by
/// [`fail`](Bridge::fail) takes delivery priority over buffered items.
///
/// The stream can be taken at most once. When it reaches a terminal state —
/// drained-and-closed, errored, or abandoned by the consumer — the bridge
/// disposes itself: the buffer is discarded, `disposed` observers fire
/// exactly once, and all further producer calls become no-ops.
///
/// # Panics
///
/// All methods on this type panic if the internal `Mutex` has been poisoned
/// (i.e., a thread panicked while holding the lock). This should not occur
/// under normal operation.
pub struct Bridge<T, E = BoxError> {
    shared: Arc<Shared<T, E>>,
}

#[allow(clippy::missing_panics_doc)] // All methods panic only on a poisoned Mutex
impl<T, E> Bridge<T, E> {
    /// Creates a new, empty, live bridge.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    buffer: VecDeque::new(),
                    error: None,
                    done: false,
                    consumed: false,
                    disposed: false,
                    waker: None,
                    observers: Observers::default(),
                }),
            }),
        }
    }

    /// Appends an item to the buffer and wakes a suspended consumer.
    ///
    /// Returns the new buffer length, or `None` with no effect if the item
    /// can never be delivered: the bridge is closed, an error is pending,
    /// or the bridge is disposed.
    ///
    /// Never blocks; safe to call from any context, including nested inside
    /// other event callbacks.
    pub fn push(&self, item: T) -> Option<usize> {
        let (len, waker) = {
            let mut state = self.shared.state.lock().unwrap();
            if state.done || state.disposed || state.error.is_some() {
                return None;
            }
            state.buffer.push_back(item);
            (state.buffer.len(), state.waker.take())
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        Some(len)
    }

    /// Records an error and wakes a suspended consumer.
    ///
    /// The next consumption step observes the error ahead of any buffered
    /// items, which are then discarded. Only the first error is kept;
    /// ignored once the bridge is closed or disposed.
    pub fn fail(&self, error: E) {
        let waker = {
            let mut state = self.shared.state.lock().unwrap();
            if state.done || state.disposed || state.error.is_some() {
                return;
            }
            state.error = Some(error);
            state.waker.take()
        };
        tracing::debug!("bridge error recorded");
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Marks the bridge as done and wakes a suspended consumer, so the
    /// stream completes once the buffer drains instead of suspending
    /// forever. Idempotent.
    pub fn close(&self) {
        let waker = {
            let mut state = self.shared.state.lock().unwrap();
            if state.done || state.disposed {
                return;
            }
            state.done = true;
            state.waker.take()
        };
        tracing::debug!("bridge closed");
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Takes the item stream for this bridge.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AlreadyConsumed`] if the stream has already
    /// been taken — each bridge supports exactly one consumer.
    pub fn stream(&self) -> Result<BridgeStream<T, E>, BridgeError> {
        let mut state = self.shared.state.lock().unwrap();
        if state.consumed {
            return Err(BridgeError::AlreadyConsumed);
        }
        state.consumed = true;
        drop(state);
        Ok(BridgeStream::new(Arc::clone(&self.shared)))
    }

    /// Registers a callback fired once per delivered item, after removal
    /// from the buffer, with the remaining buffer length.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AlreadyDisposed`] if the bridge has already
    /// been disposed.
    pub fn on_pull<F>(&self, callback: F) -> Result<(), BridgeError>
    where
        F: FnMut(usize) + Send + 'static,
    {
        let mut state = self.shared.state.lock().unwrap();
        if state.disposed {
            return Err(BridgeError::AlreadyDisposed);
        }
        state.observers.pull.push(Box::new(callback));
        Ok(())
    }

    /// Registers a callback fired exactly once, at the moment of disposal
    /// (drained-and-closed, errored, or abandoned by the consumer).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AlreadyDisposed`] if the bridge has already
    /// been disposed.
    pub fn on_disposed<F>(&self, callback: F) -> Result<(), BridgeError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.shared.state.lock().unwrap();
        if state.disposed {
            return Err(BridgeError::AlreadyDisposed);
        }
        state.observers.disposed.push(Box::new(callback));
        Ok(())
    }

    /// Registers a [`BridgeObserver`] for both notifications.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AlreadyDisposed`] if the bridge has already
    /// been disposed.
    pub fn observe<O: BridgeObserver>(&self, observer: O) -> Result<(), BridgeError> {
        let observer = Arc::new(Mutex::new(observer));
        let pull = Arc::clone(&observer);
        self.on_pull(move |remaining| pull.lock().unwrap().on_pull(remaining))?;
        self.on_disposed(move || observer.lock().unwrap().on_disposed())
    }

    /// Returns the number of buffered, not-yet-delivered items.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.lock().unwrap().buffer.len()
    }

    /// Returns `true` if the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().unwrap().buffer.is_empty()
    }

    /// Returns `true` once [`close`](Bridge::close) has been called.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().unwrap().done
    }

    /// Returns `true` once the stream has been taken.
    #[inline]
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.shared.state.lock().unwrap().consumed
    }

    /// Returns `true` once the bridge has reached its terminal state.
    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.state.lock().unwrap().disposed
    }
}

impl<T, E> Default for Bridge<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning returns another handle to the same bridge, sharing its buffer,
/// flags, and observers. The single-consumer constraint is unaffected: the
/// stream can still be taken only once across all handles.
impl<T, E> Clone for Bridge<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for Bridge<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock().unwrap();
        f.debug_struct("Bridge")
            .field("len", &state.buffer.len())
            .field("closed", &state.done)
            .field("consumed", &state.consumed)
            .field("disposed", &state.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio_stream::StreamExt;

    use super::*;

    fn bridge() -> Bridge<i32, &'static str> {
        Bridge::new()
    }

    // --- Producer surface ---

    #[test]
    fn test_push_returns_new_length() {
        let bridge = bridge();
        assert_eq!(bridge.push(1), Some(1));
        assert_eq!(bridge.push(2), Some(2));
        assert_eq!(bridge.len(), 2);
        assert!(!bridge.is_empty());
    }

    #[test]
    fn test_push_after_close_is_ignored() {
        let bridge = bridge();
        bridge.close();
        assert_eq!(bridge.push(1), None);
        assert!(bridge.is_empty());
    }

    #[test]
    fn test_push_after_fail_is_ignored() {
        let bridge = bridge();
        bridge.push(1);
        bridge.fail("boom");
        assert_eq!(bridge.push(2), None);
        assert_eq!(bridge.len(), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let bridge = bridge();
        bridge.close();
        bridge.close();
        assert!(bridge.is_closed());
    }

    #[test]
    fn test_cloned_handles_share_state() {
        let bridge = bridge();
        let other = bridge.clone();

        assert_eq!(bridge.push(1), Some(1));
        assert_eq!(other.push(2), Some(2));
        assert_eq!(bridge.len(), 2);

        other.close();
        assert!(bridge.is_closed());
        assert_eq!(bridge.push(3), None);
    }

    // --- Consumer handle ---

    #[test]
    fn test_stream_can_only_be_taken_once() {
        let bridge = bridge();
        let stream = bridge.stream();
        assert!(stream.is_ok());
        assert!(bridge.is_consumed());
        assert!(matches!(bridge.stream(), Err(BridgeError::AlreadyConsumed)));
        // A clone shares the consumed flag.
        assert!(matches!(
            bridge.clone().stream(),
            Err(BridgeError::AlreadyConsumed)
        ));
    }

    // --- Observers ---

    #[tokio::test]
    async fn test_registration_after_disposal_fails() {
        let bridge = bridge();
        bridge.close();

        let mut stream = bridge.stream().unwrap();
        assert_eq!(stream.next().await, None);
        assert!(bridge.is_disposed());

        assert!(matches!(
            bridge.on_pull(|_| {}),
            Err(BridgeError::AlreadyDisposed)
        ));
        assert!(matches!(
            bridge.on_disposed(|| {}),
            Err(BridgeError::AlreadyDisposed)
        ));
    }

    // --- Accessors ---

    #[test]
    fn test_debug_formatting() {
        let bridge = bridge();
        bridge.push(7);
        let output = format!("{bridge:?}");
        assert!(output.contains("Bridge"));
        assert!(output.contains("len: 1"));
        assert!(output.contains("disposed: false"));
    }
}
