//! # Weir
//!
//! A push-to-pull bridge: a producer delivers items one at a time with
//! synchronous, never-blocking calls, and a single consumer drains them as
//! a lazily-driven async stream. Like its namesake, a weir turns a free
//! inflow into a controlled draw.
//!
//! This crate provides:
//! - **[`Bridge`]**: the producer handle — `push` / `fail` / `close`,
//!   callable from any context, plus observer registration
//! - **[`BridgeStream`]**: the one-shot consumer handle — a
//!   `Stream<Item = Result<T, E>>` and an explicit [`advance`] step
//!   returning the tagged [`Step`]
//! - **Deterministic disposal**: whether the stream completes, errors, or
//!   is abandoned by the consumer, the bridge disposes exactly once and
//!   notifies its observers
//!
//! ## Design Principles
//!
//! 1. **Producer never blocks** — the buffer is unbounded; no backpressure
//! 2. **Strict FIFO delivery** — the only exception is a pending error,
//!    which preempts buffered items (they are discarded, not re-queued)
//! 3. **Single consumer** — a second attempt to take the stream fails
//!    loudly instead of returning a handle that yields nothing
//! 4. **No silent leaks** — abandoning the stream converts into a clean
//!    disposal via `Drop`
//!
//! ## Example
//!
//! ```rust,ignore
//! use tokio_stream::StreamExt;
//! use weir::Bridge;
//!
//! let bridge = Bridge::<Frame>::new();
//!
//! socket.on_frame({
//!     let bridge = bridge.clone();
//!     move |frame| { bridge.push(frame); }
//! });
//!
//! let mut frames = bridge.stream()?;
//! while let Some(frame) = frames.next().await {
//!     handle(frame?);
//! }
//! ```
//!
//! [`advance`]: BridgeStream::advance

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod bridge;
mod error;
mod observer;
mod stream;

pub use bridge::Bridge;
pub use error::{BoxError, BridgeError};
pub use observer::BridgeObserver;
pub use stream::{BridgeStream, Step};
