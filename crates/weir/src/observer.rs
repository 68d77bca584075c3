//! Observer registration — the [`BridgeObserver`] trait and the callback
//! lists owned by a bridge.
//!
//! # API Styles
//!
//! - **Closure-based**: [`Bridge::on_pull`](crate::Bridge::on_pull) and
//!   [`Bridge::on_disposed`](crate::Bridge::on_disposed) register one
//!   callback per notification.
//! - **Trait-based**: implement [`BridgeObserver`] and register a single
//!   value for both notifications via
//!   [`Bridge::observe`](crate::Bridge::observe).
//!
//! Callbacks are invoked synchronously at the notification point, outside
//! the bridge's internal lock, so they may re-enter the bridge's public
//! surface.

/// A registered `pull` callback. Receives the remaining buffer length.
pub(crate) type PullFn = Box<dyn FnMut(usize) + Send>;

/// A registered `disposed` callback. Invoked at most once.
pub(crate) type DisposedFn = Box<dyn FnOnce() + Send>;

/// Callback lists owned by a bridge.
#[derive(Default)]
pub(crate) struct Observers {
    /// Fired once per delivered item, after removal from the buffer.
    pub(crate) pull: Vec<PullFn>,
    /// Fired exactly once, at the moment of disposal.
    pub(crate) disposed: Vec<DisposedFn>,
}

// ---------------------------------------------------------------------------
// BridgeObserver
// ---------------------------------------------------------------------------

/// Observer trait for bridge notifications.
///
/// Implement this trait to receive both bridge notifications through one
/// value, registered via [`Bridge::observe`](crate::Bridge::observe). Both
/// methods have no-op defaults, so an implementation can override only the
/// notification it cares about.
///
/// # Example
///
/// ```rust,ignore
/// struct Gauge;
///
/// impl BridgeObserver for Gauge {
///     fn on_pull(&mut self, remaining: usize) {
///         record_backlog(remaining);
///     }
/// }
///
/// bridge.observe(Gauge)?;
/// ```
pub trait BridgeObserver: Send + 'static {
    /// Called once per delivered item with the remaining buffer length.
    fn on_pull(&mut self, remaining: usize) {
        let _ = remaining;
    }

    /// Called exactly once when the bridge is disposed.
    fn on_disposed(&mut self) {}
}
