//! Bridge usage-error types.
//!
//! These errors are raised synchronously at the misusing call site. Errors
//! injected by the producer via [`Bridge::fail`](crate::Bridge::fail) are
//! not represented here — they are an arbitrary payload type propagated
//! verbatim to the consumer.

/// Default producer-error payload for a [`Bridge`](crate::Bridge).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from misusing a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The item stream has already been taken from this bridge.
    #[error("already consumed")]
    AlreadyConsumed,
    /// The bridge has already been disposed.
    #[error("already disposed")]
    AlreadyDisposed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(BridgeError::AlreadyConsumed.to_string(), "already consumed");
        assert_eq!(BridgeError::AlreadyDisposed.to_string(), "already disposed");
    }
}
