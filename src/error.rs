//! Error taxonomy for queue and translation operations.
//!
//! Every failure surfaces synchronously to the caller. The only silent path
//! is the documented drop in `post` when the target type is blocked, which is
//! not an error at all.

use thiserror::Error;

/// Errors reported by the event queue and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Key repeat configured with a negative delay or interval.
    #[error("negative key repeat value")]
    Configuration,

    /// An event type outside the representable range (0..NUMEVENTS).
    #[error("invalid event type {0}")]
    InvalidArgument(u32),

    /// The user event range could not be negotiated at startup, so
    /// user-range operations are disabled for the process.
    #[error("user event range unavailable")]
    FeatureUnavailable,

    /// The underlying fixed-capacity queue rejected a post.
    #[error("event queue full")]
    QueueFull,

    /// The blocking wait can no longer be satisfied: the source has no
    /// producers left and its queue is empty.
    #[error("event source disconnected")]
    Disconnected,
}
