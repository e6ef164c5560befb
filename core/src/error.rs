// Error taxonomy for the channel layer
//
// Every failure is surfaced through the completion callback of the operation
// that caused it, so the error type is `Clone` and owns its data.

use thiserror::Error;

/// Errors surfaced to channel callers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The underlying link reported a failure (write, read, subscribe or unsubscribe)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A notification subscription already exists or is being established
    #[error("Notification subscription already active")]
    SubscriptionBusy,

    /// A subscribe or unsubscribe handshake has not been acknowledged yet
    #[error("Subscription transition in progress")]
    TransitionInProgress,

    #[error("Write queue full (backpressure)")]
    WriteQueueFull,

    #[error("Payload of {len} bytes exceeds maximum of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A completion was dropped by the link without being invoked
    #[error("Completion dropped before firing")]
    CompletionDropped,
}

impl ChannelError {
    /// Wrap a link-level failure message
    pub fn transport(msg: impl Into<String>) -> Self {
        ChannelError::Transport(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
