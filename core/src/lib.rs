// BTS Link — byte stream over a GATT write/notify link
#![allow(clippy::empty_line_after_doc_comments)]
//
// The link below us speaks attributes: write a characteristic, read one,
// subscribe to notifications. Callers want a pipe. Everything in here exists
// to keep writes in order and to hold them until the peer can answer.

pub mod channel;
pub mod error;
pub mod logging;

pub use channel::{
    ChannelAdapter, ChannelConfig, EndpointPair, Listener, NotificationStream, RawLink,
    SubscriptionState,
};
pub use error::{ChannelError, Result};
pub use logging::init_tracing;
