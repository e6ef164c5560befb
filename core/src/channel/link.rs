/// Raw attribute link to a connected peer
///
/// The link performs the actual GATT write/read/subscribe primitives. It is
/// implemented by the platform (BlueZ, CoreBluetooth, a test double) and is
/// out of scope for this crate. Every operation reports back through a
/// completion, which may fire synchronously inside the call or later from
/// any thread.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::ChannelError;

/// Completion for a characteristic write
pub type WriteCallback = Box<dyn FnOnce(Result<(), ChannelError>) + Send>;

/// Completion for a characteristic read
pub type ReadCallback = Box<dyn FnOnce(Result<Vec<u8>, ChannelError>) + Send>;

/// Acknowledgment of a subscribe or unsubscribe request
pub type AckCallback = Box<dyn FnOnce(Result<(), ChannelError>) + Send>;

/// Receiver of inbound notifications
///
/// Shared so that the exact registered listener can be handed back on
/// unsubscribe; compare with [`Arc::ptr_eq`].
pub type Listener = Arc<dyn Fn(Result<Vec<u8>, ChannelError>) + Send + Sync>;

/// GATT client primitives for platform implementations
#[cfg_attr(test, mockall::automock)]
pub trait RawLink: Send + Sync {
    /// Whether the wireless stack is usable on this host
    fn is_available(&self) -> bool;

    /// Write to a characteristic
    fn write_to(&self, service: Uuid, characteristic: Uuid, data: Vec<u8>, done: WriteCallback);

    /// Read a characteristic value
    fn read_from(&self, service: Uuid, characteristic: Uuid, done: ReadCallback);

    /// Begin notifications, delivering each value to `listener`
    fn subscribe(&self, service: Uuid, characteristic: Uuid, listener: Listener, ack: AckCallback);

    /// End notifications previously started with the same `listener`
    fn unsubscribe(
        &self,
        service: Uuid,
        characteristic: Uuid,
        listener: Listener,
        ack: AckCallback,
    );
}
