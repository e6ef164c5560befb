// Channel module — byte-stream adaptation over GATT write/notify

pub mod adapter;
pub mod config;
pub mod lifecycle;
pub mod link;
pub mod queue;
pub mod serializer;
pub mod stream;

pub use adapter::ChannelAdapter;
pub use config::{
    ChannelConfig, EndpointPair, BTS01_DATA_RX_UUID, BTS01_DATA_TX_UUID, BTS01_GPIO_UUID,
    BTS01_SERVICE_UUID, DEFAULT_MAX_PENDING_WRITES, MAX_ATTRIBUTE_SIZE,
};
pub use lifecycle::{NotificationLifecycle, SubscriptionState, SubscriptionWatch};
pub use link::{AckCallback, Listener, RawLink, ReadCallback, WriteCallback};
pub use queue::{PendingWrite, WriteQueue};
pub use serializer::WriteSerializer;
pub use stream::NotificationStream;
