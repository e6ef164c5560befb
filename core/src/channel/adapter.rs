/// Channel adapter — byte-stream facade over a GATT link
///
/// Combines the notification lifecycle and the write serializer for the data
/// channel, and passes side-channel (GPIO) requests straight through to the
/// link. Each adapter owns its own subscription and queue state, so several
/// connected peers never share a listener.
///
/// Composite behaviour on the data channel:
///
/// | Subscription | Queue    | write()            | read()             | stop_reading()      |
/// |--------------|----------|--------------------|--------------------|---------------------|
/// | idle         | empty    | held               | subscribe          | immediate Ok        |
/// | idle         | pending  | held               | subscribe, drain   | immediate Ok        |
/// | active       | empty    | issued             | SubscriptionBusy   | unsubscribe         |
/// | active       | draining | queued behind head | SubscriptionBusy   | unsubscribe, hold   |

use std::sync::Arc;
use tracing::{debug, info};

use super::config::ChannelConfig;
use super::lifecycle::{NotificationLifecycle, SubscriptionState};
use super::link::{Listener, RawLink};
use super::serializer::WriteSerializer;
use crate::error::ChannelError;

pub struct ChannelAdapter {
    config: ChannelConfig,
    link: Arc<dyn RawLink>,
    lifecycle: NotificationLifecycle,
    serializer: WriteSerializer,
}

impl ChannelAdapter {
    /// Create an adapter over `link`, validating `config`
    pub fn new(link: Arc<dyn RawLink>, config: ChannelConfig) -> Result<Self, ChannelError> {
        config.validate()?;

        let lifecycle = NotificationLifecycle::new(link.clone(), config.data.clone());
        let serializer = WriteSerializer::new(
            link.clone(),
            config.data.clone(),
            lifecycle.watch(),
            config.max_pending_writes,
            config.max_payload_len,
        );

        let on_active = serializer.clone();
        lifecycle.set_on_active(move || on_active.flush());

        info!(
            data = %config.data.channel,
            side = %config.side.channel,
            "Channel adapter created"
        );

        Ok(Self {
            config,
            link,
            lifecycle,
            serializer,
        })
    }

    /// Create an adapter only if the link reports a usable wireless stack
    ///
    /// An unavailable stack is a normal outcome and yields `Ok(None)`; only an
    /// invalid configuration is an error.
    pub fn probe(
        link: Arc<dyn RawLink>,
        config: ChannelConfig,
    ) -> Result<Option<Self>, ChannelError> {
        config.validate()?;
        if !link.is_available() {
            info!("Wireless link unavailable on this platform");
            return Ok(None);
        }
        Self::new(link, config).map(Some)
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.lifecycle.state()
    }

    /// Writes waiting behind the subscription or the in-flight write
    pub fn pending_writes(&self) -> usize {
        self.serializer.pending()
    }

    /// Queue a write on the data channel
    ///
    /// `done` fires once the link completes the write. Writes issued before
    /// any `read` are held until notifications are active.
    pub fn write(
        &self,
        payload: impl Into<Vec<u8>>,
        done: impl FnOnce(Result<(), ChannelError>) + Send + 'static,
    ) {
        self.serializer.enqueue(payload.into(), Box::new(done));
    }

    /// Subscribe to data-channel notifications
    ///
    /// `on_data` is registered as the listener and receives every inbound
    /// notification until `stop_reading`. A failed or rejected subscription is
    /// reported to `on_data` as an error. Reaching the active state drains any
    /// queued writes.
    pub fn read(&self, on_data: impl Fn(Result<Vec<u8>, ChannelError>) + Send + Sync + 'static) {
        self.read_with(Arc::new(on_data));
    }

    /// As [`read`](Self::read), with a caller-held listener
    pub fn read_with(&self, listener: Listener) {
        let on_error = listener.clone();
        self.lifecycle.start(
            listener,
            Box::new(move |result: Result<(), ChannelError>| {
                if let Err(e) = result {
                    on_error(Err(e));
                }
            }),
        );
    }

    /// Unsubscribe the data-channel listener
    ///
    /// Queued writes are kept and resume on the next `read`.
    pub fn stop_reading(&self, done: impl FnOnce(Result<(), ChannelError>) + Send + 'static) {
        self.lifecycle.stop(Box::new(done));
    }

    /// Write the side channel directly, bypassing the queue
    pub fn write_aux(
        &self,
        payload: impl Into<Vec<u8>>,
        done: impl FnOnce(Result<(), ChannelError>) + Send + 'static,
    ) {
        let payload = payload.into();
        debug!(channel = %self.config.side.channel, len = payload.len(), "Side write");
        self.link.write_to(
            self.config.side.service,
            self.config.side.outbound,
            payload,
            Box::new(done),
        );
    }

    /// Read the side channel directly
    pub fn read_aux(&self, done: impl FnOnce(Result<Vec<u8>, ChannelError>) + Send + 'static) {
        debug!(channel = %self.config.side.channel, "Side read");
        self.link.read_from(
            self.config.side.service,
            self.config.side.inbound,
            Box::new(done),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::config::{BTS01_DATA_TX_UUID, BTS01_GPIO_UUID, BTS01_SERVICE_UUID};
    use crate::channel::link::MockRawLink;
    use mockall::predicate::{always, eq};
    use parking_lot::Mutex;

    #[test]
    fn test_probe_unavailable_is_none() {
        let mut mock = MockRawLink::new();
        mock.expect_is_available().return_const(false);

        let adapter = ChannelAdapter::probe(Arc::new(mock), ChannelConfig::bts01())
            .expect("valid config");
        assert!(adapter.is_none());
    }

    #[test]
    fn test_probe_available_builds_adapter() {
        let mut mock = MockRawLink::new();
        mock.expect_is_available().return_const(true);

        let adapter = ChannelAdapter::probe(Arc::new(mock), ChannelConfig::bts01())
            .expect("valid config")
            .expect("available");
        assert_eq!(adapter.subscription_state(), SubscriptionState::Idle);
        assert_eq!(adapter.pending_writes(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ChannelConfig::bts01().with_max_pending_writes(0);
        assert!(matches!(
            ChannelAdapter::probe(Arc::new(MockRawLink::new()), config.clone()),
            Err(ChannelError::InvalidConfig(_))
        ));
        assert!(ChannelAdapter::new(Arc::new(MockRawLink::new()), config).is_err());
    }

    #[test]
    fn test_aux_path_bypasses_queue_and_subscription() {
        let mut mock = MockRawLink::new();
        mock.expect_write_to()
            .with(
                eq(BTS01_SERVICE_UUID),
                eq(BTS01_GPIO_UUID),
                eq(vec![0x01, 0x02]),
                always(),
            )
            .times(1)
            .returning(|_, _, _, done| done(Ok(())));
        mock.expect_read_from()
            .with(eq(BTS01_SERVICE_UUID), eq(BTS01_GPIO_UUID), always())
            .times(1)
            .returning(|_, _, done| done(Ok(vec![0xFF])));
        mock.expect_subscribe().never();
        mock.expect_unsubscribe().never();

        let adapter = ChannelAdapter::new(Arc::new(mock), ChannelConfig::bts01()).unwrap();
        let results = Arc::new(Mutex::new(Vec::new()));

        let r = results.clone();
        adapter.write_aux(vec![0x01, 0x02], move |res| {
            r.lock().push(res.map(|_| Vec::new()))
        });
        let r = results.clone();
        adapter.read_aux(move |res| r.lock().push(res));

        assert_eq!(results.lock().as_slice(), &[Ok(vec![]), Ok(vec![0xFF])]);
        assert_eq!(adapter.subscription_state(), SubscriptionState::Idle);
        assert_eq!(adapter.pending_writes(), 0);
    }

    #[test]
    fn test_data_write_targets_data_characteristic() {
        let mut mock = MockRawLink::new();
        mock.expect_subscribe()
            .times(1)
            .returning(|_, _, _, ack| ack(Ok(())));
        mock.expect_write_to()
            .with(
                eq(BTS01_SERVICE_UUID),
                eq(BTS01_DATA_TX_UUID),
                eq(b"ping".to_vec()),
                always(),
            )
            .times(1)
            .returning(|_, _, _, done| done(Ok(())));

        let adapter = ChannelAdapter::new(Arc::new(mock), ChannelConfig::bts01()).unwrap();
        let done = Arc::new(Mutex::new(None));

        let d = done.clone();
        adapter.write(b"ping".to_vec(), move |res| *d.lock() = Some(res));
        assert!(done.lock().is_none());

        adapter.read(|_| {});
        assert_eq!(*done.lock(), Some(Ok(())));
    }

    #[test]
    fn test_subscribe_failure_reported_to_reader() {
        let mut mock = MockRawLink::new();
        mock.expect_subscribe()
            .times(1)
            .returning(|_, _, _, ack| ack(Err(ChannelError::transport("not connected"))));
        mock.expect_write_to().never();

        let adapter = ChannelAdapter::new(Arc::new(mock), ChannelConfig::bts01()).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        adapter.write(b"held".to_vec(), |_| {});
        let s = seen.clone();
        adapter.read(move |item| s.lock().push(item));

        assert_eq!(
            seen.lock().as_slice(),
            &[Err(ChannelError::transport("not connected"))]
        );
        assert_eq!(adapter.subscription_state(), SubscriptionState::Idle);
        assert_eq!(adapter.pending_writes(), 1);
    }
}
