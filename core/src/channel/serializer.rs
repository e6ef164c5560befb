/// Write serializer for the data channel
///
/// Holds writes until the notification subscription is active, then issues
/// them to the link one at a time. A write is only issued after the previous
/// write's completion has fired, so completions arrive in submission order.
///
/// Draining is a loop owned by whichever caller first enters `flush`; nested
/// flushes (a completion firing synchronously inside the link call, or a
/// completion that enqueues more writes) return immediately and the owner
/// picks up their work. Stack depth stays constant however long the queue is.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::config::EndpointPair;
use super::lifecycle::SubscriptionWatch;
use super::link::{RawLink, WriteCallback};
use super::queue::{PendingWrite, WriteQueue};
use crate::error::ChannelError;

struct SerializerInner {
    queue: WriteQueue,
    /// A write has been handed to the link and not yet completed
    in_flight: bool,
    /// Some caller owns the drain loop
    draining: bool,
}

#[derive(Clone)]
pub struct WriteSerializer {
    link: Arc<dyn RawLink>,
    endpoint: Arc<EndpointPair>,
    subscription: SubscriptionWatch,
    max_payload_len: usize,
    inner: Arc<Mutex<SerializerInner>>,
}

impl WriteSerializer {
    pub fn new(
        link: Arc<dyn RawLink>,
        endpoint: EndpointPair,
        subscription: SubscriptionWatch,
        max_pending_writes: usize,
        max_payload_len: usize,
    ) -> Self {
        Self {
            link,
            endpoint: Arc::new(endpoint),
            subscription,
            max_payload_len,
            inner: Arc::new(Mutex::new(SerializerInner {
                queue: WriteQueue::new(max_pending_writes),
                in_flight: false,
                draining: false,
            })),
        }
    }

    /// Queue a write and try to flush
    ///
    /// Writes are accepted whatever the subscription state. Oversized
    /// payloads and writes hitting a full queue complete immediately with an
    /// error and are not queued.
    pub fn enqueue(&self, payload: Vec<u8>, completion: WriteCallback) {
        if payload.len() > self.max_payload_len {
            completion(Err(ChannelError::PayloadTooLarge {
                len: payload.len(),
                max: self.max_payload_len,
            }));
            return;
        }

        let rejected = {
            let mut inner = self.inner.lock();
            match inner.queue.try_enqueue(PendingWrite::new(payload, completion)) {
                Ok(()) => {
                    trace!(
                        channel = %self.endpoint.channel,
                        pending = inner.queue.len(),
                        "Write queued"
                    );
                    None
                }
                Err(write) => Some((write, inner.queue.capacity())),
            }
        };

        if let Some((write, capacity)) = rejected {
            warn!(
                channel = %self.endpoint.channel,
                capacity,
                "Write queue full, rejecting write"
            );
            (write.completion)(Err(ChannelError::WriteQueueFull));
            return;
        }

        self.flush();
    }

    /// Advance the queue if the subscription is active and nothing is in flight
    pub fn flush(&self) {
        {
            let mut inner = self.inner.lock();
            if inner.draining {
                return;
            }
            inner.draining = true;
        }

        loop {
            let write = {
                let mut inner = self.inner.lock();
                let idle = inner.in_flight || inner.queue.is_empty();
                let next = if idle || !self.subscription.is_active() {
                    None
                } else {
                    inner.queue.dequeue()
                };
                match next {
                    Some(write) => {
                        inner.in_flight = true;
                        write
                    }
                    None => {
                        inner.draining = false;
                        return;
                    }
                }
            };

            let PendingWrite {
                payload,
                completion,
            } = write;
            debug!(
                channel = %self.endpoint.channel,
                len = payload.len(),
                "Issuing write"
            );

            let this = self.clone();
            self.link.write_to(
                self.endpoint.service,
                self.endpoint.outbound,
                payload,
                Box::new(move |result: Result<(), ChannelError>| {
                    this.complete(completion, result)
                }),
            );
        }
    }

    fn complete(&self, completion: WriteCallback, result: Result<(), ChannelError>) {
        if let Err(e) = &result {
            warn!(channel = %self.endpoint.channel, error = %e, "Write failed");
        }
        completion(result);
        self.inner.lock().in_flight = false;
        self.flush();
    }

    /// Writes waiting in the queue (excluding one in flight)
    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn in_flight(&self) -> bool {
        self.inner.lock().in_flight
    }
}
