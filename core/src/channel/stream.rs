// Async wrappers over the callback API
//
// Each completion-based operation is bridged through a oneshot; the
// notification listener forwards into an unbounded channel exposed as a
// `futures::Stream`.

use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};

use super::adapter::ChannelAdapter;
use super::link::Listener;
use crate::error::ChannelError;

/// Inbound notifications as a stream of byte chunks
///
/// Yields `Err` if the subscription fails; ends once every copy of the
/// listener is dropped (after `stop_reading` and the link releasing it).
pub struct NotificationStream {
    rx: mpsc::UnboundedReceiver<Result<Vec<u8>, ChannelError>>,
}

impl Stream for NotificationStream {
    type Item = Result<Vec<u8>, ChannelError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

async fn completion<T>(rx: oneshot::Receiver<Result<T, ChannelError>>) -> Result<T, ChannelError> {
    rx.await.map_err(|_| ChannelError::CompletionDropped)?
}

impl ChannelAdapter {
    /// Queue a data write and wait for the link to complete it
    pub async fn write_async(&self, payload: impl Into<Vec<u8>>) -> Result<(), ChannelError> {
        let (tx, rx) = oneshot::channel();
        self.write(payload, move |result| {
            let _ = tx.send(result);
        });
        completion(rx).await
    }

    /// Unsubscribe and wait for the acknowledgment
    pub async fn stop_reading_async(&self) -> Result<(), ChannelError> {
        let (tx, rx) = oneshot::channel();
        self.stop_reading(move |result| {
            let _ = tx.send(result);
        });
        completion(rx).await
    }

    pub async fn write_aux_async(&self, payload: impl Into<Vec<u8>>) -> Result<(), ChannelError> {
        let (tx, rx) = oneshot::channel();
        self.write_aux(payload, move |result| {
            let _ = tx.send(result);
        });
        completion(rx).await
    }

    pub async fn read_aux_async(&self) -> Result<Vec<u8>, ChannelError> {
        let (tx, rx) = oneshot::channel();
        self.read_aux(move |result| {
            let _ = tx.send(result);
        });
        completion(rx).await
    }

    /// Subscribe and receive notifications as a stream
    pub fn subscribe_stream(&self) -> NotificationStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener: Listener = Arc::new(move |item: Result<Vec<u8>, ChannelError>| {
            let _ = tx.send(item);
        });
        self.read_with(listener);
        NotificationStream { rx }
    }
}
