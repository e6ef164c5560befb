/// Pending write queue for the data channel
///
/// FIFO of writes waiting for the notification channel, bounded so a link that
/// keeps failing cannot grow it without limit.

use std::collections::VecDeque;

use super::link::WriteCallback;

/// A queued outbound write and the completion owed to its caller
pub struct PendingWrite {
    /// Bytes to write, never inspected by this layer
    pub payload: Vec<u8>,
    /// Fired exactly once with the link's result
    pub completion: WriteCallback,
}

impl PendingWrite {
    pub fn new(payload: Vec<u8>, completion: WriteCallback) -> Self {
        Self {
            payload,
            completion,
        }
    }
}

impl std::fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingWrite")
            .field("len", &self.payload.len())
            .finish_non_exhaustive()
    }
}

/// Write queue with backpressure management
#[derive(Debug)]
pub struct WriteQueue {
    queue: VecDeque<PendingWrite>,
    max_pending: usize,
}

impl WriteQueue {
    /// Create a new write queue
    pub fn new(max_pending: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max_pending,
        }
    }

    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.max_pending
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.max_pending
    }

    /// Append a write, handing it back if the queue is at capacity
    pub fn try_enqueue(&mut self, write: PendingWrite) -> Result<(), PendingWrite> {
        if self.is_full() {
            return Err(write);
        }
        self.queue.push_back(write);
        Ok(())
    }

    /// Remove the oldest write
    pub fn dequeue(&mut self) -> Option<PendingWrite> {
        self.queue.pop_front()
    }
}
