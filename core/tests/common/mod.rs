// Recording link shared by the integration tests
//
// Records every primitive the adapter issues and parks completions so a test
// can release them in whatever order it likes. Auto modes complete inline,
// inside the link call, the way a synchronous platform stack would.

#![allow(dead_code)]

use btslink_core::channel::{AckCallback, Listener, RawLink, ReadCallback, WriteCallback};
use btslink_core::ChannelError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOp {
    Write { characteristic: Uuid, data: Vec<u8> },
    Read { characteristic: Uuid },
    Subscribe { characteristic: Uuid },
    Unsubscribe { characteristic: Uuid },
}

#[derive(Default)]
struct State {
    ops: Vec<LinkOp>,
    writes: VecDeque<(Vec<u8>, WriteCallback)>,
    acks: VecDeque<AckCallback>,
    subscribed: Vec<Listener>,
    unsubscribed: Vec<Listener>,
    listener: Option<Listener>,
    aux_value: Vec<u8>,
}

pub struct RecordingLink {
    available: bool,
    auto_ack: bool,
    auto_write: Option<Result<(), ChannelError>>,
    state: Mutex<State>,
}

impl RecordingLink {
    /// Parks every completion until the test releases it
    pub fn manual() -> Arc<Self> {
        Arc::new(Self {
            available: true,
            auto_ack: false,
            auto_write: None,
            state: Mutex::new(State::default()),
        })
    }

    /// Acks handshakes inline but parks writes
    pub fn auto_ack() -> Arc<Self> {
        Arc::new(Self {
            available: true,
            auto_ack: true,
            auto_write: None,
            state: Mutex::new(State::default()),
        })
    }

    /// Completes everything inline, writes with `result`
    pub fn instant(result: Result<(), ChannelError>) -> Arc<Self> {
        Arc::new(Self {
            available: true,
            auto_ack: true,
            auto_write: Some(result),
            state: Mutex::new(State::default()),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            available: false,
            auto_ack: true,
            auto_write: None,
            state: Mutex::new(State::default()),
        })
    }

    pub fn set_aux_value(&self, value: &[u8]) {
        self.state.lock().aux_value = value.to_vec();
    }

    pub fn ops(&self) -> Vec<LinkOp> {
        self.state.lock().ops.clone()
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                LinkOp::Write { data, .. } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&LinkOp) -> bool) -> usize {
        self.state.lock().ops.iter().filter(|op| pred(op)).count()
    }

    /// Writes handed to the link whose completion has not fired
    pub fn outstanding_writes(&self) -> usize {
        self.state.lock().writes.len()
    }

    /// Subscribe/unsubscribe requests awaiting an ack
    pub fn outstanding_acks(&self) -> usize {
        self.state.lock().acks.len()
    }

    pub fn subscribed(&self) -> Vec<Listener> {
        self.state.lock().subscribed.clone()
    }

    pub fn unsubscribed(&self) -> Vec<Listener> {
        self.state.lock().unsubscribed.clone()
    }

    /// Fire the oldest parked write completion, returning its payload
    pub fn complete_write(&self, result: Result<(), ChannelError>) -> Vec<u8> {
        let (data, done) = self
            .state
            .lock()
            .writes
            .pop_front()
            .expect("no outstanding write");
        done(result);
        data
    }

    /// Fire the oldest parked subscribe/unsubscribe ack
    pub fn ack(&self, result: Result<(), ChannelError>) {
        let ack = self
            .state
            .lock()
            .acks
            .pop_front()
            .expect("no outstanding handshake");
        ack(result);
    }

    /// Deliver a notification to the currently registered listener
    pub fn notify(&self, data: &[u8]) -> bool {
        let listener = self.state.lock().listener.clone();
        match listener {
            Some(listener) => {
                listener(Ok(data.to_vec()));
                true
            }
            None => false,
        }
    }
}

impl RawLink for RecordingLink {
    fn is_available(&self) -> bool {
        self.available
    }

    fn write_to(&self, _service: Uuid, characteristic: Uuid, data: Vec<u8>, done: WriteCallback) {
        {
            let mut state = self.state.lock();
            state.ops.push(LinkOp::Write {
                characteristic,
                data: data.clone(),
            });
            if self.auto_write.is_none() {
                state.writes.push_back((data, done));
                return;
            }
        }
        if let Some(result) = self.auto_write.clone() {
            done(result);
        }
    }

    fn read_from(&self, _service: Uuid, characteristic: Uuid, done: ReadCallback) {
        let value = {
            let mut state = self.state.lock();
            state.ops.push(LinkOp::Read { characteristic });
            state.aux_value.clone()
        };
        done(Ok(value));
    }

    fn subscribe(&self, _service: Uuid, characteristic: Uuid, listener: Listener, ack: AckCallback) {
        {
            let mut state = self.state.lock();
            state.ops.push(LinkOp::Subscribe { characteristic });
            state.subscribed.push(listener.clone());
            state.listener = Some(listener);
        }
        if self.auto_ack {
            ack(Ok(()));
        } else {
            self.state.lock().acks.push_back(ack);
        }
    }

    fn unsubscribe(&self, _service: Uuid, characteristic: Uuid, listener: Listener, ack: AckCallback) {
        {
            let mut state = self.state.lock();
            state.ops.push(LinkOp::Unsubscribe { characteristic });
            state.unsubscribed.push(listener);
            state.listener = None;
        }
        if self.auto_ack {
            ack(Ok(()));
        } else {
            self.state.lock().acks.push_back(ack);
        }
    }
}
