/// Notification subscription lifecycle
///
/// Owns the subscription state of the data channel's inbound characteristic
/// and mediates every subscribe/unsubscribe handshake with the link. At most
/// one listener is recorded at a time, and the recorded listener is the exact
/// one handed back to the link on unsubscribe.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::config::EndpointPair;
use super::link::{AckCallback, Listener, RawLink};
use crate::error::ChannelError;

/// Hook fired each time the subscription becomes active
pub type ActivationHook = Arc<dyn Fn() + Send + Sync>;

/// Subscription state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionState {
    /// No notifications delivered, no listener recorded
    Idle,
    /// Subscribe requested, waiting for acknowledgment
    Subscribing,
    /// Listener registered and receiving notifications
    Active,
    /// Unsubscribe requested, waiting for acknowledgment
    Unsubscribing,
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Subscribing => write!(f, "Subscribing"),
            Self::Active => write!(f, "Active"),
            Self::Unsubscribing => write!(f, "Unsubscribing"),
        }
    }
}

/// Internal phase; the listener lives inside the phases that own one
enum Phase {
    Idle,
    Subscribing,
    Active(Listener),
    Unsubscribing(Listener),
}

impl Phase {
    fn state(&self) -> SubscriptionState {
        match self {
            Phase::Idle => SubscriptionState::Idle,
            Phase::Subscribing => SubscriptionState::Subscribing,
            Phase::Active(_) => SubscriptionState::Active,
            Phase::Unsubscribing(_) => SubscriptionState::Unsubscribing,
        }
    }
}

/// Read-only view of the subscription state
#[derive(Clone)]
pub struct SubscriptionWatch {
    phase: Arc<Mutex<Phase>>,
}

impl SubscriptionWatch {
    pub fn state(&self) -> SubscriptionState {
        self.phase.lock().state()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SubscriptionState::Active
    }
}

/// Drives subscribe/unsubscribe transitions against the link
#[derive(Clone)]
pub struct NotificationLifecycle {
    link: Arc<dyn RawLink>,
    endpoint: Arc<EndpointPair>,
    phase: Arc<Mutex<Phase>>,
    on_active: Arc<Mutex<Option<ActivationHook>>>,
}

impl NotificationLifecycle {
    /// Create a lifecycle for the inbound side of `endpoint`, initially Idle
    pub fn new(link: Arc<dyn RawLink>, endpoint: EndpointPair) -> Self {
        Self {
            link,
            endpoint: Arc::new(endpoint),
            phase: Arc::new(Mutex::new(Phase::Idle)),
            on_active: Arc::new(Mutex::new(None)),
        }
    }

    /// Install the hook invoked on every transition to Active
    pub fn set_on_active(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_active.lock() = Some(Arc::new(hook));
    }

    pub fn watch(&self) -> SubscriptionWatch {
        SubscriptionWatch {
            phase: self.phase.clone(),
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.phase.lock().state()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SubscriptionState::Active
    }

    /// The listener currently registered with the link, if any
    pub fn current_listener(&self) -> Option<Listener> {
        match &*self.phase.lock() {
            Phase::Active(listener) | Phase::Unsubscribing(listener) => Some(listener.clone()),
            Phase::Idle | Phase::Subscribing => None,
        }
    }

    /// Subscribe `on_data` to inbound notifications
    ///
    /// `on_subscribed` receives the acknowledgment. A start issued while a
    /// subscription exists or a handshake is pending fails with
    /// [`ChannelError::SubscriptionBusy`] without touching the link.
    pub fn start(&self, on_data: Listener, on_subscribed: AckCallback) {
        {
            let mut phase = self.phase.lock();
            if !matches!(*phase, Phase::Idle) {
                let state = phase.state();
                drop(phase);
                warn!(
                    channel = %self.endpoint.channel,
                    %state,
                    "Rejecting subscribe: subscription not idle"
                );
                on_subscribed(Err(ChannelError::SubscriptionBusy));
                return;
            }
            *phase = Phase::Subscribing;
        }

        debug!(channel = %self.endpoint.channel, "Subscribing to notifications");

        let this = self.clone();
        let listener = on_data.clone();
        self.link.subscribe(
            self.endpoint.service,
            self.endpoint.inbound,
            on_data,
            Box::new(move |result: Result<(), ChannelError>| match result {
                Ok(()) => {
                    *this.phase.lock() = Phase::Active(listener);
                    debug!(channel = %this.endpoint.channel, "Notifications active");
                    this.fire_on_active();
                    on_subscribed(Ok(()));
                }
                Err(e) => {
                    *this.phase.lock() = Phase::Idle;
                    warn!(channel = %this.endpoint.channel, error = %e, "Subscribe failed");
                    on_subscribed(Err(e));
                }
            }),
        );
    }

    /// Unsubscribe the current listener
    ///
    /// Completes immediately with `Ok(())` when already Idle. Fails with
    /// [`ChannelError::TransitionInProgress`] while a handshake is pending.
    pub fn stop(&self, done: AckCallback) {
        let listener = {
            let mut phase = self.phase.lock();
            match std::mem::replace(&mut *phase, Phase::Idle) {
                Phase::Active(listener) => {
                    *phase = Phase::Unsubscribing(listener.clone());
                    listener
                }
                Phase::Idle => {
                    drop(phase);
                    debug!(channel = %self.endpoint.channel, "Stop while idle");
                    done(Ok(()));
                    return;
                }
                pending => {
                    *phase = pending;
                    drop(phase);
                    done(Err(ChannelError::TransitionInProgress));
                    return;
                }
            }
        };

        debug!(channel = %self.endpoint.channel, "Unsubscribing from notifications");

        let this = self.clone();
        let restore = listener.clone();
        self.link.unsubscribe(
            self.endpoint.service,
            self.endpoint.inbound,
            listener,
            Box::new(move |result: Result<(), ChannelError>| match result {
                Ok(()) => {
                    *this.phase.lock() = Phase::Idle;
                    debug!(channel = %this.endpoint.channel, "Notifications stopped");
                    done(Ok(()));
                }
                Err(e) => {
                    *this.phase.lock() = Phase::Active(restore);
                    warn!(channel = %this.endpoint.channel, error = %e, "Unsubscribe failed");
                    this.fire_on_active();
                    done(Err(e));
                }
            }),
        );
    }

    fn fire_on_active(&self) {
        let hook = self.on_active.lock().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}
