//! In-process implementation of [`PoseTransport`].
//!
//! A single-threaded pub/sub bus: publishers push odometry messages onto a
//! topic, every subscriber of that topic gets its own bounded
//! `tokio::sync::broadcast` channel, and the host drains the channel to feed
//! its display. When a channel is full the oldest pending message is
//! overwritten, the way middleware subscriber queues behave.
//!
//! Channel capacity is the requested queue depth rounded up to a power of
//! two (at least one).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::transport::PoseTransport;
use crate::types::OdometryMessage;

#[derive(Debug, Default)]
struct BusState {
    topics: HashMap<String, Vec<(u64, broadcast::Sender<OdometryMessage>)>>,
    next_id: u64,
}

/// Loopback message bus.
///
/// Cloning is cheap and yields another handle to the same bus.
#[derive(Debug, Clone, Default)]
pub struct LoopbackBus {
    state: Rc<RefCell<BusState>>,
}

impl LoopbackBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unsubscribed transport attached to this bus.
    pub fn transport(&self) -> LoopbackTransport {
        LoopbackTransport {
            bus: self.clone(),
            subscription: None,
        }
    }

    /// Publishes a message on `topic`.
    ///
    /// # Returns
    /// Number of subscribers the message was queued for.
    pub fn publish(&self, topic: &str, msg: OdometryMessage) -> usize {
        let state = self.state.borrow();
        let Some(senders) = state.topics.get(topic) else {
            return 0;
        };
        senders
            .iter()
            .filter(|(_, tx)| tx.send(msg.clone()).is_ok())
            .count()
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.state
            .borrow()
            .topics
            .get(topic)
            .map_or(0, |senders| senders.len())
    }

    fn attach(&self, topic: &str, capacity: usize) -> (u64, broadcast::Receiver<OdometryMessage>) {
        let (tx, rx) = broadcast::channel(capacity);
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state
            .topics
            .entry(topic.to_owned())
            .or_default()
            .push((id, tx));
        (id, rx)
    }

    fn detach(&self, topic: &str, id: u64) {
        let mut state = self.state.borrow_mut();
        if let Some(senders) = state.topics.get_mut(topic) {
            senders.retain(|(other, _)| *other != id);
            if senders.is_empty() {
                state.topics.remove(topic);
            }
        }
    }
}

#[derive(Debug)]
struct Subscription {
    topic: String,
    id: u64,
    capacity: usize,
    rx: broadcast::Receiver<OdometryMessage>,
    dropped: u64,
}

/// Subscriber end of a [`LoopbackBus`].
#[derive(Debug)]
pub struct LoopbackTransport {
    bus: LoopbackBus,
    subscription: Option<Subscription>,
}

impl LoopbackTransport {
    /// Takes every pending message, oldest first.
    pub fn drain(&mut self) -> Vec<OdometryMessage> {
        let Some(sub) = self.subscription.as_mut() else {
            return Vec::new();
        };
        let mut messages = Vec::new();
        loop {
            match sub.rx.try_recv() {
                Ok(msg) => messages.push(msg),
                Err(TryRecvError::Lagged(missed)) => sub.dropped += missed,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        messages
    }

    /// Number of messages waiting to be drained.
    pub fn pending(&self) -> usize {
        self.subscription
            .as_ref()
            .map_or(0, |sub| sub.rx.len().min(sub.capacity))
    }

    /// Messages overwritten before they were drained (current subscription
    /// only). Overwrites are discovered by [`drain`](Self::drain).
    pub fn dropped(&self) -> u64 {
        self.subscription.as_ref().map_or(0, |sub| sub.dropped)
    }
}

impl PoseTransport for LoopbackTransport {
    fn subscribe(&mut self, topic: &str, queue_depth: usize) {
        self.unsubscribe();
        if topic.is_empty() {
            return;
        }
        let capacity = queue_depth.max(1).next_power_of_two();
        let (id, rx) = self.bus.attach(topic, capacity);
        self.subscription = Some(Subscription {
            topic: topic.to_owned(),
            id,
            capacity,
            rx,
            dropped: 0,
        });
    }

    fn unsubscribe(&mut self) {
        if let Some(sub) = self.subscription.take() {
            self.bus.detach(&sub.topic, sub.id);
        }
    }

    fn subscribed_topic(&self) -> Option<&str> {
        self.subscription.as_ref().map(|sub| sub.topic.as_str())
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
