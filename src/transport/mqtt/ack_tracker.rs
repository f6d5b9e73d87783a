//! Correlation of outgoing requests with broker acknowledgements
//!
//! rumqttc assigns packet ids inside the event loop, so a caller cannot know the
//! id of its own PUBLISH or SUBSCRIBE up front. Requests are processed in the
//! order they were queued, which lets the tracker pair each `Outgoing` event
//! with the oldest queued waiter and then wait for the matching ack by id.

use super::connection::MqttError;
use rumqttc::QoS;
use std::collections::{HashMap, VecDeque};
use tokio::sync::oneshot;

pub type AckResult = Result<(), MqttError>;
pub type AckReceiver = oneshot::Receiver<AckResult>;
type AckSender = oneshot::Sender<AckResult>;

struct PendingSubscribe {
    filter: String,
    done: AckSender,
}

#[derive(Default)]
pub struct AckTracker {
    queued_publishes: VecDeque<(QoS, AckSender)>,
    inflight_publishes: HashMap<u16, AckSender>,
    queued_subscribes: VecDeque<PendingSubscribe>,
    inflight_subscribes: HashMap<u16, PendingSubscribe>,
}

impl AckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a publish that is about to be queued on the client
    pub fn expect_publish(&mut self, qos: QoS) -> AckReceiver {
        let (done, wait) = oneshot::channel();
        self.queued_publishes.push_back((qos, done));
        wait
    }

    /// Register a subscribe that is about to be queued on the client
    pub fn expect_subscribe(&mut self, filter: &str) -> AckReceiver {
        let (done, wait) = oneshot::channel();
        self.queued_subscribes.push_back(PendingSubscribe {
            filter: filter.to_string(),
            done,
        });
        wait
    }

    /// PUBLISH written. QoS 0 is complete here; QoS 1 and 2 wait for their ack.
    pub fn publish_sent(&mut self, pkid: u16) {
        let Some((qos, done)) = self.queued_publishes.pop_front() else {
            return;
        };

        if qos == QoS::AtMostOnce {
            let _ = done.send(Ok(()));
        } else {
            self.inflight_publishes.insert(pkid, done);
        }
    }

    /// PUBACK or PUBCOMP received
    pub fn publish_confirmed(&mut self, pkid: u16) {
        if let Some(done) = self.inflight_publishes.remove(&pkid) {
            let _ = done.send(Ok(()));
        }
    }

    pub fn subscribe_sent(&mut self, pkid: u16) {
        if let Some(pending) = self.queued_subscribes.pop_front() {
            self.inflight_subscribes.insert(pkid, pending);
        }
    }

    /// SUBACK received; `accepted` is false when the broker refused the filter
    pub fn subscription_confirmed(&mut self, pkid: u16, accepted: bool) {
        if let Some(pending) = self.inflight_subscribes.remove(&pkid) {
            let result = if accepted {
                Ok(())
            } else {
                Err(MqttError::SubscriptionRejected {
                    filter: pending.filter,
                })
            };
            let _ = pending.done.send(result);
        }
    }

    /// Fail every waiter, used when the session ends
    pub fn fail_all(&mut self, reason: &str) {
        let lost = || -> AckResult { Err(MqttError::ConnectionLost(reason.to_string())) };

        for (_, done) in self.queued_publishes.drain(..) {
            let _ = done.send(lost());
        }
        for (_, done) in self.inflight_publishes.drain() {
            let _ = done.send(lost());
        }
        for pending in self.queued_subscribes.drain(..) {
            let _ = pending.done.send(lost());
        }
        for (_, pending) in self.inflight_subscribes.drain() {
            let _ = pending.done.send(lost());
        }
    }

    /// Number of requests still waiting for the broker
    pub fn pending(&self) -> usize {
        self.queued_publishes.len()
            + self.inflight_publishes.len()
            + self.queued_subscribes.len()
            + self.inflight_subscribes.len()
    }
}
