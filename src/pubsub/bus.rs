use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::warn;
use tokio::sync::broadcast;

use crate::core::Error;

use super::Subscription;

const TOPIC_CAPACITY: usize = 64;

/// An in-process topic bus. Clones share the same topics.
///
/// A subscription ends once [`TopicBus::close`] is called for its topic or every
/// clone of the bus is dropped.
#[derive(Clone, Debug, Default)]
pub struct TopicBus {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<f32>>>>,
}

pub struct BusSubscription {
    topic: String,
    receiver: broadcast::Receiver<f32>,
}

impl TopicBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: &str) -> BusSubscription {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0);

        BusSubscription {
            topic: topic.to_string(),
            receiver: sender.subscribe(),
        }
    }

    /// Returns how many subscribers the value reached.
    pub fn publish(&self, topic: &str, value: f32) -> usize {
        let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);

        topics
            .get(topic)
            .and_then(|sender| sender.send(value).ok())
            .unwrap_or(0)
    }

    pub fn close(&self, topic: &str) {
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(topic);
    }
}

impl Subscription for BusSubscription {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn next(&mut self) -> Option<Result<f32, Error>> {
        loop {
            match self.receiver.recv().await {
                Ok(value) => return Some(Ok(value)),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Subscriber on {} fell behind, {missed} message(s) lost", self.topic);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn messages_arrive_in_order() {
        let bus = TopicBus::new();
        let mut subscription = bus.subscribe("analog_input");

        assert_eq!(bus.publish("analog_input", 0.1), 1);
        assert_eq!(bus.publish("analog_input", 0.2), 1);
        assert_eq!(bus.publish("unrelated", 0.3), 0);
        bus.close("analog_input");

        assert_eq!(subscription.next().await.unwrap().unwrap(), 0.1);
        assert_eq!(subscription.next().await.unwrap().unwrap(), 0.2);
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_the_bus_ends_subscriptions() {
        let bus = TopicBus::new();
        let mut subscription = bus.subscribe("foo");
        drop(bus);

        assert!(subscription.next().await.is_none());
    }
}
