use core::fmt::Write;

use heapless::String;

/// Capacity of one topic string.
pub const TOPIC_CAPACITY: usize = 96;

pub type Topic = String<TOPIC_CAPACITY>;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    TopicTooLong,
}

/// Where an inbound message should go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inbound {
    Command,
    Meta,
    Other,
}

/// Per-device topic names, namespaced as `u/{user}/d/{device}/...`.
#[derive(Clone, Debug)]
pub struct Topics {
    pub telemetry: Topic,
    pub command: Topic,
    pub meta: Topic,
    pub status: Topic,
}

impl Topics {
    pub fn new(user_id: &str, device_id: &str) -> Result<Self, Error> {
        Ok(Self {
            telemetry: build(user_id, device_id, "telemetry")?,
            command: build(user_id, device_id, "cmd")?,
            meta: build(user_id, device_id, "meta")?,
            status: build(user_id, device_id, "status")?,
        })
    }

    pub fn classify(&self, topic: &str) -> Inbound {
        if topic == self.command.as_str() {
            Inbound::Command
        } else if topic == self.meta.as_str() {
            Inbound::Meta
        } else {
            Inbound::Other
        }
    }
}

fn build(user_id: &str, device_id: &str, leaf: &str) -> Result<Topic, Error> {
    let mut topic = Topic::new();
    write!(topic, "u/{}/d/{}/{}", user_id, device_id, leaf).map_err(|_| Error::TopicTooLong)?;
    Ok(topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_per_user_and_device() {
        let topics = Topics::new("42", "pump-1").unwrap();
        assert_eq!(topics.telemetry.as_str(), "u/42/d/pump-1/telemetry");
        assert_eq!(topics.command.as_str(), "u/42/d/pump-1/cmd");
        assert_eq!(topics.meta.as_str(), "u/42/d/pump-1/meta");
        assert_eq!(topics.status.as_str(), "u/42/d/pump-1/status");
    }

    #[test]
    fn classifies_inbound_topics() {
        let topics = Topics::new("42", "pump-1").unwrap();
        assert_eq!(topics.classify("u/42/d/pump-1/cmd"), Inbound::Command);
        assert_eq!(topics.classify("u/42/d/pump-1/meta"), Inbound::Meta);
        assert_eq!(topics.classify("u/42/d/pump-2/cmd"), Inbound::Other);
    }

    #[test]
    fn oversized_ids_are_rejected() {
        let long = "x".repeat(TOPIC_CAPACITY);
        assert_eq!(Topics::new("1", &long).unwrap_err(), Error::TopicTooLong);
    }
}
