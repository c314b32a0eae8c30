use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataKind {
    Plan,
    Alert,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(rename = "type")]
    pub kind: MetadataKind,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, kind: MetadataKind, data: serde_json::Value) -> Self {
        self.metadata = Some(MessageMetadata { kind, data });
        self
    }
}

/// Append-only message log. Timestamps never go backwards: a message stamped
/// earlier than its predecessor (clock skew) is bumped up to match it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut message: Message) {
        if let Some(last) = self.messages.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_push_keeps_timestamps_ordered() {
        let mut transcript = Transcript::new();
        let first = Message::new(Sender::User, "hi");
        let stamp = first.timestamp;
        transcript.push(first);

        let mut skewed = Message::new(Sender::Bot, "hello");
        skewed.timestamp = stamp - Duration::seconds(5);
        transcript.push(skewed);

        let messages = transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].timestamp, stamp);
        assert_eq!(messages[1].text, "hello");
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Message::new(Sender::User, "a");
        let b = Message::new(Sender::User, "a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_metadata_serialization() {
        let message = Message::new(Sender::Bot, "Plan ready")
            .with_metadata(MetadataKind::Plan, serde_json::json!({"meals": 3}));
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["sender"], "bot");
        assert_eq!(value["metadata"]["type"], "plan");
        assert_eq!(value["metadata"]["data"]["meals"], 3);

        let plain = serde_json::to_value(Message::new(Sender::System, "note")).unwrap();
        assert!(plain.get("metadata").is_none());
    }
}
