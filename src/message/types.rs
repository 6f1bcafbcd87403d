use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub type MessageId = u64;
pub type StreamId = u64;
pub type UserId = u64;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct MessageFlags: u32 {
        const READ = 0b00000001;
        const STARRED = 0b00000010;
        const MENTIONED = 0b00000100;
        const ALERTED = 0b00001000;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Stream,
    Private,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// Stream name (empty for private messages)
    #[serde(default)]
    pub stream: String,
    #[serde(default)]
    pub stream_id: Option<StreamId>,
    #[serde(default, alias = "subject")]
    pub topic: String,
    pub sender_id: UserId,
    #[serde(default)]
    pub sender_email: String,
    /// Comma-joined emails of the other conversation members (private messages only)
    #[serde(default)]
    pub reply_to: String,
    /// Rendered HTML content
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub flags: MessageFlags,
}

impl Message {
    pub fn is_stream(&self) -> bool {
        self.kind == MessageKind::Stream
    }

    pub fn is_private(&self) -> bool {
        self.kind == MessageKind::Private
    }

    pub fn is_unread(&self) -> bool {
        !self.flags.contains(MessageFlags::READ)
    }

    pub fn is_starred(&self) -> bool {
        self.flags.contains(MessageFlags::STARRED)
    }

    pub fn is_mentioned(&self) -> bool {
        self.flags.contains(MessageFlags::MENTIONED)
    }

    pub fn is_alerted(&self) -> bool {
        self.flags.contains(MessageFlags::ALERTED)
    }
}

#[cfg(test)]
impl Message {
    /// Unread stream message (for tests).
    pub fn stream_message(id: MessageId, stream: &str, topic: &str) -> Self {
        Self {
            id,
            kind: MessageKind::Stream,
            stream: stream.to_string(),
            topic: topic.to_string(),
            sender_id: 1,
            sender_email: "iago@example.com".to_string(),
            ..Self::default()
        }
    }

    /// Unread private message (for tests).
    pub fn private_message(id: MessageId, reply_to: &str) -> Self {
        Self {
            id,
            kind: MessageKind::Private,
            sender_id: 1,
            sender_email: "iago@example.com".to_string(),
            reply_to: reply_to.to_string(),
            ..Self::default()
        }
    }

    pub fn with_flags(mut self, flags: MessageFlags) -> Self {
        self.flags = flags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_helpers() {
        let msg = Message::stream_message(1, "Denmark", "tennis")
            .with_flags(MessageFlags::STARRED | MessageFlags::READ);
        assert!(msg.is_stream());
        assert!(msg.is_starred());
        assert!(!msg.is_unread());
        assert!(!msg.is_mentioned());
        assert!(!msg.is_alerted());
    }

    #[test]
    fn test_deserialize_message() {
        let toml = r#"
            id = 7
            type = "private"
            sender_id = 3
            reply_to = "alice@example.com"
            flags = "STARRED | MENTIONED"
        "#;

        let msg: Message = toml::from_str(toml).unwrap();
        assert_eq!(msg.id, 7);
        assert!(msg.is_private());
        assert!(msg.is_starred());
        assert!(msg.is_mentioned());
        assert!(msg.is_unread());
    }

    #[test]
    fn test_subject_alias() {
        let toml = r#"
            id = 1
            stream = "Denmark"
            subject = "tennis"
            sender_id = 3
        "#;

        let msg: Message = toml::from_str(toml).unwrap();
        assert!(msg.is_stream());
        assert_eq!(msg.topic, "tennis");
    }
}
