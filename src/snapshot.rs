//! Client state snapshots: streams, users and cached messages in one TOML file.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::directory::{StaticDirectory, StreamInfo, UserInfo};
use crate::message::{FetchStatus, Message, MessageId, MessageList, UserId};
use crate::unread::UnreadIndex;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate message id {0}")]
    DuplicateMessage(MessageId),

    #[error("Message {message_id} has unknown sender {sender_id}")]
    UnknownSender {
        message_id: MessageId,
        sender_id: UserId,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    zephyr_mirror_realm: bool,
    #[serde(default)]
    found_oldest: bool,
    #[serde(default)]
    found_newest: bool,
    #[serde(default)]
    streams: Vec<StreamInfo>,
    #[serde(default)]
    users: Vec<UserInfo>,
    #[serde(default)]
    messages: Vec<Message>,
}

/// Everything the narrow engine consults, built from one snapshot.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub directory: StaticDirectory,
    pub messages: MessageList,
    pub unread: UnreadIndex,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, SnapshotError> {
        let raw: RawSnapshot = toml::from_str(content)?;

        let known_users: HashSet<UserId> = raw.users.iter().map(|u| u.user_id).collect();
        let mut seen = HashSet::new();
        for message in &raw.messages {
            if !seen.insert(message.id) {
                return Err(SnapshotError::DuplicateMessage(message.id));
            }
            if !known_users.contains(&message.sender_id) && message.sender_email.is_empty() {
                return Err(SnapshotError::UnknownSender {
                    message_id: message.id,
                    sender_id: message.sender_id,
                });
            }
        }

        let mut directory = StaticDirectory::new().with_zephyr_mirror_realm(raw.zephyr_mirror_realm);
        for stream in raw.streams {
            directory.add_stream(stream);
        }
        for user in raw.users {
            directory.add_user(user);
        }

        let mut messages = MessageList::from_messages(raw.messages);
        messages.fetch_status = FetchStatus {
            found_oldest: raw.found_oldest,
            found_newest: raw.found_newest,
        };

        let mut unread = UnreadIndex::new();
        unread.process_loaded_messages(messages.all_messages(), &directory);
        tracing::debug!(
            "Loaded snapshot: {} messages, {} unread",
            messages.len(),
            unread.count()
        );

        Ok(Self {
            directory,
            messages,
            unread,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Directory;
    use crate::unread::UnreadTracker;

    const SNAPSHOT: &str = r#"
        found_newest = true

        [[streams]]
        stream_id = 1
        name = "Denmark"

        [[streams]]
        stream_id = 2
        name = "Muted"
        in_home_view = false

        [[users]]
        user_id = 4
        email = "alice@example.com"

        [[messages]]
        id = 37
        stream = "Denmark"
        stream_id = 1
        topic = "tennis"
        sender_id = 4
        flags = "READ"

        [[messages]]
        id = 42
        type = "private"
        sender_id = 4
        reply_to = "alice@example.com"
    "#;

    #[test]
    fn test_load_snapshot() {
        let snapshot = Snapshot::from_toml(SNAPSHOT).unwrap();
        assert_eq!(snapshot.messages.len(), 2);
        assert!(snapshot.messages.has_found_newest());
        assert_eq!(snapshot.directory.stream_id("denmark"), Some(1));
        assert!(!snapshot.directory.in_home_view(2));
        assert_eq!(snapshot.unread.all_msg_ids(), vec![42]);
        assert_eq!(snapshot.unread.msg_ids_for_person("4"), vec![42]);
    }

    #[test]
    fn test_duplicate_message_rejected() {
        let content = r#"
            [[users]]
            user_id = 1
            email = "a@example.com"

            [[messages]]
            id = 1
            sender_id = 1

            [[messages]]
            id = 1
            sender_id = 1
        "#;
        assert!(matches!(
            Snapshot::from_toml(content),
            Err(SnapshotError::DuplicateMessage(1))
        ));
    }

    #[test]
    fn test_unknown_sender_rejected() {
        let content = r#"
            [[messages]]
            id = 3
            sender_id = 9
        "#;
        let err = Snapshot::from_toml(content).unwrap_err();
        assert_eq!(err.to_string(), "Message 3 has unknown sender 9");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Snapshot::from_toml("messages = 3"),
            Err(SnapshotError::Parse(_))
        ));
    }
}
