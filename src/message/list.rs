//! Locally cached messages, ordered by id.

use std::collections::BTreeMap;

use super::types::{Message, MessageId};

/// What we know about the boundaries of the cached history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStatus {
    pub found_oldest: bool,
    pub found_newest: bool,
}

/// The client-wide message cache.
/// Ids are unique and iteration is always in ascending id order.
#[derive(Debug, Clone, Default)]
pub struct MessageList {
    messages: BTreeMap<MessageId, Message>,
    pub fetch_status: FetchStatus,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let mut list = Self::new();
        list.add_messages(messages);
        list
    }

    /// Insert messages, replacing any cached copy with the same id.
    pub fn add_messages(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            if let Some(old) = self.messages.insert(message.id, message) {
                tracing::debug!("Replaced cached message {}", old.id);
            }
        }
    }

    pub fn remove(&mut self, id: MessageId) -> Option<Message> {
        self.messages.remove(&id)
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(&id)
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.messages.contains_key(&id)
    }

    pub fn all_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    pub fn first(&self) -> Option<&Message> {
        self.messages.values().next()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.values().next_back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_found_newest(&self) -> bool {
        self.fetch_status.found_newest
    }

    /// True if `id` lies within the cached id range (inclusive).
    pub fn covers(&self, id: MessageId) -> bool {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => first.id <= id && id <= last.id,
            _ => false,
        }
    }
}
