//! Unread message bookkeeping, bucketed the way narrows ask for it.

use std::collections::{BTreeSet, HashMap};

use crate::directory::{self, Directory};
use crate::message::{Message, MessageId, StreamId};

/// Source of unread message ids. Every method returns ids in ascending order.
pub trait UnreadTracker {
    fn msg_ids_for_stream(&self, stream_id: StreamId) -> Vec<MessageId>;
    fn msg_ids_for_topic(&self, stream_id: StreamId, topic: &str) -> Vec<MessageId>;
    /// `user_ids` is the sorted comma-joined id string of a PM conversation.
    fn msg_ids_for_person(&self, user_ids: &str) -> Vec<MessageId>;
    fn msg_ids_for_private(&self) -> Vec<MessageId>;
    fn msg_ids_for_mentions(&self) -> Vec<MessageId>;
    fn msg_ids_for_starred(&self) -> Vec<MessageId>;
    fn all_msg_ids(&self) -> Vec<MessageId>;
}

/// In-memory unread index fed from loaded messages.
#[derive(Debug, Clone, Default)]
pub struct UnreadIndex {
    all: BTreeSet<MessageId>,
    by_stream: HashMap<StreamId, BTreeSet<MessageId>>,
    /// Keyed by (stream id, lower-cased topic)
    by_topic: HashMap<(StreamId, String), BTreeSet<MessageId>>,
    by_person: HashMap<String, BTreeSet<MessageId>>,
    private: BTreeSet<MessageId>,
    mentions: BTreeSet<MessageId>,
    starred: BTreeSet<MessageId>,
}

impl UnreadIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every unread message in `messages`.
    pub fn process_loaded_messages<'a>(
        &mut self,
        messages: impl IntoIterator<Item = &'a Message>,
        directory: &dyn Directory,
    ) {
        for message in messages {
            if message.is_unread() {
                self.add(message, directory);
            }
        }
    }

    fn add(&mut self, message: &Message, directory: &dyn Directory) {
        let id = message.id;
        self.all.insert(id);

        if message.is_private() {
            self.private.insert(id);
            match directory::reply_to_to_user_ids_string(directory, &message.reply_to) {
                Some(key) => {
                    self.by_person.entry(key).or_default().insert(id);
                }
                None => tracing::debug!("Unread PM {} has unknown recipients", id),
            }
        } else if let Some(stream_id) = message
            .stream_id
            .or_else(|| directory.stream_id(&message.stream))
        {
            self.by_stream.entry(stream_id).or_default().insert(id);
            self.by_topic
                .entry((stream_id, message.topic.to_lowercase()))
                .or_default()
                .insert(id);
        }

        if message.is_mentioned() {
            self.mentions.insert(id);
        }
        if message.is_starred() {
            self.starred.insert(id);
        }
    }

    pub fn mark_as_read(&mut self, id: MessageId) {
        if !self.all.remove(&id) {
            return;
        }
        self.private.remove(&id);
        self.mentions.remove(&id);
        self.starred.remove(&id);
        for ids in self.by_stream.values_mut() {
            ids.remove(&id);
        }
        for ids in self.by_topic.values_mut() {
            ids.remove(&id);
        }
        for ids in self.by_person.values_mut() {
            ids.remove(&id);
        }
    }

    pub fn count(&self) -> usize {
        self.all.len()
    }
}

fn to_vec(ids: Option<&BTreeSet<MessageId>>) -> Vec<MessageId> {
    ids.map(|ids| ids.iter().copied().collect()).unwrap_or_default()
}

impl UnreadTracker for UnreadIndex {
    fn msg_ids_for_stream(&self, stream_id: StreamId) -> Vec<MessageId> {
        to_vec(self.by_stream.get(&stream_id))
    }

    fn msg_ids_for_topic(&self, stream_id: StreamId, topic: &str) -> Vec<MessageId> {
        to_vec(self.by_topic.get(&(stream_id, topic.to_lowercase())))
    }

    fn msg_ids_for_person(&self, user_ids: &str) -> Vec<MessageId> {
        to_vec(self.by_person.get(user_ids))
    }

    fn msg_ids_for_private(&self) -> Vec<MessageId> {
        to_vec(Some(&self.private))
    }

    fn msg_ids_for_mentions(&self) -> Vec<MessageId> {
        to_vec(Some(&self.mentions))
    }

    fn msg_ids_for_starred(&self) -> Vec<MessageId> {
        to_vec(Some(&self.starred))
    }

    fn all_msg_ids(&self) -> Vec<MessageId> {
        to_vec(Some(&self.all))
    }
}
