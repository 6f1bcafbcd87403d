//! The currently active narrow and the facts the rest of the client derives from it.

use std::collections::HashMap;

use super::filter::Filter;
use super::term::Term;
use crate::directory::{self, Directory};
use crate::message::{MessageId, MessageList, StreamId, UserId};
use crate::unread::UnreadTracker;

/// Everything outside the narrow engine that selection decisions consult.
#[derive(Clone, Copy)]
pub struct NarrowEnv<'a> {
    pub messages: &'a MessageList,
    pub unread: &'a dyn UnreadTracker,
    pub directory: &'a dyn Directory,
}

/// Result of looking for the first unread message in a narrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstUnread {
    /// The client cannot decide which messages match (e.g. full-text search)
    CannotCompute,
    NotFound,
    Found(MessageId),
}

/// Stream, topic and PM recipient to prefill the compose box with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeDefaults {
    pub stream: Option<String>,
    pub topic: Option<String>,
    pub private_message_recipient: Option<String>,
}

/// The one active narrow (None means the home view).
#[derive(Debug, Clone, Default)]
pub struct NarrowContext {
    current: Option<Filter>,
}

impl NarrowContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: Filter) -> Self {
        Self {
            current: Some(filter),
        }
    }

    pub fn activate(&mut self, filter: Filter) {
        tracing::debug!("Narrowing to {}", filter.unparse());
        self.current = Some(filter);
    }

    pub fn deactivate(&mut self) {
        self.current = None;
    }

    pub fn active(&self) -> bool {
        self.current.is_some()
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.current.as_ref()
    }

    pub fn operators(&self) -> Vec<Term> {
        self.current
            .as_ref()
            .map(Filter::operators)
            .unwrap_or_default()
    }

    pub fn search_string(&self) -> String {
        self.current
            .as_ref()
            .map(Filter::unparse)
            .unwrap_or_default()
    }

    /// The single non-negated operand for `name`, or None if absent or repeated.
    fn single_operand(&self, name: &str) -> Option<&str> {
        single_operand(self.current.as_ref()?, name)
    }

    /// Narrowed stream, using the directory's current spelling of its name.
    pub fn stream(&self, directory: &dyn Directory) -> Option<String> {
        self.single_operand("stream")
            .map(|name| directory::canonical_stream_name(directory, name))
    }

    pub fn topic(&self) -> Option<String> {
        self.single_operand("topic").map(str::to_string)
    }

    /// For a PM narrow with users 4, 5 and 99 this is "4,5,99".
    pub fn pm_string(&self, directory: &dyn Directory) -> Option<String> {
        let emails = self.single_operand("pm-with")?;
        directory::reply_to_to_user_ids_string(directory, emails)
    }

    /// Compose defaults for operators that appear exactly once in the narrow.
    pub fn compose_defaults(&self, directory: &dyn Directory) -> ComposeDefaults {
        let mut single: HashMap<&str, Option<&str>> = HashMap::new();
        if let Some(filter) = &self.current {
            for term in filter.terms() {
                single
                    .entry(term.name())
                    .and_modify(|seen| *seen = None)
                    .or_insert(Some(term.operand()));
            }
        }
        let get = |name: &str| single.get(name).copied().flatten();

        ComposeDefaults {
            stream: get("stream").map(|s| directory::canonical_stream_name(directory, s)),
            topic: get("topic").map(str::to_string),
            private_message_recipient: get("pm-with").map(str::to_string),
        }
    }

    fn has_operator(&self, name: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|f| f.has_operator(name))
    }

    /// All PMs, or PMs with particular people.
    pub fn narrowed_to_pms(&self) -> bool {
        self.has_operator("pm-with")
            || self
                .current
                .as_ref()
                .is_some_and(|f| f.has_operand("is", "private"))
    }

    pub fn narrowed_by_pm_reply(&self) -> bool {
        self.current.as_ref().is_some_and(is_pm_reply)
    }

    pub fn narrowed_by_topic_reply(&self) -> bool {
        self.current.as_ref().is_some_and(is_topic_reply)
    }

    pub fn narrowed_by_reply(&self) -> bool {
        self.narrowed_by_pm_reply() || self.narrowed_by_topic_reply()
    }

    pub fn narrowed_by_stream_reply(&self) -> bool {
        self.current.as_ref().is_some_and(is_stream_reply)
    }

    pub fn narrowed_to_topic(&self) -> bool {
        self.has_operator("stream") && self.has_operator("topic")
    }

    pub fn narrowed_to_search(&self) -> bool {
        self.current.as_ref().is_some_and(Filter::is_search)
    }

    /// Topic muting applies on the home view and on a plain stream narrow only.
    pub fn muting_enabled(&self) -> bool {
        match &self.current {
            None => true,
            Some(filter) => {
                filter.operands("stream").len() == 1
                    && !filter.has_operator("topic")
                    && !filter.is_search()
            }
        }
    }

    pub fn is_for_stream_id(&self, stream_id: StreamId, directory: &dyn Directory) -> bool {
        let Some(name) = directory.stream_name(stream_id) else {
            tracing::warn!("Bad stream id {}", stream_id);
            return false;
        };
        self.stream(directory).is_some_and(|narrowed| narrowed == name)
    }

    /// Swap in a filter with `user_id`'s email rewritten. No-op on the home view.
    pub fn update_email(&mut self, user_id: UserId, new_email: &str, directory: &dyn Directory) {
        if let Some(filter) = &self.current {
            self.current = Some(filter.with_updated_email(user_id, new_email, directory));
        }
    }

    pub fn possible_unread_message_ids(&self, env: &NarrowEnv<'_>) -> Option<Vec<MessageId>> {
        possible_unread_message_ids(self.current.as_ref()?, env)
    }

    pub fn first_unread_info(&self, env: &NarrowEnv<'_>) -> FirstUnread {
        let Some(filter) = &self.current else {
            tracing::warn!("first_unread_info called without an active narrow");
            return FirstUnread::CannotCompute;
        };
        first_unread_info(filter, env)
    }
}

fn single_operand<'f>(filter: &'f Filter, name: &str) -> Option<&'f str> {
    match filter.operands(name).as_slice() {
        [operand] => Some(*operand),
        _ => None,
    }
}

fn is_pm_reply(filter: &Filter) -> bool {
    filter.terms().len() == 1 && filter.has_operator("pm-with")
}

fn is_topic_reply(filter: &Filter) -> bool {
    filter.terms().len() == 2
        && filter.operands("stream").len() == 1
        && filter.operands("topic").len() == 1
}

fn is_stream_reply(filter: &Filter) -> bool {
    filter.terms().len() == 1 && filter.operands("stream").len() == 1
}

/// Candidate unread ids for `filter`, from the narrowest bucket that covers it.
/// May include ids that do not match the filter. None when the filter cannot be
/// evaluated locally.
///
/// A stream or recipient the directory does not know has no unreads we track.
pub fn possible_unread_message_ids(
    filter: &Filter,
    env: &NarrowEnv<'_>,
) -> Option<Vec<MessageId>> {
    let unread = env.unread;

    if is_stream_reply(filter) {
        return Some(
            single_operand(filter, "stream")
                .and_then(|name| env.directory.stream_id(name))
                .map(|stream_id| unread.msg_ids_for_stream(stream_id))
                .unwrap_or_default(),
        );
    }
    if is_topic_reply(filter) {
        return Some(
            single_operand(filter, "stream")
                .and_then(|name| env.directory.stream_id(name))
                .zip(single_operand(filter, "topic"))
                .map(|(stream_id, topic)| unread.msg_ids_for_topic(stream_id, topic))
                .unwrap_or_default(),
        );
    }
    if is_pm_reply(filter) {
        return Some(
            single_operand(filter, "pm-with")
                .and_then(|emails| directory::reply_to_to_user_ids_string(env.directory, emails))
                .map(|user_ids| unread.msg_ids_for_person(&user_ids))
                .unwrap_or_default(),
        );
    }
    if filter.can_bucket_by(&["is-private"]) {
        return Some(unread.msg_ids_for_private());
    }
    if filter.can_bucket_by(&["is-mentioned"]) {
        return Some(unread.msg_ids_for_mentions());
    }
    if filter.can_bucket_by(&["is-starred"]) {
        return Some(unread.msg_ids_for_starred());
    }
    if filter.can_apply_locally() {
        return Some(unread.all_msg_ids());
    }
    None
}

/// First unread message in `filter`, judged against the cache.
pub fn first_unread_info(filter: &Filter, env: &NarrowEnv<'_>) -> FirstUnread {
    if !filter.can_apply_locally() {
        // Only the server knows which messages match
        return FirstUnread::CannotCompute;
    }
    let Some(ids) = possible_unread_message_ids(filter, env) else {
        return FirstUnread::CannotCompute;
    };
    match filter.first_valid_id_from(&ids, env.messages, env.directory) {
        Some(id) => FirstUnread::Found(id),
        None => FirstUnread::NotFound,
    }
}
