//! Decide what a new narrow can show from the local cache, and where to land.

use super::filter::Filter;
use super::state::{self, FirstUnread, NarrowEnv};
use crate::message::{Message, MessageId};

/// Where a narrow wants to land.
///
/// `target_id` is what the user asked for, `local_select_id` is set only when the
/// cache can satisfy the narrow without the server, and `final_select_id` is the
/// message we will select once everything needed has been fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdInfo {
    pub target_id: Option<MessageId>,
    pub local_select_id: Option<MessageId>,
    pub final_select_id: Option<MessageId>,
}

impl IdInfo {
    pub fn new(target_id: Option<MessageId>) -> Self {
        Self {
            target_id,
            ..Self::default()
        }
    }
}

/// The message a narrow was asked to center on, and where that request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `near:` operand; unread messages before it take precedence.
    Near(MessageId),
    /// Permalink, `id:` operand or a caller-chosen message; selected as-is.
    Explicit(MessageId),
}

impl Target {
    pub fn id(self) -> MessageId {
        match self {
            Self::Near(id) | Self::Explicit(id) => id,
        }
    }
}

/// Reconciler output: the ids plus the cached messages that match the narrow.
#[derive(Debug, Clone, Default)]
pub struct LocalSelection<'a> {
    pub id_info: IdInfo,
    /// Matching cached messages in ascending id order. Empty when the narrow
    /// could not be evaluated locally.
    pub messages: Vec<&'a Message>,
}

impl LocalSelection<'_> {
    pub fn message_ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.id).collect()
    }

    fn contains(&self, id: MessageId) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }
}

/// Cached messages matching `filter`, ascending by id.
fn load_local_messages<'a>(filter: &Filter, env: &NarrowEnv<'a>) -> Vec<&'a Message> {
    env.messages
        .all_messages()
        .filter(|message| filter.matches(message, env.directory))
        .collect()
}

/// Work out the [`IdInfo`] for `filter` and the cached messages that match it.
///
/// Never fails: anything the cache cannot answer is left as None, which means
/// "ask the server".
pub fn maybe_add_local_messages<'a>(
    filter: &Filter,
    target: Option<Target>,
    env: &NarrowEnv<'a>,
) -> LocalSelection<'a> {
    let target_id = target.map(Target::id);
    let mut selection = LocalSelection {
        id_info: IdInfo::new(target_id),
        messages: Vec::new(),
    };

    match (state::first_unread_info(filter, env), target) {
        (FirstUnread::CannotCompute, _) => {
            // Full-text search: whatever is cached, the server decides.
            tracing::debug!("Narrow {} cannot be evaluated locally", filter.unparse());
            selection.id_info.final_select_id = target_id;
        }
        (FirstUnread::Found(unread_id), Some(Target::Near(near_id))) if unread_id < near_id => {
            // Catch up on unread messages before the near target, if we have them.
            selection.messages = load_local_messages(filter, env);
            if selection.contains(unread_id) {
                selection.id_info.final_select_id = Some(unread_id);
                selection.id_info.local_select_id = Some(unread_id);
            } else {
                tracing::debug!("First unread {} is not cached, keeping {}", unread_id, near_id);
                selection.id_info.final_select_id = Some(near_id);
            }
        }
        (FirstUnread::Found(unread_id), None) => {
            selection.id_info.final_select_id = Some(unread_id);
            selection.messages = load_local_messages(filter, env);
            if selection.contains(unread_id) {
                selection.id_info.local_select_id = Some(unread_id);
            } else {
                tracing::debug!(
                    "First unread {} for {} is not cached",
                    unread_id,
                    filter.unparse()
                );
            }
        }
        (FirstUnread::NotFound, None) => {
            // Nothing unread and no target: land on the earliest cached match.
            selection.messages = load_local_messages(filter, env);
            if let Some(first) = selection.messages.first() {
                selection.id_info.final_select_id = Some(first.id);
                selection.id_info.local_select_id = Some(first.id);
            }
        }
        (_, Some(target)) => {
            let target_id = target.id();
            selection.id_info.final_select_id = Some(target_id);
            if !env.messages.covers(target_id) {
                tracing::debug!("Target {} is outside the cached range", target_id);
                return selection;
            }
            selection.messages = load_local_messages(filter, env);
            if selection.contains(target_id) {
                selection.id_info.local_select_id = Some(target_id);
            }
        }
    }
    selection
}
