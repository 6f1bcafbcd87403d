//! Stream and user lookups the narrow engine depends on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::message::{StreamId, UserId};

/// Stream/user directory and mute state, owned by the rest of the client.
pub trait Directory {
    /// Resolve a stream name (case-insensitive) to its id.
    fn stream_id(&self, name: &str) -> Option<StreamId>;

    /// Current display name of a stream.
    fn stream_name(&self, stream_id: StreamId) -> Option<String>;

    /// Whether the stream is shown in the home view (not muted).
    fn in_home_view(&self, stream_id: StreamId) -> bool;

    /// Resolve an email (case-insensitive) to a user id.
    fn user_id(&self, email: &str) -> Option<UserId>;

    /// Current email of a user.
    fn email(&self, user_id: UserId) -> Option<String>;

    /// Legacy mirrored realms treat `un`-prefixed and `.d`-suffixed streams and topics
    /// as variants of the same conversation.
    fn is_zephyr_mirror_realm(&self) -> bool {
        false
    }
}

/// Split a comma-joined email list into trimmed, non-empty parts.
pub fn split_emails(emails: &str) -> impl Iterator<Item = &str> {
    emails.split(',').map(str::trim).filter(|e| !e.is_empty())
}

/// Canonical form of a comma-joined email list: lower-cased, sorted, deduplicated.
pub fn normalize_emails(emails: &str) -> String {
    let mut parts: Vec<String> = split_emails(emails).map(str::to_lowercase).collect();
    parts.sort();
    parts.dedup();
    parts.join(",")
}

/// Convert "a@x,b@x" into the sorted user id string "4,17".
/// Returns None if any email is unknown.
pub fn reply_to_to_user_ids_string(directory: &dyn Directory, emails: &str) -> Option<String> {
    let mut ids = split_emails(emails)
        .map(|email| directory.user_id(email))
        .collect::<Option<Vec<_>>>()?;
    if ids.is_empty() {
        return None;
    }
    ids.sort_unstable();
    ids.dedup();
    Some(
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(","),
    )
}

/// Rewrite the email of `user_id` inside a comma-joined email list.
pub fn update_email_in_reply_to(
    directory: &dyn Directory,
    reply_to: &str,
    user_id: UserId,
    new_email: &str,
) -> String {
    split_emails(reply_to)
        .map(|email| {
            if directory.user_id(email) == Some(user_id) {
                new_email.to_string()
            } else {
                email.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Most current name for a stream, falling back to the given text.
pub fn canonical_stream_name(directory: &dyn Directory, name: &str) -> String {
    directory
        .stream_id(name)
        .and_then(|id| directory.stream_name(id))
        .unwrap_or_else(|| name.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub stream_id: StreamId,
    pub name: String,
    #[serde(default = "default_true")]
    pub in_home_view: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: UserId,
    pub email: String,
    /// Emails the user was previously known by; still resolve to this user.
    #[serde(default)]
    pub previous_emails: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// In-memory directory, e.g. loaded from a state snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    streams: HashMap<StreamId, StreamInfo>,
    stream_ids_by_name: HashMap<String, StreamId>,
    users: HashMap<UserId, UserInfo>,
    user_ids_by_email: HashMap<String, UserId>,
    zephyr_mirror_realm: bool,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zephyr_mirror_realm(mut self, enabled: bool) -> Self {
        self.zephyr_mirror_realm = enabled;
        self
    }

    pub fn add_stream(&mut self, stream: StreamInfo) {
        self.stream_ids_by_name
            .insert(stream.name.to_lowercase(), stream.stream_id);
        self.streams.insert(stream.stream_id, stream);
    }

    pub fn add_user(&mut self, user: UserInfo) {
        self.user_ids_by_email
            .insert(user.email.to_lowercase(), user.user_id);
        for email in &user.previous_emails {
            self.user_ids_by_email
                .insert(email.to_lowercase(), user.user_id);
        }
        self.users.insert(user.user_id, user);
    }

    /// Record an email change; the old address keeps resolving to the same user.
    pub fn update_email(&mut self, user_id: UserId, new_email: &str) {
        if let Some(user) = self.users.get_mut(&user_id) {
            let old = std::mem::replace(&mut user.email, new_email.to_string());
            user.previous_emails.push(old);
            self.user_ids_by_email
                .insert(new_email.to_lowercase(), user_id);
        } else {
            tracing::warn!("update_email for unknown user {}", user_id);
        }
    }

    pub fn set_in_home_view(&mut self, stream_id: StreamId, in_home_view: bool) {
        if let Some(stream) = self.streams.get_mut(&stream_id) {
            stream.in_home_view = in_home_view;
        }
    }
}

impl Directory for StaticDirectory {
    fn stream_id(&self, name: &str) -> Option<StreamId> {
        self.stream_ids_by_name.get(&name.to_lowercase()).copied()
    }

    fn stream_name(&self, stream_id: StreamId) -> Option<String> {
        self.streams.get(&stream_id).map(|s| s.name.clone())
    }

    fn in_home_view(&self, stream_id: StreamId) -> bool {
        self.streams
            .get(&stream_id)
            .map(|s| s.in_home_view)
            .unwrap_or(true)
    }

    fn user_id(&self, email: &str) -> Option<UserId> {
        self.user_ids_by_email.get(&email.to_lowercase()).copied()
    }

    fn email(&self, user_id: UserId) -> Option<String> {
        self.users.get(&user_id).map(|u| u.email.clone())
    }

    fn is_zephyr_mirror_realm(&self) -> bool {
        self.zephyr_mirror_realm
    }
}

#[cfg(test)]
pub(crate) fn test_directory() -> StaticDirectory {
    let mut dir = StaticDirectory::new();
    dir.add_stream(StreamInfo {
        stream_id: 1,
        name: "Denmark".to_string(),
        in_home_view: true,
    });
    dir.add_stream(StreamInfo {
        stream_id: 2,
        name: "Muted".to_string(),
        in_home_view: false,
    });
    for (user_id, email) in [
        (1, "iago@example.com"),
        (4, "alice@example.com"),
        (5, "bob@example.com"),
    ] {
        dir.add_user(UserInfo {
            user_id,
            email: email.to_string(),
            previous_emails: Vec::new(),
        });
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_emails() {
        assert_eq!(
            normalize_emails(" Bob@example.com, alice@example.com,bob@example.com"),
            "alice@example.com,bob@example.com"
        );
        assert_eq!(normalize_emails(""), "");
    }

    #[test]
    fn test_reply_to_to_user_ids_string() {
        let dir = test_directory();
        assert_eq!(
            reply_to_to_user_ids_string(&dir, "bob@example.com,ALICE@example.com"),
            Some("4,5".to_string())
        );
        assert_eq!(
            reply_to_to_user_ids_string(&dir, "alice@example.com,nobody@example.com"),
            None
        );
        assert_eq!(reply_to_to_user_ids_string(&dir, ""), None);
    }

    #[test]
    fn test_update_email_in_reply_to() {
        let dir = test_directory();
        assert_eq!(
            update_email_in_reply_to(&dir, "alice@example.com,bob@example.com", 4, "al@example.com"),
            "al@example.com,bob@example.com"
        );
    }

    #[test]
    fn test_update_email_keeps_old_address() {
        let mut dir = test_directory();
        dir.update_email(4, "al@example.com");
        assert_eq!(dir.user_id("alice@example.com"), Some(4));
        assert_eq!(dir.user_id("al@example.com"), Some(4));
        assert_eq!(dir.email(4).as_deref(), Some("al@example.com"));
    }

    #[test]
    fn test_stream_lookup() {
        let dir = test_directory();
        assert_eq!(dir.stream_id("denmark"), Some(1));
        assert_eq!(canonical_stream_name(&dir, "DENMARK"), "Denmark");
        assert_eq!(canonical_stream_name(&dir, "unknown"), "unknown");
        assert!(dir.in_home_view(1));
        assert!(!dir.in_home_view(2));
        // Unknown streams are not considered muted
        assert!(dir.in_home_view(99));
    }

    #[test]
    fn test_set_in_home_view() {
        let mut dir = test_directory();
        dir.set_in_home_view(1, false);
        dir.set_in_home_view(2, true);
        assert!(!dir.in_home_view(1));
        assert!(dir.in_home_view(2));
        // Unknown streams are ignored
        dir.set_in_home_view(99, false);
        assert!(dir.in_home_view(99));
    }
}
