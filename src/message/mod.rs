pub mod list;
pub mod types;

pub use list::{FetchStatus, MessageList};
pub use types::{Message, MessageFlags, MessageId, MessageKind, StreamId, UserId};
