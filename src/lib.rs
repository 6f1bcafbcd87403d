//! Search-operator parsing, message filtering and local narrow selection for a
//! team chat client.

pub mod config;
pub mod constants;
pub mod directory;
pub mod message;
pub mod narrow;
pub mod snapshot;
pub mod unread;
