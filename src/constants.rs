//! Application-wide constants for tuning and configuration

/// Messages to request before the anchor when a narrow needs the server.
pub const NARROW_FETCH_BEFORE: u32 = 50;

/// Messages to request after the anchor when a narrow needs the server.
pub const NARROW_FETCH_AFTER: u32 = 50;

/// Default tracing filter when RUST_LOG is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,narrow=debug";

/// Log file name inside the config directory.
pub const LOG_FILE_NAME: &str = "narrow.log";
