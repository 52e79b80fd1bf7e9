//! Structured logging for relaybot.
//!
//! Console + optional rolling NDJSON file output, and redaction of secrets
//! before they reach a log line.

pub mod logger;
pub mod redact;

pub use logger::{LoggingOptions, init_logger};
pub use redact::redact_sensitive_data;
