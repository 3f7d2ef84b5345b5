//! Structured logging for the herald router.
//!
//! Console + rolling NDJSON output, secret redaction, and the dispatch event
//! records the router emits for every invocation.

pub mod dispatch_log;
pub mod logger;
pub mod redact;

pub use dispatch_log::{DispatchEvent, DispatchLogger, EventLogEntry};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
