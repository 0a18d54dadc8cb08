//! Observability for aeropolicy
//!
//! Structured JSON logging of lifecycle events.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on policy evaluation
//! 3. No async or background threads
//!
//! # Usage
//!
//! ```ignore
//! use aeropolicy::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ManifestParsed, &[("policies", "3")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event with fields at the event's own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
