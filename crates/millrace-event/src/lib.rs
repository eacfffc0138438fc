//! # millrace-event
//!
//! The event data model for the millrace pipeline engine.
//!
//! An [`Event`] is an object-rooted tree of typed [`Value`]s. Fields are
//! addressed with dot-paths (`source.ip`); a literal dot inside a field name
//! is escaped as `\.`. Events serialize to and from JSON, with
//! [`Timestamp`]s rendered as RFC-3339 strings.
//!
//! ```rust
//! use millrace_event::{Event, Value};
//!
//! let mut event = Event::new();
//! event.put("event.id", Value::from("1234")).unwrap();
//! assert_eq!(event.get("event.id"), Some(&Value::from("1234")));
//! assert_eq!(serde_json::to_string(&event).unwrap(), r#"{"event":{"id":"1234"}}"#);
//! ```

pub mod convert;
pub mod error;
pub mod event;
pub mod time;
pub mod value;

pub use error::{EventError, Result};
pub use event::Event;
pub use time::Timestamp;
pub use value::{Value, ValueKind};
