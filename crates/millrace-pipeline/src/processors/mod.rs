//! Built-in processors.
//!
//! Every processor here is a pure function of its configuration and the
//! event: construction validates the config once, `process` only reads and
//! writes event fields.

pub mod append;
pub mod case;
pub mod community_id;
pub mod remove;
pub mod set;
