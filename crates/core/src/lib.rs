//! Domain core for the Dentiq patient communication service.
//!
//! This crate has zero internal dependencies so it can be used by the
//! persistence layer, the lifecycle engine, and any future CLI tooling.

pub mod comms;
pub mod content;
pub mod types;
