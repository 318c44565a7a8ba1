//! Core types shared across migsnap facilities
//!
//! Holds the canonical field keys and event names used by the logging
//! macros in `migsnap-core` so every crate emits the same event shape.

pub mod schema;
