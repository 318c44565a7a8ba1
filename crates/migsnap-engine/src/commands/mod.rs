//! Command orchestration layer.
//!
//! Each service function brackets its work with the canonical
//! start/end/end_error log events and runs its writes in one transaction.

pub mod checkout;
pub mod create;
pub mod delete;
pub mod engine_command;
