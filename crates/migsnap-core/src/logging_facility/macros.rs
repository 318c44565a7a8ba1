//! Operation lifecycle macros
//!
//! Create, checkout and delete each emit exactly one `start` event and then
//! either `end` or `end_error`, all tagged with the calling module as
//! `component`. The error event is derived from the canonical `ExError`, so
//! it carries the snapshot involved and how many targets were requested
//! without every call site repeating them.

/// Shared body of the lifecycle macros. Not part of the public surface.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    ($level:ident, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        $crate::logging_facility::tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// ```
/// # use migsnap_core::log_op_start;
/// log_op_start!("checkout", snapshot_name = "release-1", force = false);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            info,
            $op,
            $crate::logging_facility::schema::EVENT_START
            $(, $($field)*)?
        )
    };
}

/// Log the successful end of an operation; `duration_ms` is mandatory
///
/// ```
/// # use migsnap_core::log_op_end;
/// log_op_end!("delete_history", duration_ms = 3, snapshot_count = 2);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            info,
            $op,
            $crate::logging_facility::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Log a failed operation
///
/// Accepts anything convertible into `ExError`. Besides kind and code the
/// event records `snapshot_name` (the error's entity, empty when none),
/// `requested_targets` for executor failures, and the user-facing message.
///
/// ```
/// # use migsnap_core::{log_op_error, errors::SnapshotError};
/// let err = SnapshotError::EmptyTarget { name: "release-1".to_string() };
/// log_op_error!("checkout", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_op_event!(
            error,
            $op,
            $crate::logging_facility::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            snapshot_name = ex_err.entity_id().unwrap_or_default(),
            requested_targets = ex_err.targets().map_or(0, |t| t.len()),
            $($($field)*,)?
            "{}",
            ex_err.message()
        );
    }};
}
