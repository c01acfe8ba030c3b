//! Boundary logging macros
//!
//! Each public engine operation logs `start`, then either `end` or
//! `end_error`. All three go through [`__log_op_event!`], which stamps
//! `component = module_path!()`, `op` and `event`; any trailing
//! `key = value` fields pass straight through to `tracing`.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    ($level:ident, $op:expr, $event:ident $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $crate::mosaic_core_types::schema::$event,
            $($($field)*)?
        )
    };
}

/// ```
/// # use mosaic_core::log_op_start;
/// log_op_start!("mount");
/// log_op_start!("mount", instance_id = "Counter1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(info, $op, EVENT_START $(, $($field)*)?)
    };
}

/// `duration_ms` is required and comes first.
///
/// ```
/// # use mosaic_core::log_op_end;
/// log_op_end!("mount", duration_ms = 3);
/// log_op_end!("resolve_includes", duration_ms = 12, passes = 4);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(info, $op, EVENT_END, duration_ms = $duration $(, $($field)*)?)
    };
}

/// Log a failed operation at `error` level. Anything convertible into
/// `ExError` is accepted; its kind, `ERR_*` code and message are logged.
///
/// ```
/// # use mosaic_core::{log_op_error, errors::MosaicError};
/// let err = MosaicError::NotMounted { instance_id: "Counter1".to_string() };
/// log_op_error!("unmount", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_op_event!(
            error,
            $op,
            EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            message = ex_err.message()
            $(, $($field)*)?
        )
    }};
}
