//! Field keys and event names written by the boundary logging macros
//!
//! `tracing` only accepts literal field names at the call site, so the
//! macros spell these out; readers (capture layers, tests, log queries)
//! go through the constants.

/// `module_path!()` of the emitting crate module
pub const FIELD_COMPONENT: &str = "component";
/// Public operation name, e.g. `mount` or `resolve_includes`
pub const FIELD_OP: &str = "op";
/// One of the `EVENT_*` values
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

pub const FIELD_INSTANCE_ID: &str = "instance_id";
/// Scans run by `resolve_includes`
pub const FIELD_PASSES: &str = "passes";
pub const FIELD_ERR_CODE: &str = "err_code";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_keys_are_plain_identifiers() {
        for key in [
            FIELD_COMPONENT,
            FIELD_OP,
            FIELD_EVENT,
            FIELD_DURATION_MS,
            FIELD_INSTANCE_ID,
            FIELD_PASSES,
            FIELD_ERR_CODE,
        ] {
            assert!(!key.is_empty());
            assert!(key.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{key}");
        }
    }

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }
}
