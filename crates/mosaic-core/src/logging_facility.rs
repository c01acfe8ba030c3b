//! Structured logging facility for mosaic
//!
//! One initialization point (`init(profile)`), three boundary macros
//! (`log_op_start!`, `log_op_end!`, `log_op_error!`) and an in-memory
//! capture layer for tests.
//!
//! Boundary events are owned by the engine crate. Code in this crate only
//! emits `debug!`/`warn!` detail events.
//!
//! # Usage
//!
//! ```rust
//! use mosaic_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, pass_span, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
