//! Reactive binder: placeholder substitution and props/vars bindings

pub mod reactive;
pub mod substitute;

pub use reactive::{Bindings, FieldKind, ReactiveRecord};
pub use substitute::{capture_originals, display_value, render, substitute_field, tokens};
