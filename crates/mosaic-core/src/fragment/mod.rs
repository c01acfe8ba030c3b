//! Fragment compilation, validation and registration

pub mod compiler;
pub mod registry;

pub use compiler::{compile, Sections};
pub use registry::{
    register_fragment, unregister_fragment, FragmentRegistry, FragmentTemplate, RegisterOutcome,
    SectionKind,
};
