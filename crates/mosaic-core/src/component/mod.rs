//! Component instances: behaviors, registry and lifecycle

pub mod behavior;
pub mod instance;
pub mod lifecycle;

pub use behavior::{Behavior, BehaviorFactory, BehaviorRegistry, HookContext, InertBehavior};
pub use instance::{ComponentInstance, ComponentRegistry};
pub use lifecycle::{
    create_instance, dispatch_event, get_prop, get_var, mount, register_instance, set_prop,
    set_var, unmount, unregister_instance, InstanceRequest,
};
