//! Behavior classes
//!
//! A fragment's business logic is a [`Behavior`] registered under its class
//! name. The engine instantiates it through [`BehaviorRegistry`] and calls the
//! lifecycle hooks below; every hook is optional.

use std::collections::HashMap;
use std::fmt;

use crate::binder::Bindings;
use crate::errors::{MosaicError, Result};
use crate::include_tag::StateMap;
use serde_json::Value;

/// View of an instance's state handed to hooks
///
/// `set_var` writes are buffered and applied through the binder once the
/// hook returns, so they re-render like any external write.
pub struct HookContext<'a> {
    instance_id: &'a str,
    bindings: &'a Bindings,
    writes: Vec<(String, Value)>,
}

impl<'a> HookContext<'a> {
    pub fn new(instance_id: &'a str, bindings: &'a Bindings) -> Self {
        Self {
            instance_id,
            bindings,
            writes: Vec::new(),
        }
    }

    pub fn instance_id(&self) -> &str {
        self.instance_id
    }

    pub fn prop(&self, field: &str) -> Option<&Value> {
        self.bindings.prop(field)
    }

    /// Latest value, including writes buffered by this hook
    pub fn var(&self, field: &str) -> Option<&Value> {
        self.writes
            .iter()
            .rev()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
            .or_else(|| self.bindings.var(field))
    }

    pub fn set_var(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.writes.push((field.into(), value.into()));
    }

    pub fn into_writes(self) -> Vec<(String, Value)> {
        self.writes
    }
}

/// Lifecycle hooks of a component class
pub trait Behavior: Send {
    fn class_name(&self) -> &str;

    /// Props merged under the include tag's initial props
    fn default_props(&self) -> StateMap {
        StateMap::new()
    }

    /// Vars merged under the include tag's initial vars
    fn default_vars(&self) -> StateMap {
        StateMap::new()
    }

    /// Runs before the first substitution; vars set here may be new.
    fn initialize(&mut self, _ctx: &mut HookContext<'_>) {}

    fn before_mount(&mut self, _ctx: &mut HookContext<'_>) {}

    fn after_mount(&mut self, _ctx: &mut HookContext<'_>) {}

    fn before_unmount(&mut self, _ctx: &mut HookContext<'_>) {}

    fn after_unmount(&mut self, _ctx: &mut HookContext<'_>) {}

    /// Handler bound through a `$self.<handler>` event attribute
    fn on_event(&mut self, _handler: &str, _ctx: &mut HookContext<'_>) {}
}

pub type BehaviorFactory = Box<dyn Fn() -> Box<dyn Behavior> + Send + Sync>;

/// Class name to factory map, populated by the host application
#[derive(Default)]
pub struct BehaviorRegistry {
    factories: HashMap<String, BehaviorFactory>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `class_name`, replacing any previous one.
    pub fn register<F>(&mut self, class_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Behavior> + Send + Sync + 'static,
    {
        let class_name = class_name.into();
        tracing::debug!(class_name = %class_name, "behavior registered");
        self.factories.insert(class_name, Box::new(factory));
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.factories.contains_key(class_name)
    }

    /// # Errors
    ///
    /// Returns `UnknownBehaviorClass` when no factory is registered.
    pub fn instantiate(&self, class_name: &str) -> Result<Box<dyn Behavior>> {
        let factory = self.factories.get(class_name).ok_or_else(|| {
            tracing::warn!(class_name, "no behavior registered for class");
            MosaicError::UnknownBehaviorClass {
                class_name: class_name.to_string(),
            }
        })?;
        Ok(factory())
    }
}

impl fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("BehaviorRegistry")
            .field("classes", &names)
            .finish()
    }
}

/// Behavior with no hooks, for fragments whose script needs no engine-side
/// logic
#[derive(Debug, Clone)]
pub struct InertBehavior {
    class_name: String,
}

impl InertBehavior {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }
}

impl Behavior for InertBehavior {
    fn class_name(&self) -> &str {
        &self.class_name
    }
}
