use std::collections::HashMap;
use std::fmt;

use super::behavior::Behavior;
use crate::binder::Bindings;
use crate::dom::NodeId;
use crate::events::EventBinding;

/// One live occurrence of a fragment
pub struct ComponentInstance {
    pub instance_id: String,
    pub fragment_class: String,
    pub behavior: Box<dyn Behavior>,
    pub bindings: Bindings,
    /// Top-level cloned nodes, in markup order. Detached while unmounted.
    pub cloned_nodes: Vec<NodeId>,
    /// Bindings handed to the page registry on registration
    pub event_bindings: Vec<EventBinding>,
    pub mounted: bool,
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("instance_id", &self.instance_id)
            .field("fragment_class", &self.fragment_class)
            .field("behavior", &self.behavior.class_name())
            .field("bindings", &self.bindings)
            .field("cloned_nodes", &self.cloned_nodes)
            .field("mounted", &self.mounted)
            .finish()
    }
}

/// Id-keyed store of component instances
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    pub(crate) instances: HashMap<String, ComponentInstance>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.instances.contains_key(instance_id)
    }

    pub fn get(&self, instance_id: &str) -> Option<&ComponentInstance> {
        self.instances.get(instance_id)
    }

    pub fn get_mut(&mut self, instance_id: &str) -> Option<&mut ComponentInstance> {
        self.instances.get_mut(instance_id)
    }

    pub fn is_mounted(&self, instance_id: &str) -> bool {
        self.get(instance_id).is_some_and(|i| i.mounted)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Registered instance ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.instances.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
