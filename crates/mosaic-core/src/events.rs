//! Structured event bindings
//!
//! `onclick="$self.increment()"` inside a component's markup is not kept as
//! text. The attribute is removed from the clone and recorded here, keyed by
//! node and event, pointing at the owning instance and handler name.

use std::collections::HashMap;

use crate::dom::{NodeId, NodeTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    pub node: NodeId,
    pub event: String,
    pub instance_id: String,
    pub handler: String,
}

#[derive(Debug, Clone, Default)]
pub struct EventBindings {
    bindings: HashMap<(NodeId, String), EventBinding>,
}

impl EventBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId, event: &str) -> Option<&EventBinding> {
        self.bindings.get(&(node, event.to_ascii_lowercase()))
    }

    pub fn insert(&mut self, binding: EventBinding) {
        self.bindings
            .insert((binding.node, binding.event.clone()), binding);
    }

    /// Drop every binding owned by `instance_id`; returns how many
    pub fn remove_instance(&mut self, instance_id: &str) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|_, b| b.instance_id != instance_id);
        before - self.bindings.len()
    }

    pub fn for_instance(&self, instance_id: &str) -> Vec<&EventBinding> {
        let mut found: Vec<&EventBinding> = self
            .bindings
            .values()
            .filter(|b| b.instance_id == instance_id)
            .collect();
        found.sort_by(|a, b| (a.node, &a.event).cmp(&(b.node, &b.event)));
        found
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Handler name in `<token>.<handler>` or `<token>.<handler>()`
pub fn parse_handler<'v>(value: &'v str, self_token: &str) -> Option<&'v str> {
    let rest = value.trim().trim_end_matches(';').trim_end();
    let rest = rest.strip_prefix(self_token)?.strip_prefix('.')?;
    let name = rest.strip_suffix("()").unwrap_or(rest);
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    valid.then_some(name)
}

/// Strip self-referencing handler attributes under `roots` and return the
/// bindings they describe. Other `on*` attributes are left alone.
pub fn extract_bindings(
    tree: &mut NodeTree,
    roots: &[NodeId],
    instance_id: &str,
    self_token: &str,
) -> Vec<EventBinding> {
    let mut nodes = Vec::new();
    for root in roots {
        nodes.push(*root);
        nodes.extend(tree.descendants(*root));
    }

    let mut found = Vec::new();
    for node in nodes {
        let Some(element) = tree.element_mut(node) else {
            continue;
        };
        let mut kept = Vec::with_capacity(element.attributes.len());
        for attr in element.attributes.drain(..) {
            let event = attr
                .name
                .strip_prefix("on")
                .filter(|e| !e.is_empty())
                .map(str::to_ascii_lowercase);
            let handler = parse_handler(attr.template(), self_token).map(str::to_string);
            match (event, handler) {
                (Some(event), Some(handler)) => found.push(EventBinding {
                    node,
                    event,
                    instance_id: instance_id.to_string(),
                    handler,
                }),
                _ => kept.push(attr),
            }
        }
        element.attributes = kept;
    }

    if !found.is_empty() {
        tracing::debug!(instance_id, bindings = found.len(), "event bindings extracted");
    }
    found
}
