use super::substitute::{display_value, substitute_field};
use crate::dom::{NodeId, NodeTree};
use crate::errors::{MosaicError, Result};
use crate::include_tag::StateMap;
use serde_json::Value;

/// Which bucket a field lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Read-only after construction
    Props,
    /// Writable; writes re-render
    Vars,
}

/// Backing store for one bucket of named fields
#[derive(Debug, Clone, PartialEq)]
pub struct ReactiveRecord {
    kind: FieldKind,
    store: StateMap,
}

impl ReactiveRecord {
    pub fn new(kind: FieldKind, store: StateMap) -> Self {
        Self { kind, store }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.store.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.store.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.store.keys().map(String::as_str)
    }

    pub fn snapshot(&self) -> &StateMap {
        &self.store
    }
}

/// Props and vars of one component instance, bound to its cloned nodes
///
/// Props shadow vars of the same name when rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings {
    props: ReactiveRecord,
    vars: ReactiveRecord,
}

impl Bindings {
    pub fn new(props: StateMap, vars: StateMap) -> Self {
        Self {
            props: ReactiveRecord::new(FieldKind::Props, props),
            vars: ReactiveRecord::new(FieldKind::Vars, vars),
        }
    }

    pub fn props(&self) -> &ReactiveRecord {
        &self.props
    }

    pub fn vars(&self) -> &ReactiveRecord {
        &self.vars
    }

    pub fn prop(&self, field: &str) -> Option<&Value> {
        self.props.get(field)
    }

    pub fn var(&self, field: &str) -> Option<&Value> {
        self.vars.get(field)
    }

    /// Value a `{field}` token renders from
    pub fn lookup(&self, field: &str) -> Option<&Value> {
        self.props.get(field).or_else(|| self.vars.get(field))
    }

    fn render_lookup(&self) -> impl Fn(&str) -> Option<String> + '_ {
        move |name| self.lookup(name).map(display_value)
    }

    /// First substitution of every bound field across `roots`.
    pub fn wrap(&self, tree: &mut NodeTree, roots: &[NodeId]) {
        super::substitute::capture_originals(tree, roots);
        let fields: Vec<&str> = self.vars.fields().chain(self.props.fields()).collect();
        let lookup = self.render_lookup();
        for field in fields {
            substitute_field(tree, roots, field, &lookup);
        }
    }

    /// Write a var and re-render its tokens under `roots`.
    ///
    /// Returns the number of text/attribute values rewritten.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` when the instance has no var named `field`.
    pub fn set_var(
        &mut self,
        tree: &mut NodeTree,
        roots: &[NodeId],
        instance_id: &str,
        field: &str,
        value: Value,
    ) -> Result<usize> {
        if !self.vars.contains(field) {
            tracing::warn!(instance_id, field, "write to unknown var");
            return Err(MosaicError::UnknownField {
                instance_id: instance_id.to_string(),
                field: field.to_string(),
            });
        }
        self.vars.store.insert(field.to_string(), value);
        let rewritten = substitute_field(tree, roots, field, self.render_lookup());
        tracing::debug!(instance_id, field, rewritten, "var updated");
        Ok(rewritten)
    }

    /// Props are immutable after construction: the write is dropped.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` when the instance has no prop named `field`.
    pub fn set_prop(&self, instance_id: &str, field: &str, _value: Value) -> Result<()> {
        if !self.props.contains(field) {
            return Err(MosaicError::UnknownField {
                instance_id: instance_id.to_string(),
                field: field.to_string(),
            });
        }
        tracing::debug!(instance_id, field, "write to prop ignored");
        Ok(())
    }

    /// Add or overwrite a var before the bindings are wrapped.
    pub(crate) fn seed_var(&mut self, field: String, value: Value) {
        self.vars.store.insert(field, value);
    }
}
