//! Include tag validation
//!
//! Reads an `<include>` element into an [`IncludeDirective`]. Validation
//! happens before the inclusion graph is touched or anything is fetched.

use crate::config::Vocabulary;
use crate::dom::{NodeId, NodeTree};
use crate::errors::{MosaicError, Result};
use serde_json::{Map, Value};

/// JSON object of initial props or vars
pub type StateMap = Map<String, Value>;

/// Component half of a component include
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTarget {
    pub class_name: String,
    pub instance_id: String,
    pub props: StateMap,
    pub vars: StateMap,
}

/// A validated include tag
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeDirective {
    pub node: NodeId,
    pub src: String,
    pub include_in: String,
    pub repeat: usize,
    pub component: Option<ComponentTarget>,
}

impl IncludeDirective {
    /// Validate the include element at `node`.
    ///
    /// # Errors
    ///
    /// - `MissingRequiredAttribute` when `src` or `include-in` is absent, or
    ///   only one of the component class / component id pair is given
    /// - `InvalidRepeatValue` when `repeat` is not an integer of at least 1
    /// - `InvalidInitialState` when supplied props/vars are not JSON objects
    pub fn from_element(tree: &NodeTree, node: NodeId, vocabulary: &Vocabulary) -> Result<Self> {
        let element = tree.element(node).ok_or_else(|| MosaicError::Internal {
            message: format!("include node {} is not an element", node),
        })?;

        let src = non_empty(element.attr(&vocabulary.src_attr));
        let include_in = non_empty(element.attr(&vocabulary.include_in_attr));

        let missing = |attribute: &str| {
            let err = MosaicError::MissingRequiredAttribute {
                attribute: attribute.to_string(),
                include_in: include_in.clone().unwrap_or_default(),
                src: src.clone().unwrap_or_default(),
            };
            tracing::warn!(
                attribute,
                src = src.as_deref().unwrap_or(""),
                include_in = include_in.as_deref().unwrap_or(""),
                "include tag missing required attribute"
            );
            err
        };

        let Some(src) = src.clone() else {
            return Err(missing(&vocabulary.src_attr));
        };
        let Some(include_in) = include_in.clone() else {
            return Err(missing(&vocabulary.include_in_attr));
        };

        let class_name = vocabulary
            .component_class_attrs
            .iter()
            .find_map(|attr| non_empty(element.attr(attr)));
        let instance_id = non_empty(element.attr(&vocabulary.component_id_attr));

        let class_attr = vocabulary
            .component_class_attrs
            .first()
            .map(String::as_str)
            .unwrap_or("component-class");
        let component_ids = match (class_name, instance_id) {
            (None, None) => None,
            (Some(_), None) => return Err(missing(&vocabulary.component_id_attr)),
            (None, Some(_)) => return Err(missing(class_attr)),
            (Some(class), Some(id)) => Some((class, id)),
        };

        let repeat = parse_repeat(element.attr(&vocabulary.repeat_attr), &src, &include_in)?;

        let component = match component_ids {
            None => None,
            Some((class_name, instance_id)) => Some(ComponentTarget {
                props: read_state(tree, node, &vocabulary.props_name, &src)?,
                vars: read_state(tree, node, &vocabulary.vars_name, &src)?,
                class_name,
                instance_id,
            }),
        };

        tracing::debug!(
            src = %src,
            include_in = %include_in,
            repeat,
            component = component.is_some(),
            "include tag validated"
        );

        Ok(Self {
            node,
            src,
            include_in,
            repeat,
            component,
        })
    }

    pub fn is_component(&self) -> bool {
        self.component.is_some()
    }

    /// Instance ids created for a component include: the declared id when
    /// `repeat` is 1, else `<id>-1 ..= <id>-N`.
    pub fn instance_ids(&self) -> Vec<String> {
        let Some(component) = &self.component else {
            return Vec::new();
        };
        if self.repeat == 1 {
            return vec![component.instance_id.clone()];
        }
        (1..=self.repeat)
            .map(|n| format!("{}-{}", component.instance_id, n))
            .collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_repeat(value: Option<&str>, src: &str, include_in: &str) -> Result<usize> {
    let Some(raw) = value else {
        return Ok(1);
    };
    let invalid = || {
        tracing::warn!(value = raw, src, include_in, "include tag has invalid repeat value");
        MosaicError::InvalidRepeatValue {
            value: raw.to_string(),
            include_in: include_in.to_string(),
            src: src.to_string(),
        }
    };
    let parsed: i64 = raw.trim().parse().map_err(|_| invalid())?;
    if parsed < 1 {
        return Err(invalid());
    }
    usize::try_from(parsed).map_err(|_| invalid())
}

/// Attribute JSON first, then nested `<props>`/`<vars>` elements merged on
/// top in document order.
fn read_state(tree: &NodeTree, node: NodeId, name: &str, src: &str) -> Result<StateMap> {
    let mut state = StateMap::new();

    if let Some(raw) = non_empty(tree.get_attribute(node, name)) {
        state.extend(parse_object(&raw, name, src)?);
    }

    let nested: Vec<NodeId> = tree
        .children(node)
        .iter()
        .copied()
        .filter(|c| tree.kind(*c).is_some_and(|k| k.is_element_named(name)))
        .collect();
    for section in nested {
        let raw = tree.text_content(section);
        if raw.trim().is_empty() {
            continue;
        }
        state.extend(parse_object(&raw, name, src)?);
    }

    Ok(state)
}

fn parse_object(raw: &str, section: &str, src: &str) -> Result<StateMap> {
    let invalid = |reason: String| {
        tracing::warn!(section, src, reason = %reason, "include tag has invalid initial state");
        MosaicError::InvalidInitialState {
            section: section.to_string(),
            src: src.to_string(),
            reason,
        }
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(invalid(format!("expected an object, got {}", json_type(&other)))),
        Err(e) => Err(invalid(e.to_string())),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
