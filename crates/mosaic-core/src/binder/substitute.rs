//! Placeholder substitution
//!
//! Text nodes and attribute values may hold `{field}` tokens. The first
//! substitution freezes the pristine text into the node's `original` slot.
//! Every later render starts again from that template and fills in every
//! field that currently has a value. Tokens without a value stay literal, so
//! substituting one field can never erase another field's token.

use crate::dom::{NodeId, NodeKind, NodeTree};
use serde_json::Value;

/// Field names referenced by `template`, in order of appearance
pub fn tokens(template: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        let name = &after[..close];
        if name.contains('{') {
            // `{{x}`: restart from the inner brace
            rest = &after[name.rfind('{').unwrap_or(0)..];
            continue;
        }
        if !name.is_empty() {
            out.push(name);
        }
        rest = &after[close + 1..];
    }
    out
}

pub fn contains_token(template: &str, field: &str) -> bool {
    tokens(template).iter().any(|t| *t == field)
}

/// Render `template`, replacing each `{name}` for which `lookup` has a value.
pub fn render<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        if name.contains('{') || name.is_empty() {
            out.push('{');
            rest = after;
            continue;
        }
        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// String form used in rendered markup: strings raw, everything else JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Freeze the current text of every text node and attribute under `roots`.
pub fn capture_originals(tree: &mut NodeTree, roots: &[NodeId]) {
    for id in subtree_nodes(tree, roots) {
        match tree.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Text(text)) => text.capture_original(),
            Some(NodeKind::Element(element)) => {
                for attr in &mut element.attributes {
                    attr.capture_original();
                }
            }
            _ => {}
        }
    }
}

/// Re-render every text node and attribute under `roots` whose template
/// references `field`. Returns the number of values rewritten.
pub fn substitute_field<F>(tree: &mut NodeTree, roots: &[NodeId], field: &str, lookup: F) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    let mut rewritten = 0;
    for id in subtree_nodes(tree, roots) {
        match tree.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Text(text)) => {
                text.capture_original();
                if contains_token(text.template(), field) {
                    text.value = render(text.template(), &lookup);
                    rewritten += 1;
                }
            }
            Some(NodeKind::Element(element)) => {
                for attr in &mut element.attributes {
                    attr.capture_original();
                    if contains_token(attr.template(), field) {
                        attr.value = render(attr.template(), &lookup);
                        rewritten += 1;
                    }
                }
            }
            _ => {}
        }
    }
    rewritten
}

fn subtree_nodes(tree: &NodeTree, roots: &[NodeId]) -> Vec<NodeId> {
    let mut out = Vec::new();
    for root in roots {
        out.push(*root);
        out.extend(tree.descendants(*root));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Fragment;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_tokens() {
        assert_eq!(tokens("Hello {name}, you are {age}"), vec!["name", "age"]);
        assert_eq!(tokens("no tokens"), Vec::<&str>::new());
        assert_eq!(tokens("{{inner}"), vec!["inner"]);
        assert_eq!(tokens("{} {open"), Vec::<&str>::new());
    }

    #[test]
    fn test_render_leaves_unknown_tokens() {
        let out = render("{a}-{b}-{a}", lookup_from(&[("a", "1")]));
        assert_eq!(out, "1-{b}-1");
    }

    #[test]
    fn test_render_handles_stray_braces() {
        let out = render("function() { return {x}; }", lookup_from(&[("x", "7")]));
        assert_eq!(out, "function() { return 7; }");
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Value::from("Ann")), "Ann");
        assert_eq!(display_value(&Value::from(3)), "3");
        assert_eq!(display_value(&Value::Null), "null");
        assert_eq!(display_value(&Value::from(true)), "true");
    }

    #[test]
    fn test_substitute_field_rewrites_text_and_attributes() {
        let mut fragment = Fragment::parse(r#"<p title="{who}">Hello {who} and {other}</p>"#).unwrap();
        let roots = fragment.tree.children(fragment.root()).to_vec();

        let n = substitute_field(&mut fragment.tree, &roots, "who", lookup_from(&[("who", "Ann")]));

        assert_eq!(n, 2);
        assert_eq!(fragment.to_html(), r#"<p title="Ann">Hello Ann and {other}</p>"#);
    }

    #[test]
    fn test_second_field_keeps_first() {
        let mut fragment = Fragment::parse("<p>{a} {b}</p>").unwrap();
        let roots = fragment.tree.children(fragment.root()).to_vec();
        let lookup = lookup_from(&[("a", "A"), ("b", "B")]);

        substitute_field(&mut fragment.tree, &roots, "a", &lookup);
        substitute_field(&mut fragment.tree, &roots, "b", &lookup);

        assert_eq!(fragment.to_html(), "<p>A B</p>");
    }

    #[test]
    fn test_untouched_nodes_keep_value() {
        let mut fragment = Fragment::parse("<p>{a}</p><p>static</p>").unwrap();
        let roots = fragment.tree.children(fragment.root()).to_vec();

        let n = substitute_field(&mut fragment.tree, &roots, "missing", lookup_from(&[]));

        assert_eq!(n, 0);
        assert_eq!(fragment.to_html(), "<p>{a}</p><p>static</p>");
    }
}
