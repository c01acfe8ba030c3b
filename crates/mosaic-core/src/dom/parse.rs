//! Conversion from `scraper`'s html5ever tree into the arena

use super::node::{Attribute, ElementData, NodeKind, TextValue};
use super::tree::NodeTree;
use super::NodeId;
use crate::errors::Result;
use scraper::{ElementRef, Html, Node};

/// Parse `text` in body context and append the resulting nodes under
/// `parent`. Returns the new top-level node ids in document order.
///
/// # Errors
///
/// Fails with `Internal` when `parent` is not in `tree`.
pub fn parse_into(tree: &mut NodeTree, parent: NodeId, text: &str) -> Result<Vec<NodeId>> {
    let html = Html::parse_fragment(text);
    convert_children(tree, parent, html.root_element())
}

/// Parse a whole page, appending the `<head>` content under `head` and the
/// `<body>` content under `body`.
///
/// # Errors
///
/// Fails with `Internal` when `head` or `body` is not in `tree`.
pub fn parse_document_into(
    tree: &mut NodeTree,
    head: NodeId,
    body: NodeId,
    text: &str,
) -> Result<()> {
    let html = Html::parse_document(text);
    let sections: Vec<_> = html
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .collect();
    for section in sections {
        let target = match section.value().name() {
            "head" => head,
            "body" => body,
            _ => continue,
        };
        convert_children(tree, target, section)?;
    }
    Ok(())
}

fn convert_children(
    tree: &mut NodeTree,
    parent: NodeId,
    source: ElementRef<'_>,
) -> Result<Vec<NodeId>> {
    let top: Vec<_> = source.children().collect();
    let mut added = Vec::with_capacity(top.len());

    let mut stack: Vec<_> = top.into_iter().rev().map(|n| (n, parent, true)).collect();
    while let Some((node, target, is_top)) = stack.pop() {
        let kind = match node.value() {
            Node::Text(t) => NodeKind::Text(TextValue::new(&**t)),
            Node::Comment(c) => NodeKind::Comment(String::from(&**c)),
            Node::Element(e) => {
                let mut data = ElementData::new(e.name());
                data.attributes = e
                    .attrs()
                    .map(|(name, value)| Attribute::new(name, value))
                    .collect();
                NodeKind::Element(data)
            }
            _ => continue,
        };
        let id = tree.create(kind);
        tree.append_child(target, id)?;
        if is_top {
            added.push(id);
        }
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev().map(|c| (c, id, false)));
    }

    Ok(added)
}
