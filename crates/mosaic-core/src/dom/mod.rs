//! Host tree model
//!
//! An arena of nodes standing in for the browser DOM. The page is a
//! [`Document`] whose `head` doubles as the page-global area for relocated
//! fragment sections; parsed fetch results are [`Fragment`]s.

pub mod node;
pub mod parse;
pub mod serialize;
pub mod tree;

pub use node::{Attribute, ElementData, NodeData, NodeId, NodeKind, TextValue};
pub use tree::NodeTree;

use crate::errors::Result;

/// Host page: `Document` root holding `<head>` and `<body>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub tree: NodeTree,
    pub head: NodeId,
    pub body: NodeId,
}

impl Document {
    pub fn new() -> Self {
        let mut tree = NodeTree::new(NodeKind::Document);
        let root = tree.root();
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        if let Some(node) = tree.get_mut(root) {
            node.children.extend([head, body]);
        }
        for id in [head, body] {
            if let Some(node) = tree.get_mut(id) {
                node.parent = Some(root);
            }
        }
        Self { tree, head, body }
    }

    /// Parse a full page. Bare markup without `<html>` lands in the body.
    ///
    /// # Errors
    ///
    /// Only internal arena inconsistencies can fail.
    pub fn parse(html: &str) -> Result<Self> {
        let mut doc = Self::new();
        parse::parse_document_into(&mut doc.tree, doc.head, doc.body, html)?;
        Ok(doc)
    }

    /// Serialized `<head>…</head><body>…</body>`
    pub fn to_html(&self) -> String {
        self.tree.inner_html(self.tree.root())
    }

    pub fn head_html(&self) -> String {
        self.tree.inner_html(self.head)
    }

    pub fn body_html(&self) -> String {
        self.tree.inner_html(self.body)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Parsed, detached markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub tree: NodeTree,
}

impl Fragment {
    pub fn new() -> Self {
        Self {
            tree: NodeTree::new(NodeKind::Fragment),
        }
    }

    /// # Errors
    ///
    /// Only internal arena inconsistencies can fail.
    pub fn parse(text: &str) -> Result<Self> {
        let mut fragment = Self::new();
        let root = fragment.tree.root();
        parse::parse_into(&mut fragment.tree, root, text)?;
        Ok(fragment)
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn to_html(&self) -> String {
        self.tree.inner_html(self.tree.root())
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_shape() {
        let doc = Document::new();
        assert_eq!(doc.tree.children(doc.tree.root()), &[doc.head, doc.body]);
        assert!(doc.tree.is_attached(doc.body));
        assert_eq!(doc.to_html(), "<head></head><body></body>");
    }

    #[test]
    fn test_parse_bare_markup_goes_to_body() {
        let doc = Document::parse("<div>hi</div>").unwrap();
        assert_eq!(doc.body_html(), "<div>hi</div>");
        assert_eq!(doc.head_html(), "");
    }

    #[test]
    fn test_fragment_parse_round_trips_simple_markup() {
        let fragment = Fragment::parse("<ul><li>a</li><li>b</li></ul>").unwrap();
        assert_eq!(fragment.to_html(), "<ul><li>a</li><li>b</li></ul>");
    }
}
