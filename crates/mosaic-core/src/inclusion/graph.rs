use crate::errors::{MosaicError, Result};
use std::fmt;

/// Handle to a node owned by an [`InclusionGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InclusionNodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionNode {
    pub name: String,
    pub parent: Option<InclusionNodeId>,
    pub children: Vec<InclusionNodeId>,
}

/// Forest of "document includes target" edges
///
/// Nodes are only ever added. A name is unique among its siblings; the same
/// name may appear under different parents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusionGraph {
    nodes: Vec<InclusionNode>,
    roots: Vec<InclusionNodeId>,
}

impl InclusionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: InclusionNodeId) -> Option<&InclusionNode> {
        self.nodes.get(id.0)
    }

    pub fn roots(&self) -> &[InclusionNodeId] {
        &self.roots
    }

    /// Add a root named `name` unless a node with that name already exists
    /// anywhere in the graph; returns the node with that name.
    pub fn add_node(&mut self, name: &str) -> InclusionNodeId {
        if let Some(existing) = self.get_node(name) {
            return existing;
        }
        let id = self.push(name, None);
        self.roots.push(id);
        id
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.get_node(name).is_some()
    }

    /// Depth-first search over every root and its descendants
    pub fn get_node(&self, name: &str) -> Option<InclusionNodeId> {
        let mut stack: Vec<InclusionNodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.name == name {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Add `child_name` under `parent`, reusing a same-named sibling.
    ///
    /// # Errors
    ///
    /// Fails with `Internal` when `parent` does not belong to this graph.
    pub fn add_child(&mut self, parent: InclusionNodeId, child_name: &str) -> Result<InclusionNodeId> {
        let siblings = &self
            .nodes
            .get(parent.0)
            .ok_or_else(|| MosaicError::Internal {
                message: format!("unknown inclusion node {}", parent.0),
            })?
            .children;
        if let Some(existing) = siblings
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].name == child_name)
        {
            return Ok(existing);
        }
        let id = self.push(child_name, Some(parent));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Whether any strict ancestor of `node` is named `name`. O(depth).
    pub fn has_ancestor(&self, node: InclusionNodeId, name: &str) -> bool {
        let mut cursor = self.node(node).and_then(|n| n.parent);
        while let Some(id) = cursor {
            let ancestor = &self.nodes[id.0];
            if ancestor.name == name {
                return true;
            }
            cursor = ancestor.parent;
        }
        false
    }

    /// Record that `parent_name` includes `child_name`.
    ///
    /// The parent is looked up by name (created as a root when unknown).
    /// Nothing is added when the edge would close a cycle, including a
    /// document including itself.
    ///
    /// # Errors
    ///
    /// Fails with `CyclicInclusion` when `child_name` equals `parent_name`
    /// or is one of its ancestors.
    pub fn link(&mut self, parent_name: &str, child_name: &str) -> Result<InclusionNodeId> {
        let cycle = || MosaicError::CyclicInclusion {
            include_in: parent_name.to_string(),
            src: child_name.to_string(),
        };
        if parent_name == child_name {
            return Err(cycle());
        }
        match self.get_node(parent_name) {
            Some(parent) => {
                if self.has_ancestor(parent, child_name) {
                    return Err(cycle());
                }
                self.add_child(parent, child_name)
            }
            None => {
                let parent = self.add_node(parent_name);
                self.add_child(parent, child_name)
            }
        }
    }

    fn push(&mut self, name: &str, parent: Option<InclusionNodeId>) -> InclusionNodeId {
        let id = InclusionNodeId(self.nodes.len());
        self.nodes.push(InclusionNode {
            name: name.to_string(),
            parent,
            children: Vec::new(),
        });
        id
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, id: InclusionNodeId, depth: usize) -> fmt::Result {
        let node = &self.nodes[id.0];
        let parent = node
            .parent
            .map(|p| self.nodes[p.0].name.as_str())
            .unwrap_or("-");
        writeln!(f, "{}{} (parent: {})", "\t".repeat(depth), node.name, parent)?;
        for child in &node.children {
            self.fmt_node(f, *child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for InclusionGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for root in &self.roots {
            self.fmt_node(f, *root, 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_node_is_unique_by_name() {
        let mut graph = InclusionGraph::new();
        let a = graph.add_node("index.html");
        let b = graph.add_node("index.html");
        assert_eq!(a, b);
        assert_eq!(graph.roots().len(), 1);
    }

    #[test]
    fn test_add_child_reuses_sibling() {
        let mut graph = InclusionGraph::new();
        let root = graph.add_node("index.html");
        let first = graph.add_child(root, "nav.html").unwrap();
        let second = graph.add_child(root, "nav.html").unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.node(root).unwrap().children.len(), 1);
    }

    #[test]
    fn test_same_name_in_unrelated_branches() {
        let mut graph = InclusionGraph::new();
        graph.link("index.html", "a.html").unwrap();
        graph.link("index.html", "b.html").unwrap();
        graph.link("a.html", "footer.html").unwrap();
        let b = graph.get_node("b.html").unwrap();
        let footer_under_b = graph.add_child(b, "footer.html").unwrap();

        assert!(graph.has_ancestor(footer_under_b, "b.html"));
        assert!(!graph.has_ancestor(footer_under_b, "a.html"));
    }

    #[test]
    fn test_get_node_searches_descendants() {
        let mut graph = InclusionGraph::new();
        graph.link("index.html", "a.html").unwrap();
        graph.link("a.html", "b.html").unwrap();
        assert!(graph.has_node("b.html"));
        assert!(!graph.has_node("c.html"));
    }

    #[test]
    fn test_cycle_rejected_and_graph_unchanged() {
        let mut graph = InclusionGraph::new();
        graph.link("index.html", "a.html").unwrap();
        graph.link("a.html", "b.html").unwrap();
        let before = graph.clone();

        let result = graph.link("b.html", "a.html");

        assert!(matches!(result, Err(MosaicError::CyclicInclusion { .. })));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_self_inclusion_is_a_cycle() {
        let mut graph = InclusionGraph::new();
        let result = graph.link("a.html", "a.html");
        assert!(matches!(result, Err(MosaicError::CyclicInclusion { .. })));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_display_indents_children() {
        let mut graph = InclusionGraph::new();
        graph.link("index.html", "a.html").unwrap();
        let rendered = graph.to_string();
        assert_eq!(rendered, "index.html (parent: -)\n\ta.html (parent: index.html)\n");
    }
}
