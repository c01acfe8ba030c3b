use super::node::{Attribute, ElementData, NodeData, NodeId, NodeKind, TextValue};
use crate::errors::{MosaicError, Result};

/// Arena-backed node tree
///
/// A detached node keeps its id and subtree and can be reinserted later,
/// which is what mount/unmount rely on. Slots come back only through
/// [`NodeTree::release`]; `create` reuses released slots before growing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTree {
    nodes: Vec<Option<NodeData>>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl NodeTree {
    pub fn new(root_kind: NodeKind) -> Self {
        Self {
            nodes: vec![Some(NodeData::new(root_kind))],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Live nodes
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated slots, live or released
    pub fn slots(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.kind(id).and_then(NodeKind::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut TextValue> {
        match self.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Text(t)) => Some(t),
            _ => None,
        }
    }

    fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.get(id).ok_or_else(|| unknown_node(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.get_mut(id).ok_or_else(|| unknown_node(id))
    }

    // ===== Creation =====

    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        if let Some(id) = self.free.pop() {
            if let Some(slot) = self.nodes.get_mut(id.0) {
                *slot = Some(NodeData::new(kind));
                return id;
            }
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(NodeData::new(kind)));
        id
    }

    /// Free a detached subtree. Its ids become unknown and may be handed out
    /// again by later `create` calls, so nothing may keep them.
    ///
    /// # Errors
    ///
    /// Fails with `Internal` for unknown ids, the root, or a node that
    /// still has a parent.
    pub fn release(&mut self, id: NodeId) -> Result<usize> {
        if id == self.root {
            return Err(MosaicError::Internal {
                message: "cannot release the tree root".to_string(),
            });
        }
        if self.node(id)?.parent.is_some() {
            return Err(MosaicError::Internal {
                message: format!("node {} is still attached to a parent", id),
            });
        }
        let mut stack = vec![id];
        let mut released = 0;
        while let Some(next) = stack.pop() {
            if let Some(data) = self.nodes.get_mut(next.0).and_then(Option::take) {
                stack.extend(data.children);
                self.free.push(next);
                released += 1;
            }
        }
        Ok(released)
    }

    /// Detach `id` and free its subtree.
    ///
    /// # Errors
    ///
    /// Same as [`NodeTree::release`].
    pub fn remove(&mut self, id: NodeId) -> Result<usize> {
        self.detach(id)?;
        self.release(id)
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create(NodeKind::Element(ElementData::new(name)))
    }

    pub fn create_element_with(&mut self, name: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut data = ElementData::new(name);
        for (k, v) in attributes {
            data.attributes.push(Attribute::new(k.to_ascii_lowercase(), *v));
        }
        self.create(NodeKind::Element(data))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create(NodeKind::Text(TextValue::new(text)))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.create(NodeKind::Comment(text.to_string()))
    }

    pub fn create_marker(&mut self, instance_id: &str) -> NodeId {
        self.create(NodeKind::Marker(instance_id.to_string()))
    }

    // ===== Structure =====

    /// Append `child` under `parent`, detaching it from any previous parent.
    ///
    /// # Errors
    ///
    /// Fails with `Internal` for unknown ids or when `child` is `parent` or
    /// one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insertable(parent, child)?;
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails with `Internal` when `reference` has no parent.
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) -> Result<()> {
        self.insert_relative(reference, new, 0)
    }

    /// # Errors
    ///
    /// Fails with `Internal` when `reference` has no parent.
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) -> Result<()> {
        self.insert_relative(reference, new, 1)
    }

    fn insert_relative(&mut self, reference: NodeId, new: NodeId, offset: usize) -> Result<()> {
        if reference == new {
            return Err(MosaicError::Internal {
                message: format!("cannot insert node {} relative to itself", new),
            });
        }
        let parent = self.node(reference)?.parent.ok_or_else(|| MosaicError::Internal {
            message: format!("reference node {} is detached", reference),
        })?;
        self.check_insertable(parent, new)?;
        self.detach(new)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let pos = siblings
            .iter()
            .position(|c| *c == reference)
            .ok_or_else(|| MosaicError::Internal {
                message: format!("node {} missing from its parent", reference),
            })?;
        siblings.insert(pos + offset, new);
        self.node_mut(new)?.parent = Some(parent);
        Ok(())
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(child)?;
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(MosaicError::Internal {
                    message: format!("node {} cannot become its own descendant", child),
                });
            }
            cursor = self.node(id)?.parent;
        }
        Ok(())
    }

    /// Remove `id` from its parent. The subtree stays intact in the arena.
    ///
    /// # Errors
    ///
    /// Fails with `Internal` for unknown ids.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        if let Some(parent) = self.node_mut(id)?.parent.take() {
            self.node_mut(parent)?.children.retain(|c| *c != id);
        }
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Whether `id` is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = id;
        loop {
            if cursor == self.root {
                return true;
            }
            match self.parent(cursor) {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    /// Pre-order descendants of `id`, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn elements_by_tag(&self, from: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(from)
            .into_iter()
            .filter(|id| self.kind(*id).is_some_and(|k| k.is_element_named(name)))
            .collect()
    }

    pub fn element_by_id(&self, from: NodeId, element_id: &str) -> Option<NodeId> {
        self.descendants(from)
            .into_iter()
            .find(|id| self.get_attribute(*id, "id") == Some(element_id))
    }

    /// Attached marker for `instance_id`
    pub fn find_marker(&self, instance_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| matches!(self.kind(*id), Some(NodeKind::Marker(m)) if m == instance_id))
    }

    // ===== Attributes and text =====

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// # Errors
    ///
    /// Fails with `Internal` when `id` is not an element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(id)
            .ok_or_else(|| not_an_element(id))?
            .set_attr(name, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<Attribute> {
        self.element_mut(id).and_then(|e| e.remove_attr(name))
    }

    /// Concatenated text of every text node under `id`, `id` included
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.kind(id).and_then(NodeKind::as_text) {
            out.push_str(&t.value);
        }
        for d in self.descendants(id) {
            if let Some(t) = self.kind(d).and_then(NodeKind::as_text) {
                out.push_str(&t.value);
            }
        }
        out
    }

    // ===== Cross-tree =====

    /// Deep-copy `src_node` from `src` into this tree, returning the new
    /// detached subtree root. Original-text slots travel with the copy.
    ///
    /// # Errors
    ///
    /// Fails with `Internal` when `src_node` does not exist in `src`.
    pub fn import_subtree(&mut self, src: &NodeTree, src_node: NodeId) -> Result<NodeId> {
        let root_kind = src.node(src_node)?.kind.clone();
        let new_root = self.create(root_kind);
        let mut stack = vec![(src_node, new_root)];
        while let Some((from, to)) = stack.pop() {
            for child in src.children(from) {
                let kind = src.node(*child)?.kind.clone();
                let copy = self.create(kind);
                self.node_mut(copy)?.parent = Some(to);
                self.node_mut(to)?.children.push(copy);
                stack.push((*child, copy));
            }
        }
        Ok(new_root)
    }
}

fn unknown_node(id: NodeId) -> MosaicError {
    MosaicError::Internal {
        message: format!("unknown node {}", id),
    }
}

fn not_an_element(id: NodeId) -> MosaicError {
    MosaicError::Internal {
        message: format!("node {} is not an element", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (NodeTree, NodeId, NodeId, NodeId) {
        let mut tree = NodeTree::new(NodeKind::Fragment);
        let root = tree.root();
        let div = tree.create_element_with("div", &[("id", "box")]);
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        tree.append_child(root, div).unwrap();
        tree.append_child(div, a).unwrap();
        tree.append_child(div, b).unwrap();
        (tree, div, a, b)
    }

    #[test]
    fn test_insert_before_and_after() {
        let (mut tree, div, a, b) = sample();
        let x = tree.create_text("x");
        let y = tree.create_text("y");

        tree.insert_before(a, x).unwrap();
        tree.insert_after(a, y).unwrap();

        assert_eq!(tree.children(div), &[x, a, y, b]);
        assert_eq!(tree.text_content(div), "xayb");
        assert_eq!(tree.next_sibling(a), Some(y));
    }

    #[test]
    fn test_detach_keeps_subtree() {
        let (mut tree, div, a, _) = sample();

        tree.detach(div).unwrap();

        assert!(!tree.is_attached(div));
        assert!(!tree.is_attached(a));
        assert_eq!(tree.parent(a), Some(div));
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn test_append_moves_node() {
        let (mut tree, div, a, b) = sample();
        let root = tree.root();

        tree.append_child(root, a).unwrap();

        assert_eq!(tree.children(div), &[b]);
        assert_eq!(tree.children(root), &[div, a]);
    }

    #[test]
    fn test_cannot_insert_ancestor_under_descendant() {
        let (mut tree, div, a, _) = sample();
        let result = tree.append_child(a, div);
        assert!(matches!(result, Err(MosaicError::Internal { .. })));
    }

    #[test]
    fn test_insert_relative_to_detached_fails() {
        let mut tree = NodeTree::new(NodeKind::Fragment);
        let lone = tree.create_text("lone");
        let other = tree.create_text("other");
        assert!(tree.insert_after(lone, other).is_err());
    }

    #[test]
    fn test_lookup_helpers() {
        let (mut tree, div, _, _) = sample();
        let marker = tree.create_marker("Card1");
        tree.insert_after(div, marker).unwrap();

        assert_eq!(tree.element_by_id(tree.root(), "box"), Some(div));
        assert_eq!(tree.elements_by_tag(tree.root(), "DIV"), vec![div]);
        assert_eq!(tree.find_marker("Card1"), Some(marker));

        tree.detach(marker).unwrap();
        assert_eq!(tree.find_marker("Card1"), None);
    }

    #[test]
    fn test_release_recycles_slots() {
        let (mut tree, div, a, _) = sample();
        let slots = tree.slots();

        assert!(tree.release(div).is_err());
        assert_eq!(tree.remove(div).unwrap(), 3);

        assert_eq!(tree.len(), 1);
        assert!(tree.get(a).is_none());
        assert!(tree.children(tree.root()).is_empty());
        for _ in 0..3 {
            tree.create_text("again");
        }
        assert_eq!(tree.slots(), slots);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_release_root_fails() {
        let (mut tree, _, _, _) = sample();
        let root = tree.root();
        assert!(matches!(tree.release(root), Err(MosaicError::Internal { .. })));
    }

    #[test]
    fn test_import_subtree_preserves_originals() {
        let (mut src, div, a, _) = sample();
        if let Some(text) = src.text_mut(a) {
            text.capture_original();
            text.value = "changed".to_string();
        }

        let mut dst = NodeTree::new(NodeKind::Document);
        let copy = dst.import_subtree(&src, div).unwrap();

        assert!(!dst.is_attached(copy));
        let first = dst.children(copy)[0];
        let text = dst.kind(first).and_then(NodeKind::as_text).unwrap();
        assert_eq!(text.value, "changed");
        assert_eq!(text.original.as_deref(), Some("a"));
        assert_eq!(dst.get_attribute(copy, "id"), Some("box"));
    }
}
