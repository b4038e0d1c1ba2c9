//! DOM Tree (arena-based allocation)
//!
//! Core node manipulation: appendChild, insertBefore, replaceWith,
//! attribute access and the `classList` / `dataset` conveniences the
//! decorators lean on.

use crate::dataset::attribute_name;
use crate::{DomError, DomResult, ElementData, MutationRecord, Node, NodeId};

/// Arena-based DOM tree
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
    records: Option<Vec<MutationRecord>>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            records: None,
        }
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Number of nodes in the arena (detached nodes included)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text))
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Element data, if `id` is an element
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Lowercase tag name
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Check the tag name of an element
    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.get())
    }

    /// Iterate over child node IDs
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next }
    }

    /// Child elements in document order (`element.children`)
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .filter(|&c| self.element(c).is_some())
            .collect()
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).find(|&c| self.element(c).is_some())
    }

    /// All descendants in document (pre-)order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node);
            let mark = stack.len();
            stack.extend(self.children(node));
            stack[mark..].reverse();
        }
        out
    }

    /// Check whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    fn check_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.get(parent).is_none() || self.get(child).is_none() {
            return Err(DomError::NotFound);
        }
        if child == NodeId::ROOT || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    /// Unlink a node from its parent. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        if !parent.is_valid() {
            return;
        }

        if let Some(p) = self.get_mut(prev) {
            p.next_sibling = next;
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }
        if let Some(n) = self.get_mut(next) {
            n.prev_sibling = prev;
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Insert `child` into `parent` before `reference` (append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.check_insert(parent, child)?;
        if reference == Some(child) {
            return Ok(child);
        }
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotFound);
            }
        }
        self.detach(child);

        let next = reference.unwrap_or(NodeId::NONE);
        let prev = match reference {
            Some(r) => self.nodes[r.0 as usize].prev_sibling,
            None => self.nodes[parent.0 as usize].last_child,
        };

        {
            let node = &mut self.nodes[child.0 as usize];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        match self.get_mut(prev) {
            Some(p) => p.next_sibling = child,
            None => self.nodes[parent.0 as usize].first_child = child,
        }
        match self.get_mut(next) {
            Some(n) => n.prev_sibling = child,
            None => self.nodes[parent.0 as usize].last_child = child,
        }
        Ok(child)
    }

    /// Append a child node (moves it if already attached)
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert a child node before the current first child
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        let first = self.get(parent).ok_or(DomError::NotFound)?.first_child.get();
        self.insert_before(parent, child, first)
    }

    /// Put `replacement` where `old` is and detach `old`
    pub fn replace_with(&mut self, old: NodeId, replacement: NodeId) -> DomResult<()> {
        let parent = self.parent(old).ok_or(DomError::NotFound)?;
        if old == replacement {
            return Ok(());
        }
        self.insert_before(parent, replacement, Some(old))?;
        self.detach(old);
        Ok(())
    }

    /// Detach every child (`element.innerHTML = ''`)
    pub fn remove_children(&mut self, id: NodeId) {
        let children: Vec<_> = self.children(id).collect();
        for child in children {
            self.detach(child);
        }
    }

    /// Move all children of `from` to the end of `to`
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> DomResult<()> {
        let children: Vec<_> = self.children(from).collect();
        for child in children {
            self.append_child(to, child)?;
        }
        Ok(())
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.get(d).and_then(Node::as_text))
            .collect()
    }

    /// Replace all children with one text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        self.remove_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attrs.get_attribute(name))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.attrs.has_attribute(name))
    }

    /// Set an attribute. Writes to non-elements are ignored.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl ToString) {
        let value = value.to_string();
        let Some(elem) = self.get_mut(id).and_then(Node::as_element_mut) else {
            tracing::debug!("set_attribute({name}) on non-element {:?}", id);
            return;
        };
        let old_value = elem.attrs.set_attribute(name, &value);
        if let Some(records) = self.records.as_mut() {
            records.push(MutationRecord {
                target: id,
                attribute_name: name.to_string(),
                old_value,
                new_value: Some(value),
            });
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        let Some(elem) = self.get_mut(id).and_then(Node::as_element_mut) else {
            return;
        };
        let removed = elem.attrs.remove_attribute(name);
        if let (Some(records), Some(attr)) = (self.records.as_mut(), removed) {
            records.push(MutationRecord {
                target: id,
                attribute_name: name.to_string(),
                old_value: Some(attr.value),
                new_value: None,
            });
        }
    }

    /// The `id` attribute
    pub fn id_of(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(ElementData::id)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_class(class))
    }

    /// `classList.add`
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.element(id).is_none() || self.has_class(id, class) {
            return;
        }
        let value = match self.get_attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", value);
    }

    /// `dataset[key]`
    pub fn dataset_get(&self, id: NodeId, key: &str) -> Option<&str> {
        self.get_attribute(id, &attribute_name(key))
    }

    /// `dataset[key] = value`
    pub fn dataset_set(&mut self, id: NodeId, key: &str, value: impl ToString) {
        self.set_attribute(id, &attribute_name(key), value);
    }

    /// `delete dataset[key]`
    pub fn dataset_remove(&mut self, id: NodeId, key: &str) {
        self.remove_attribute(id, &attribute_name(key));
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Start recording attribute mutations
    pub fn observe_attributes(&mut self) {
        self.records.get_or_insert_with(Vec::new);
    }

    /// Drain recorded mutations
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.records.as_mut().map(std::mem::take).unwrap_or_default()
    }
}

/// Iterator over a node's children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next.get()?;
        self.next = self.tree.get(current).map_or(NodeId::NONE, |n| n.next_sibling);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(tree: &mut DomTree, items: &[&str]) -> NodeId {
        let ul = tree.create_element("ul");
        for item in items {
            let li = tree.create_element("li");
            tree.set_text_content(li, item).unwrap();
            tree.append_child(ul, li).unwrap();
        }
        ul
    }

    #[test]
    fn test_append_and_children_order() {
        let mut tree = DomTree::new();
        let ul = list(&mut tree, &["a", "b", "c"]);
        let texts: Vec<_> = tree
            .element_children(ul)
            .into_iter()
            .map(|li| tree.text_content(li))
            .collect();
        assert_eq!(texts, ["a", "b", "c"]);
        assert_eq!(tree.text_content(ul), "abc");
    }

    #[test]
    fn test_prepend_and_insert_before() {
        let mut tree = DomTree::new();
        let ul = list(&mut tree, &["b"]);
        let a = tree.create_text("a");
        tree.prepend_child(ul, a).unwrap();
        let c = tree.create_text("c");
        tree.append_child(ul, c).unwrap();
        let mid = tree.create_text("-");
        tree.insert_before(ul, mid, Some(c)).unwrap();
        assert_eq!(tree.text_content(ul), "ab-c");
    }

    #[test]
    fn test_append_moves_node() {
        let mut tree = DomTree::new();
        let first = list(&mut tree, &["x", "y"]);
        let second = tree.create_element("ol");
        let x = tree.first_element_child(first).unwrap();
        tree.append_child(second, x).unwrap();

        assert_eq!(tree.text_content(first), "y");
        assert_eq!(tree.text_content(second), "x");
        assert_eq!(tree.parent(x), Some(second));
    }

    #[test]
    fn test_hierarchy_error() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        tree.append_child(outer, inner).unwrap();
        assert_eq!(tree.append_child(inner, outer), Err(DomError::HierarchyRequest));
        assert_eq!(tree.append_child(outer, outer), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_replace_with() {
        let mut tree = DomTree::new();
        let ul = list(&mut tree, &["old", "keep"]);
        let old = tree.first_element_child(ul).unwrap();
        let new = tree.create_text("new");
        tree.replace_with(old, new).unwrap();
        assert_eq!(tree.text_content(ul), "newkeep");
        assert_eq!(tree.parent(old), None);
    }

    #[test]
    fn test_remove_children() {
        let mut tree = DomTree::new();
        let ul = list(&mut tree, &["a", "b"]);
        tree.remove_children(ul);
        assert!(tree.children(ul).next().is_none());
    }

    #[test]
    fn test_class_and_dataset() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.add_class(div, "nav-brand");
        tree.add_class(div, "nav-brand");
        tree.add_class(div, "open");
        assert_eq!(tree.get_attribute(div, "class"), Some("nav-brand open"));

        tree.dataset_set(div, "expanded", false);
        assert_eq!(tree.get_attribute(div, "data-expanded"), Some("false"));
        tree.dataset_remove(div, "expanded");
        assert_eq!(tree.dataset_get(div, "expanded"), None);
    }

    #[test]
    fn test_mutation_records_in_order() {
        let mut tree = DomTree::new();
        let a = tree.create_element("button");
        let b = tree.create_element("button");
        tree.set_attribute(a, "aria-expanded", false);
        tree.observe_attributes();
        tree.set_attribute(a, "aria-expanded", true);
        tree.remove_attribute(b, "missing");
        tree.set_attribute(b, "aria-expanded", true);

        let records = tree.take_records();
        assert_eq!(records.len(), 2);
        assert!(records[0].is(a, "aria-expanded", "true"));
        assert_eq!(records[0].old_value.as_deref(), Some("false"));
        assert!(records[1].is(b, "aria-expanded", "true"));
        assert!(tree.take_records().is_empty());
    }
}
