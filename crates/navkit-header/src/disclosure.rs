//! Disclosure Widget
//!
//! A trigger control plus the region it shows and hides. `expanded` is the
//! only state; `aria-expanded`, `aria-hidden` and `data-expanded` are
//! rewritten from it on every change and never touched independently.
//!
//! A widget that has joined an [`ExclusiveGroup`](crate::ExclusiveGroup)
//! belongs to it: only the group may change its state.

use navkit_dom::{DomTree, NodeId};

#[derive(Debug, Clone)]
pub struct DisclosureWidget {
    id: String,
    trigger: NodeId,
    content: NodeId,
    /// Optional wrapper mirroring the state as `data-expanded`
    item: Option<NodeId>,
    expanded: bool,
    group: Option<String>,
}

impl DisclosureWidget {
    /// A collapsed widget. Call [`sync`](Self::sync) to stamp the initial attributes.
    pub fn new(id: impl Into<String>, trigger: NodeId, content: NodeId) -> Self {
        Self {
            id: id.into(),
            trigger,
            content,
            item: None,
            expanded: false,
            group: None,
        }
    }

    /// Mirror the state onto a containing item as `data-expanded`
    pub fn with_item(mut self, item: NodeId) -> Self {
        self.item = Some(item);
        self
    }

    pub(crate) fn join_group(&mut self, group: &str) {
        self.group = Some(group.to_string());
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn trigger(&self) -> NodeId {
        self.trigger
    }

    pub fn content(&self) -> NodeId {
        self.content
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Expand. Grouped widgets are left alone; open them through the group.
    pub fn open(&mut self, tree: &mut DomTree) -> bool {
        self.set_standalone(tree, true)
    }

    /// Collapse. Grouped widgets are left alone; close them through the group.
    pub fn close(&mut self, tree: &mut DomTree) -> bool {
        self.set_standalone(tree, false)
    }

    /// Flip the state, returning the new one
    pub fn toggle(&mut self, tree: &mut DomTree) -> bool {
        let expanded = !self.expanded;
        self.set_standalone(tree, expanded);
        self.expanded
    }

    fn set_standalone(&mut self, tree: &mut DomTree, expanded: bool) -> bool {
        if let Some(group) = &self.group {
            tracing::warn!("{} belongs to group {group}; state change ignored", self.id);
            return false;
        }
        self.set_expanded(tree, expanded);
        true
    }

    /// State change on behalf of the owning group
    pub(crate) fn set_expanded(&mut self, tree: &mut DomTree, expanded: bool) {
        self.expanded = expanded;
        self.sync(tree);
    }

    /// Write the derived attributes
    pub fn sync(&self, tree: &mut DomTree) {
        tree.set_attribute(self.trigger, "aria-expanded", self.expanded);
        tree.set_attribute(self.content, "aria-hidden", !self.expanded);
        if let Some(item) = self.item {
            tree.dataset_set(item, "expanded", self.expanded);
        }
    }
}
