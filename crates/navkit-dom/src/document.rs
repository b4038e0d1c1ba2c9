//! Document - High-level document API

use std::ops::{Deref, DerefMut};

use crate::{DomTree, NodeId};

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    /// Element holding keyboard focus
    focused: Option<NodeId>,
}

impl Document {
    /// Create a new document with `<html><head></head><body></body></html>`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Fresh detached nodes under the document root cannot violate the hierarchy
        let root = tree.root();
        let _ = tree.append_child(root, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
            focused: None,
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.find_by_id(self.tree.root(), id)
    }

    /// Content of `<meta name="...">` in the head
    pub fn metadata(&self, name: &str) -> Option<String> {
        self.tree
            .query_selector_all(self.head_element, "meta")
            .into_iter()
            .find(|&m| {
                self.tree.get_attribute(m, "name") == Some(name)
                    || self.tree.get_attribute(m, "property") == Some(name)
            })
            .and_then(|m| self.tree.get_attribute(m, "content"))
            .map(str::to_string)
    }

    /// Move keyboard focus to an element
    pub fn focus(&mut self, id: NodeId) {
        if self.tree.element(id).is_some() {
            self.focused = Some(id);
        }
    }

    /// `document.activeElement` (body when nothing is focused)
    pub fn active_element(&self) -> NodeId {
        self.focused.unwrap_or(self.body_element)
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

impl Deref for Document {
    type Target = DomTree;

    fn deref(&self) -> &DomTree {
        &self.tree
    }
}

impl DerefMut for Document {
    fn deref_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}
