//! Exclusive Disclosure Group
//!
//! [`ExclusiveGroup`] owns its member widgets outright, so "at most one
//! expanded" is enforced structurally: members are only reachable through
//! the group. [`SectionsMenu`] wraps the group used for the sections
//! dropdowns and couples it to the breakpoint and the scroll lock.

use std::cell::RefCell;
use std::rc::Rc;

use navkit_dom::{DomTree, NodeId};

use crate::breakpoint::{BreakpointMonitor, Mode};
use crate::disclosure::DisclosureWidget;
use crate::scroll::{LockOwner, ScrollCoordinator};
use crate::SharedDocument;

#[derive(Debug, Clone)]
pub struct ExclusiveGroup {
    id: String,
    members: Vec<DisclosureWidget>,
}

impl ExclusiveGroup {
    /// Take ownership of `members`. Membership is fixed from here on.
    pub fn new(id: impl Into<String>, members: Vec<DisclosureWidget>) -> Self {
        let id = id.into();
        let mut members = members;
        for member in &mut members {
            member.join_group(&id);
        }
        Self { id, members }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn members(&self) -> &[DisclosureWidget] {
        &self.members
    }

    pub fn member(&self, id: &str) -> Option<&DisclosureWidget> {
        self.members.iter().find(|m| m.id() == id)
    }

    /// Member whose trigger is `node`
    pub fn member_for_trigger(&self, node: NodeId) -> Option<&DisclosureWidget> {
        self.members.iter().find(|m| m.trigger() == node)
    }

    /// The expanded member, if any
    pub fn expanded(&self) -> Option<&DisclosureWidget> {
        self.members.iter().find(|m| m.is_expanded())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Stamp every member's derived attributes
    pub fn sync(&self, tree: &mut DomTree) {
        for member in &self.members {
            member.sync(tree);
        }
    }

    /// Collapse every member
    pub fn close_all(&mut self, tree: &mut DomTree) {
        for member in &mut self.members {
            if member.is_expanded() {
                member.set_expanded(tree, false);
            }
        }
    }

    /// Expand `id` and collapse the rest. Others are closed first, so no
    /// write ever shows two members expanded. Returns false for an unknown id.
    pub fn open_only(&mut self, tree: &mut DomTree, id: &str) -> bool {
        let Some(target) = self.members.iter().position(|m| m.id() == id) else {
            return false;
        };
        for (i, member) in self.members.iter_mut().enumerate() {
            if i != target && member.is_expanded() {
                member.set_expanded(tree, false);
            }
        }
        self.members[target].set_expanded(tree, true);
        true
    }

    /// Collapse one member; the others are untouched
    pub fn close(&mut self, tree: &mut DomTree, id: &str) -> bool {
        match self.members.iter_mut().find(|m| m.id() == id) {
            Some(member) => {
                member.set_expanded(tree, false);
                true
            }
            None => false,
        }
    }

    /// `close` when expanded, otherwise `open_only`. Returns the new state.
    pub fn toggle(&mut self, tree: &mut DomTree, id: &str) -> Option<bool> {
        let expanded = self.member(id)?.is_expanded();
        if expanded {
            self.close(tree, id);
        } else {
            self.open_only(tree, id);
        }
        Some(!expanded)
    }
}

/// The sections dropdown list.
///
/// On desktop an open dropdown holds the scroll lock and shows the
/// backdrop; on mobile the dropdowns are plain accordions.
#[derive(Debug)]
pub struct SectionsMenu {
    group: ExclusiveGroup,
    doc: SharedDocument,
    monitor: Rc<BreakpointMonitor>,
    scroll: Rc<RefCell<ScrollCoordinator>>,
}

impl SectionsMenu {
    pub fn new(
        group: ExclusiveGroup,
        doc: SharedDocument,
        monitor: Rc<BreakpointMonitor>,
        scroll: Rc<RefCell<ScrollCoordinator>>,
    ) -> Self {
        group.sync(&mut doc.borrow_mut());
        Self {
            group,
            doc,
            monitor,
            scroll,
        }
    }

    pub fn group(&self) -> &ExclusiveGroup {
        &self.group
    }

    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let expanded = self.group.toggle(&mut self.doc.borrow_mut(), id)?;
        self.sync_lock();
        Some(expanded)
    }

    pub fn open_only(&mut self, id: &str) -> bool {
        let found = self.group.open_only(&mut self.doc.borrow_mut(), id);
        self.sync_lock();
        found
    }

    pub fn close_all(&mut self) {
        self.group.close_all(&mut self.doc.borrow_mut());
        self.sync_lock();
    }

    /// Breakpoint transitions reset every dropdown
    pub fn on_breakpoint(&mut self, mode: Mode) {
        tracing::debug!("sections menu reset for {mode} mode");
        self.close_all();
    }

    fn sync_lock(&self) {
        let mut doc = self.doc.borrow_mut();
        let mut scroll = self.scroll.borrow_mut();
        if self.monitor.is_desktop() && self.group.expanded().is_some() {
            scroll.acquire(&mut doc, LockOwner::Sections, true);
        } else {
            scroll.release(&mut doc, LockOwner::Sections);
        }
    }
}
