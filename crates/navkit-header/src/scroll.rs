//! Scroll/Backdrop Coordinator
//!
//! The page scroll lock (`<body data-scroll="disabled">`) and the nav
//! backdrop are shared by the hamburger and the desktop dropdowns. Each
//! controller acquires and releases under its own [`LockOwner`]; the DOM
//! reflects the union of owners, so one controller letting go never
//! clears a lock another still holds.

use std::collections::BTreeSet;

use navkit_dom::{Document, NodeId};

/// Who holds a share of the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockOwner {
    Hamburger,
    Sections,
}

#[derive(Debug)]
pub struct ScrollCoordinator {
    backdrop: Option<NodeId>,
    scroll_owners: BTreeSet<LockOwner>,
    backdrop_owners: BTreeSet<LockOwner>,
}

impl ScrollCoordinator {
    /// `backdrop` is the `#nav-backdrop` element, when one was built
    pub fn new(backdrop: Option<NodeId>) -> Self {
        Self {
            backdrop,
            scroll_owners: BTreeSet::new(),
            backdrop_owners: BTreeSet::new(),
        }
    }

    /// Take a share of the scroll lock, and of the backdrop if asked
    pub fn acquire(&mut self, doc: &mut Document, owner: LockOwner, with_backdrop: bool) {
        self.scroll_owners.insert(owner);
        if with_backdrop {
            self.backdrop_owners.insert(owner);
        } else {
            self.backdrop_owners.remove(&owner);
        }
        self.apply(doc);
    }

    /// Drop every share `owner` holds
    pub fn release(&mut self, doc: &mut Document, owner: LockOwner) {
        self.scroll_owners.remove(&owner);
        self.backdrop_owners.remove(&owner);
        self.apply(doc);
    }

    pub fn is_locked(&self) -> bool {
        !self.scroll_owners.is_empty()
    }

    pub fn backdrop_visible(&self) -> bool {
        !self.backdrop_owners.is_empty()
    }

    pub fn holds(&self, owner: LockOwner) -> bool {
        self.scroll_owners.contains(&owner)
    }

    /// Write the derived state to the DOM
    pub fn apply(&self, doc: &mut Document) {
        let body = doc.body();
        if self.is_locked() {
            doc.dataset_set(body, "scroll", "disabled");
        } else {
            doc.dataset_remove(body, "scroll");
        }
        if let Some(backdrop) = self.backdrop {
            doc.set_attribute(backdrop, "aria-hidden", !self.backdrop_visible());
        }
    }
}
