//! Hamburger Controller
//!
//! The mobile menu button. Unlike a plain disclosure it controls several
//! regions by id, mirrors its state onto the nav as `data-expanded`, and
//! holds the page scroll lock while open on mobile.

use std::cell::RefCell;
use std::rc::Rc;

use navkit_dom::{DomResult, DomTree, NodeId};

use crate::SharedDocument;
use crate::breakpoint::{BreakpointMonitor, Mode};
use crate::decorate::build_symbol;
use crate::scroll::{LockOwner, ScrollCoordinator};

#[derive(Debug)]
pub struct HamburgerController {
    trigger: NodeId,
    wrapper: NodeId,
    nav: NodeId,
    controlled_ids: Vec<String>,
    expanded: bool,
    doc: SharedDocument,
    monitor: Rc<BreakpointMonitor>,
    scroll: Rc<RefCell<ScrollCoordinator>>,
}

impl HamburgerController {
    /// Build `div.nav-hamburger > button` at the start of `nav` and take
    /// control of it. The current breakpoint mode is applied immediately.
    pub fn build(
        doc: SharedDocument,
        nav: NodeId,
        controlled_ids: Vec<String>,
        monitor: Rc<BreakpointMonitor>,
        scroll: Rc<RefCell<ScrollCoordinator>>,
    ) -> DomResult<Self> {
        let (trigger, wrapper) = {
            let mut doc = doc.borrow_mut();
            let wrapper = doc.create_element("div");
            doc.set_attribute(wrapper, "class", "nav-hamburger");

            let button = doc.create_element("button");
            doc.set_attribute(button, "type", "button");
            doc.set_attribute(button, "aria-controls", controlled_ids.join(" "));
            doc.set_attribute(button, "aria-expanded", false);
            doc.set_attribute(button, "aria-label", "Open navigation");
            let icon = build_symbol(&mut doc, "hamburger");
            doc.append_child(button, icon)?;
            doc.append_child(wrapper, button)?;
            doc.prepend_child(nav, wrapper)?;
            (button, wrapper)
        };

        let mut controller = Self {
            trigger,
            wrapper,
            nav,
            controlled_ids,
            expanded: false,
            doc,
            monitor,
            scroll,
        };
        controller.apply_mode(controller.monitor.current_mode());
        Ok(controller)
    }

    pub fn trigger(&self) -> NodeId {
        self.trigger
    }

    pub fn wrapper(&self) -> NodeId {
        self.wrapper
    }

    pub fn controlled_ids(&self) -> &[String] {
        &self.controlled_ids
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Flip the menu. Regions are hidden exactly when the menu was open
    /// before the click. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        let was_expanded = self.expanded;
        self.expanded = !was_expanded;

        let mut doc = self.doc.borrow_mut();
        doc.set_attribute(self.trigger, "aria-expanded", self.expanded);
        self.set_controls_hidden(&mut doc, was_expanded);
        doc.dataset_set(self.nav, "expanded", self.expanded);

        let mut scroll = self.scroll.borrow_mut();
        if self.expanded && !self.monitor.is_desktop() {
            scroll.acquire(&mut doc, LockOwner::Hamburger, false);
        } else {
            scroll.release(&mut doc, LockOwner::Hamburger);
        }
        self.expanded
    }

    /// Lay the header out for `mode` and collapse the menu.
    ///
    /// Desktop shows the controlled regions unconditionally and hides the
    /// hamburger; mobile restores the hamburger with the regions hidden.
    pub fn apply_mode(&mut self, mode: Mode) {
        let desktop = mode == Mode::Desktop;
        self.expanded = false;

        let mut doc = self.doc.borrow_mut();
        doc.dataset_set(self.nav, "expanded", desktop);
        doc.set_attribute(self.wrapper, "aria-hidden", desktop);
        doc.set_attribute(self.trigger, "aria-expanded", false);
        self.set_controls_hidden(&mut doc, !desktop);
        self.scroll
            .borrow_mut()
            .release(&mut doc, LockOwner::Hamburger);
        tracing::debug!("hamburger laid out for {mode} mode");
    }

    fn set_controls_hidden(&self, tree: &mut DomTree, hidden: bool) {
        for id in &self.controlled_ids {
            // Missing regions are simply not controlled
            if let Some(region) = tree.find_by_id(self.nav, id) {
                tree.set_attribute(region, "aria-hidden", hidden);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navkit_dom::Document;

    struct Fixture {
        doc: SharedDocument,
        nav: NodeId,
        sections: NodeId,
        support: NodeId,
        scroll: Rc<RefCell<ScrollCoordinator>>,
    }

    fn fixture() -> Fixture {
        let doc: SharedDocument = Rc::new(RefCell::new(Document::default()));
        let (nav, sections, support) = {
            let mut d = doc.borrow_mut();
            let nav = d.create_element("section");
            d.set_attribute(nav, "id", "nav");
            let body = d.body();
            d.append_child(body, nav).unwrap();
            let sections = d.create_element("div");
            d.set_attribute(sections, "id", "nav-sections");
            d.append_child(nav, sections).unwrap();
            let support = d.create_element("div");
            d.set_attribute(support, "id", "nav-support");
            d.append_child(nav, support).unwrap();
            (nav, sections, support)
        };
        let scroll = Rc::new(RefCell::new(ScrollCoordinator::new(None)));
        Fixture {
            doc,
            nav,
            sections,
            support,
            scroll,
        }
    }

    fn controls() -> Vec<String> {
        vec!["nav-sections".into(), "nav-missing".into(), "nav-support".into()]
    }

    #[test]
    fn test_build_structure() {
        let f = fixture();
        let monitor = Rc::new(BreakpointMonitor::fixed(Mode::Mobile));
        let h = HamburgerController::build(f.doc.clone(), f.nav, controls(), monitor, f.scroll)
            .unwrap();

        let doc = f.doc.borrow();
        assert_eq!(doc.first_element_child(f.nav), Some(h.wrapper()));
        assert_eq!(
            doc.get_attribute(h.trigger(), "aria-controls"),
            Some("nav-sections nav-missing nav-support")
        );
        assert!(doc.query_selector(h.trigger(), "i.symbol-hamburger").is_some());
        assert_eq!(doc.get_attribute(h.wrapper(), "aria-hidden"), Some("false"));
        assert_eq!(doc.get_attribute(f.sections, "aria-hidden"), Some("true"));
        assert_eq!(doc.dataset_get(f.nav, "expanded"), Some("false"));
    }

    #[test]
    fn test_toggle_on_mobile() {
        let f = fixture();
        let monitor = Rc::new(BreakpointMonitor::fixed(Mode::Mobile));
        let mut h =
            HamburgerController::build(f.doc.clone(), f.nav, controls(), monitor, f.scroll.clone())
                .unwrap();

        assert!(h.toggle());
        {
            let doc = f.doc.borrow();
            assert_eq!(doc.get_attribute(h.trigger(), "aria-expanded"), Some("true"));
            assert_eq!(doc.get_attribute(f.sections, "aria-hidden"), Some("false"));
            assert_eq!(doc.get_attribute(f.support, "aria-hidden"), Some("false"));
            assert_eq!(doc.dataset_get(f.nav, "expanded"), Some("true"));
            assert_eq!(doc.dataset_get(doc.body(), "scroll"), Some("disabled"));
        }

        assert!(!h.toggle());
        let doc = f.doc.borrow();
        assert_eq!(doc.get_attribute(f.sections, "aria-hidden"), Some("true"));
        assert_eq!(doc.dataset_get(doc.body(), "scroll"), None);
    }

    #[test]
    fn test_desktop_layout() {
        let f = fixture();
        let monitor = Rc::new(BreakpointMonitor::fixed(Mode::Desktop));
        let mut h =
            HamburgerController::build(f.doc.clone(), f.nav, controls(), monitor, f.scroll.clone())
                .unwrap();
        {
            let doc = f.doc.borrow();
            assert_eq!(doc.get_attribute(h.wrapper(), "aria-hidden"), Some("true"));
            assert_eq!(doc.get_attribute(f.sections, "aria-hidden"), Some("false"));
            assert_eq!(doc.dataset_get(f.nav, "expanded"), Some("true"));
        }

        h.toggle();
        assert!(!f.scroll.borrow().is_locked());
    }

    #[test]
    fn test_apply_mode_resets_and_releases() {
        let f = fixture();
        let monitor = Rc::new(BreakpointMonitor::fixed(Mode::Mobile));
        let mut h =
            HamburgerController::build(f.doc.clone(), f.nav, controls(), monitor, f.scroll.clone())
                .unwrap();
        h.toggle();
        assert!(f.scroll.borrow().holds(LockOwner::Hamburger));

        h.apply_mode(Mode::Desktop);
        assert!(!h.is_expanded());
        assert!(!f.scroll.borrow().is_locked());
        let doc = f.doc.borrow();
        assert_eq!(doc.get_attribute(h.trigger(), "aria-expanded"), Some("false"));
        assert_eq!(doc.get_attribute(f.support, "aria-hidden"), Some("false"));
    }
}
