//! Navigation Assembler
//!
//! Consumes the nav fragment once: assigns its sections to slots by
//! position, decorates each slot that has the structure it expects, and
//! wires the controllers together. The resulting [`NavigationTree`] owns
//! every controller and routes clicks to them.

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use navkit_dom::{DomResult, DomTree, NodeId};
use navkit_net::ResourceFetcher;

use crate::breakpoint::{BreakpointMonitor, Mode};
use crate::config::HeaderConfig;
use crate::decorate::{
    build_symbol, decorate_alert, decorate_brand, decorate_language_picker,
    decorate_location_finder, decorate_tools,
};
use crate::disclosure::DisclosureWidget;
use crate::fragment::{load_fragment, metadata_path};
use crate::group::{ExclusiveGroup, SectionsMenu};
use crate::hamburger::HamburgerController;
use crate::scroll::ScrollCoordinator;
use crate::search::SearchController;
use crate::slots::NavSlot;
use crate::{HeaderError, LoadError, SharedDocument};

/// What a click did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Section { id: String, expanded: bool },
    Hamburger { expanded: bool },
    LanguagePicker { expanded: bool },
    Search { expanded: bool },
    /// Not on a control
    Ignored,
}

/// Turn a section list's nested lists into dropdowns.
///
/// Returns the group of dropdowns, or `None` when the slot has no list.
fn build_sections(tree: &mut DomTree, slot: NodeId) -> DomResult<Option<ExclusiveGroup>> {
    let Some(list) = tree.query_selector(slot, "ul") else {
        tracing::debug!("sections slot has no list");
        return Ok(None);
    };
    let wrapper = tree.create_element("nav");
    tree.replace_with(list, wrapper)?;
    tree.append_child(wrapper, list)?;

    let mut members = Vec::new();
    for (i, li) in tree.element_children(list).into_iter().enumerate() {
        let Some(sublist) = tree.query_selector(li, "ul") else {
            continue;
        };
        let id = format!("subsection-{}", i + 1);
        let label = tree
            .text_content(li)
            .replacen(&tree.text_content(sublist), "", 1)
            .trim()
            .to_string();

        tree.set_attribute(li, "class", "subsection");
        tree.set_attribute(sublist, "id", &id);
        tree.set_attribute(sublist, "role", "menu");
        tree.dataset_set(sublist, "label", &label);
        for item in tree.element_children(sublist) {
            tree.set_attribute(item, "role", "menuitem");
            if let Some(a) = tree.query_selector(item, "a") {
                let span = tree.create_element("span");
                tree.move_children(a, span)?;
                tree.append_child(a, span)?;
                let chevron = build_symbol(tree, "chevron");
                tree.append_child(a, chevron)?;
            }
        }

        let button = tree.create_element("button");
        tree.set_attribute(button, "type", "button");
        tree.set_attribute(button, "id", format!("{id}-button"));
        tree.set_attribute(button, "aria-haspopup", true);
        tree.set_attribute(button, "aria-controls", &id);
        tree.set_text_content(button, &label)?;
        let chevron = build_symbol(tree, "chevron");
        tree.append_child(button, chevron)?;

        tree.remove_children(li);
        tree.append_child(li, button)?;
        tree.append_child(li, sublist)?;
        members.push(DisclosureWidget::new(id, button, sublist).with_item(li));
    }

    tracing::debug!("sections: {} dropdowns", members.len());
    let group = ExclusiveGroup::new(NavSlot::Sections.element_id(), members);
    group.sync(tree);
    Ok(Some(group))
}

/// Builds a [`NavigationTree`] from a loaded nav fragment
pub struct NavigationAssembler {
    doc: SharedDocument,
    monitor: Rc<BreakpointMonitor>,
    fetcher: Rc<dyn ResourceFetcher>,
    config: HeaderConfig,
}

impl NavigationAssembler {
    pub fn new(
        doc: SharedDocument,
        monitor: Rc<BreakpointMonitor>,
        fetcher: Rc<dyn ResourceFetcher>,
        config: HeaderConfig,
    ) -> Self {
        Self {
            doc,
            monitor,
            fetcher,
            config,
        }
    }

    /// Move the fragment's sections into `block` as `section#nav` and make
    /// them interactive. `block`'s previous content is discarded.
    pub fn assemble(&self, fragment: NodeId, block: NodeId) -> Result<NavigationTree, HeaderError> {
        let mut slots = BTreeMap::new();

        let (nav, backdrop, sections, search_button, language, location_finder) = {
            let mut doc = self.doc.borrow_mut();
            let tree: &mut DomTree = &mut doc;

            tree.remove_children(block);
            let nav = tree.create_element("section");
            tree.set_attribute(nav, "id", "nav");
            for child in tree.element_children(fragment) {
                tree.append_child(nav, child)?;
            }

            for (i, child) in tree.element_children(nav).into_iter().enumerate() {
                let Some(slot) = NavSlot::from_index(i) else {
                    break;
                };
                let id = slot.element_id();
                tree.set_attribute(child, "id", &id);
                tree.add_class(child, &id);
                slots.insert(slot, child);
            }
            tracing::debug!("nav fragment filled {} of {} slots", slots.len(), NavSlot::ALL.len());

            let backdrop = tree.create_element("div");
            tree.set_attribute(backdrop, "id", "nav-backdrop");
            tree.set_attribute(backdrop, "class", "nav-backdrop");
            tree.set_attribute(backdrop, "aria-hidden", true);
            tree.append_child(block, backdrop)?;

            if let Some(&brand) = slots.get(&NavSlot::Brand) {
                decorate_brand(tree, brand, &self.config.brand_title)?;
            }
            let sections = match slots.get(&NavSlot::Sections) {
                Some(&slot) => build_sections(tree, slot)?,
                None => None,
            };
            let search_button = match slots.get(&NavSlot::Tools) {
                Some(&slot) => decorate_tools(tree, slot)?,
                None => None,
            };
            let location_finder = match slots.get(&NavSlot::LocationFinder) {
                Some(&slot) => decorate_location_finder(tree, slot)?,
                None => None,
            };
            let language = match slots.get(&NavSlot::LanguagePicker) {
                Some(&slot) => decorate_language_picker(tree, slot)?,
                None => None,
            };
            if let Some(&alert) = slots.get(&NavSlot::Alert) {
                decorate_alert(tree, alert)?;
            }

            (nav, backdrop, sections, search_button, language, location_finder)
        };

        let scroll = Rc::new(RefCell::new(ScrollCoordinator::new(Some(backdrop))));
        let sections = sections.map(|group| {
            Rc::new(RefCell::new(SectionsMenu::new(
                group,
                self.doc.clone(),
                self.monitor.clone(),
                scroll.clone(),
            )))
        });
        let hamburger = Rc::new(RefCell::new(HamburgerController::build(
            self.doc.clone(),
            nav,
            self.config.hamburger_controls.clone(),
            self.monitor.clone(),
            scroll.clone(),
        )?));

        // Dropdowns reset before the hamburger relays out
        if let Some(menu) = &sections {
            let menu = Rc::downgrade(menu);
            self.monitor.on_change(move |mode| {
                if let Some(menu) = menu.upgrade() {
                    menu.borrow_mut().on_breakpoint(mode);
                }
            });
        }
        let weak = Rc::downgrade(&hamburger);
        self.monitor.on_change(move |mode| {
            if let Some(hamburger) = weak.upgrade() {
                hamburger.borrow_mut().apply_mode(mode);
            }
        });

        let wrapper = {
            let mut doc = self.doc.borrow_mut();
            let wrapper = doc.create_element("div");
            doc.set_attribute(wrapper, "class", "nav-wrapper");
            doc.append_child(wrapper, nav)?;
            doc.prepend_child(block, wrapper)?;
            wrapper
        };

        let search = search_button.map(|button| {
            SearchController::new(
                button,
                self.config.search.clone(),
                self.doc.clone(),
                self.fetcher.clone(),
            )
        });

        tracing::info!(
            "header assembled in {} mode",
            self.monitor.current_mode()
        );
        Ok(NavigationTree {
            doc: self.doc.clone(),
            nav,
            wrapper,
            backdrop,
            slots,
            monitor: self.monitor.clone(),
            scroll,
            sections,
            hamburger,
            language: language.map(RefCell::new),
            location_finder,
            search,
        })
    }
}

/// The decorated header and every controller in it
#[derive(Debug)]
pub struct NavigationTree {
    doc: SharedDocument,
    nav: NodeId,
    wrapper: NodeId,
    backdrop: NodeId,
    slots: BTreeMap<NavSlot, NodeId>,
    monitor: Rc<BreakpointMonitor>,
    scroll: Rc<RefCell<ScrollCoordinator>>,
    sections: Option<Rc<RefCell<SectionsMenu>>>,
    hamburger: Rc<RefCell<HamburgerController>>,
    language: Option<RefCell<DisclosureWidget>>,
    location_finder: Option<NodeId>,
    search: Option<SearchController>,
}

impl NavigationTree {
    /// `section#nav`
    pub fn nav(&self) -> NodeId {
        self.nav
    }

    /// `div.nav-wrapper`
    pub fn wrapper(&self) -> NodeId {
        self.wrapper
    }

    /// `div#nav-backdrop`
    pub fn backdrop(&self) -> NodeId {
        self.backdrop
    }

    pub fn slot(&self, slot: NavSlot) -> Option<NodeId> {
        self.slots.get(&slot).copied()
    }

    pub fn monitor(&self) -> &BreakpointMonitor {
        &self.monitor
    }

    pub fn scroll(&self) -> Ref<'_, ScrollCoordinator> {
        self.scroll.borrow()
    }

    pub fn sections(&self) -> Option<Ref<'_, SectionsMenu>> {
        self.sections.as_ref().map(|menu| menu.borrow())
    }

    pub fn hamburger(&self) -> Ref<'_, HamburgerController> {
        self.hamburger.borrow()
    }

    pub fn language_picker(&self) -> Option<Ref<'_, DisclosureWidget>> {
        self.language.as_ref().map(RefCell::borrow)
    }

    /// `button#location-finder`
    pub fn location_finder(&self) -> Option<NodeId> {
        self.location_finder
    }

    pub fn search(&self) -> Option<&SearchController> {
        self.search.as_ref()
    }

    pub fn toggle_section(&self, id: &str) -> Option<bool> {
        self.sections.as_ref()?.borrow_mut().toggle(id)
    }

    pub fn open_section(&self, id: &str) -> bool {
        self.sections
            .as_ref()
            .is_some_and(|menu| menu.borrow_mut().open_only(id))
    }

    pub fn close_sections(&self) {
        if let Some(menu) = &self.sections {
            menu.borrow_mut().close_all();
        }
    }

    pub fn toggle_hamburger(&self) -> bool {
        self.hamburger.borrow_mut().toggle()
    }

    pub fn toggle_language_picker(&self) -> Option<bool> {
        let widget = self.language.as_ref()?;
        let mut doc = self.doc.borrow_mut();
        Some(widget.borrow_mut().toggle(&mut doc))
    }

    /// Toggle search, loading it on first use. `None` without a search button.
    pub async fn toggle_search(&self) -> Result<Option<bool>, LoadError> {
        match &self.search {
            Some(search) => search.toggle().await.map(Some),
            None => Ok(None),
        }
    }

    /// Viewport resize; controllers react through their subscriptions
    pub fn resize(&self, width: u32) -> Option<Mode> {
        self.monitor.resize(width)
    }

    /// Dispatch a click on `target` to the control it lands in
    pub async fn click(&self, target: NodeId) -> Result<ClickOutcome, HeaderError> {
        let Some(button) = self.doc.borrow().closest(target, "button") else {
            return Ok(ClickOutcome::Ignored);
        };

        let hamburger = self.hamburger.borrow().trigger();
        if button == hamburger {
            let expanded = self.toggle_hamburger();
            return Ok(ClickOutcome::Hamburger { expanded });
        }

        let section = self.sections.as_ref().and_then(|menu| {
            let menu = menu.borrow();
            menu.group()
                .member_for_trigger(button)
                .map(|w| w.id().to_string())
        });
        if let Some(id) = section {
            let expanded = self.toggle_section(&id).unwrap_or(false);
            return Ok(ClickOutcome::Section { id, expanded });
        }

        let language = self.language.as_ref().map(|w| w.borrow().trigger());
        if language == Some(button) {
            let expanded = self.toggle_language_picker().unwrap_or(false);
            return Ok(ClickOutcome::LanguagePicker { expanded });
        }

        if let Some(search) = self.search.as_ref().filter(|s| s.button() == button) {
            let expanded = search.toggle().await?;
            return Ok(ClickOutcome::Search { expanded });
        }

        Ok(ClickOutcome::Ignored)
    }
}

/// Load the nav fragment (path from `<meta name="nav">` or the config)
/// and assemble the header into `block`.
pub async fn decorate_header(
    doc: &SharedDocument,
    block: NodeId,
    fetcher: Rc<dyn ResourceFetcher>,
    monitor: Rc<BreakpointMonitor>,
    config: &HeaderConfig,
) -> Result<NavigationTree, HeaderError> {
    let path = metadata_path(&doc.borrow(), "nav", &config.nav_path);
    tracing::debug!("loading nav from {path}");
    let fragment = load_fragment(fetcher.as_ref(), doc, &path).await?;
    let Some(fragment) = fragment else {
        return Err(HeaderError::MissingFragment(path));
    };
    NavigationAssembler::new(doc.clone(), monitor, fetcher, config.clone()).assemble(fragment, block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use navkit_dom::Document;
    use navkit_html::HtmlParser;

    fn sections_slot(html: &str) -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        HtmlParser::new().parse_into(&mut tree, div, html);
        (tree, div)
    }

    #[test]
    fn test_build_sections() {
        let (mut tree, slot) = sections_slot(
            r#"<ul>
                 <li><a href="/track">Tracking</a></li>
                 <li>Shipping
                   <ul><li><a href="/ship">Create</a></li><li><a href="/rates">Rates</a></li></ul>
                 </li>
                 <li><a href="/support">Support</a></li>
               </ul>"#,
        );
        let group = build_sections(&mut tree, slot).unwrap().unwrap();
        assert_eq!(group.len(), 1);

        let widget = &group.members()[0];
        assert_eq!(widget.id(), "subsection-2");
        let button = widget.trigger();
        assert_eq!(tree.id_of(button), Some("subsection-2-button"));
        assert_eq!(tree.text_content(button), "Shipping");
        assert_eq!(tree.get_attribute(button, "aria-controls"), Some("subsection-2"));
        assert_eq!(tree.get_attribute(button, "aria-haspopup"), Some("true"));
        assert_eq!(tree.get_attribute(button, "aria-expanded"), Some("false"));

        let sublist = widget.content();
        assert_eq!(tree.dataset_get(sublist, "label"), Some("Shipping"));
        assert_eq!(tree.get_attribute(sublist, "role"), Some("menu"));
        let link = tree.query_selector(sublist, "li[role=menuitem] a").unwrap();
        assert_eq!(
            tree.inner_html(link),
            r#"<span>Create</span><i class="symbol symbol-chevron"></i>"#
        );

        let nav = tree.first_element_child(slot).unwrap();
        assert!(tree.is_tag(nav, "nav"));
        assert_eq!(tree.query_selector_all(nav, "li.subsection").len(), 1);
        let li = tree.parent(button).unwrap();
        assert!(tree.has_class(li, "subsection"));
        assert_eq!(tree.dataset_get(li, "expanded"), Some("false"));
    }

    #[test]
    fn test_build_sections_without_list() {
        let (mut tree, slot) = sections_slot("<p>Nothing here</p>");
        assert!(build_sections(&mut tree, slot).unwrap().is_none());
    }

    #[test]
    fn test_assemble_partial_fragment() {
        let doc: SharedDocument = Rc::new(RefCell::new(Document::default()));
        let (fragment, block) = {
            let mut d = doc.borrow_mut();
            let fragment = d.create_element("main");
            HtmlParser::new().parse_into(&mut d, fragment, "<div><p>Brand</p></div>");
            let block = d.create_element("div");
            let body = d.body();
            d.append_child(body, block).unwrap();
            (fragment, block)
        };
        let monitor = Rc::new(BreakpointMonitor::fixed(Mode::Mobile));
        let fetcher: Rc<dyn ResourceFetcher> = Rc::new(navkit_net::MemoryFetcher::new());
        let tree = NavigationAssembler::new(doc.clone(), monitor, fetcher, HeaderConfig::default())
            .assemble(fragment, block)
            .unwrap();

        assert!(tree.slot(NavSlot::Brand).is_some());
        assert!(tree.slot(NavSlot::Sections).is_none());
        assert!(tree.sections().is_none());
        assert!(tree.search().is_none());
        assert!(tree.language_picker().is_none());
        assert_eq!(tree.toggle_section("subsection-1"), None);
        assert_eq!(tree.toggle_language_picker(), None);
    }
}
