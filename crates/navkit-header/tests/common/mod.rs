//! Shared fixtures for the header integration tests

use std::cell::RefCell;
use std::rc::Rc;

use navkit_dom::{Document, NodeId};
use navkit_header::{BreakpointMonitor, HeaderConfig, NavigationTree, SharedDocument, decorate_header};
use navkit_net::{MemoryFetcher, ResourceFetcher};
use tracing_subscriber::EnvFilter;

/// Show library logs with `RUST_LOG=navkit_header=debug cargo test`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const DESKTOP: u32 = 1440;
pub const MOBILE: u32 = 390;

/// All seven slots; sections 2 and 3 have dropdowns
pub const NAV: &str = r#"
<div><p><strong>Parcel Co</strong></p></div>
<div><ul>
  <li><a href="/tracking">Tracking</a></li>
  <li>Shipping
    <ul><li><a href="/ship">Create a Shipment</a></li><li><a href="/rates">Rates</a></li></ul>
  </li>
  <li>Support
    <ul><li><a href="/help">Help Center</a></li></ul>
  </li>
</ul></div>
<div><ul>
  <li><a href="/login"><span class="icon icon-user"></span>Log In</a></li>
  <li><p><span class="icon icon-search"></span></p></li>
</ul></div>
<div><p><span class="icon icon-pin"></span>Locations</p></div>
<div><ul><li><strong>English</strong></li><li><a href="/es">Español</a></li></ul></div>
<div><p>Notice: <a class="button" href="/alerts">Service Alerts</a></p></div>
<div><p>Need help? Call us.</p></div>
"#;

pub const SEARCH_MARKUP: &str = r#"
<input type="search" name="q" placeholder="Search">
<div class="tools-search-suggestions"><p>Popular</p><ul></ul></div>
"#;

pub const SUGGESTIONS: &str =
    r#"{"data":[{"name":"Track a Package","URL":"/track"},{"name":"Shipping Rates","URL":"/rates"}]}"#;

pub struct Page {
    pub doc: SharedDocument,
    pub block: NodeId,
    pub fetcher: Rc<MemoryFetcher>,
    pub monitor: Rc<BreakpointMonitor>,
    pub config: HeaderConfig,
}

impl Page {
    /// A page at `width` whose fetcher serves the nav and the search widget
    pub fn new(width: u32) -> Self {
        Self::with_fetcher(width, MemoryFetcher::new())
    }

    pub fn with_fetcher(width: u32, fetcher: MemoryFetcher) -> Self {
        init_tracing();
        let doc: SharedDocument = Rc::new(RefCell::new(Document::new("https://www.example.com/us/en/")));
        let block = {
            let mut d = doc.borrow_mut();
            let header = d.create_element("header");
            let block = d.create_element("div");
            d.set_attribute(block, "class", "header block");
            let body = d.body();
            d.append_child(body, header).unwrap();
            d.append_child(header, block).unwrap();
            block
        };

        fetcher.insert("/nav.plain.html", NAV);
        fetcher.insert("/blocks/header/search/index.html", SEARCH_MARKUP);
        fetcher.insert("/blocks/header/search/styles.css", "#search-modal { display: none; }");
        fetcher.insert("/blocks/header/search/scripts.js", "export default {};");
        fetcher.insert("/fragments/search-suggestions.json", SUGGESTIONS);

        let config = HeaderConfig::default();
        let monitor = Rc::new(BreakpointMonitor::new(&config.desktop_query, width, config.fallback_mode));
        Self {
            doc,
            block,
            fetcher: Rc::new(fetcher),
            monitor,
            config,
        }
    }

    pub fn decorate(&self) -> NavigationTree {
        let fetcher: Rc<dyn ResourceFetcher> = self.fetcher.clone();
        smol::block_on(decorate_header(&self.doc, self.block, fetcher, self.monitor.clone(), &self.config))
            .unwrap()
    }

    /// First element matching `selector` anywhere in the page
    pub fn find(&self, selector: &str) -> NodeId {
        let doc = self.doc.borrow();
        doc.query_selector(doc.root(), selector)
            .unwrap_or_else(|| panic!("no element matches {selector}"))
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.doc.borrow().get_attribute(node, name).map(str::to_string)
    }

    pub fn scroll_disabled(&self) -> bool {
        let doc = self.doc.borrow();
        doc.dataset_get(doc.body(), "scroll") == Some("disabled")
    }
}
