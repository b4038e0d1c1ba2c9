//! Lazy Widget Loader
//!
//! Load-once state machine for widgets whose markup, stylesheet and
//! script are only fetched the first time someone asks for them.
//!
//! ```text
//! NotLoaded --ensure_loaded--> Loading --ok--> Loaded
//!     ^                           |
//!     +--- error / abandoned -----+
//! ```
//!
//! While `Loading`, every caller awaits the same [`PendingLoad`], so
//! concurrent triggers never issue a second fetch. A failure is handed to
//! all of them and the widget drops back to `NotLoaded` for a retry.
//!
//! The caller that started a load may be dropped (a timeout, a cancelled
//! task). Whatever it had mounted is removed, the widget returns to
//! `NotLoaded` and a waiting caller takes the load over.

use std::cell::RefCell;
use std::rc::Rc;

use navkit_dom::{Document, DomError, DomTree, NodeId};
use navkit_html::HtmlParser;
use navkit_net::ResourceFetcher;
use smol::lock::OnceCell;

use crate::{LoadError, SharedDocument};

/// Observable load state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
}

/// Handle on an in-flight load, shared by everyone waiting for it
#[derive(Debug, Default)]
pub struct PendingLoad {
    result: OnceCell<Result<NodeId, LoadError>>,
}

impl PendingLoad {
    /// Wait for the load to settle
    pub async fn wait(&self) -> Result<NodeId, LoadError> {
        self.result.wait().await.clone()
    }

    /// Whether the load has settled
    pub fn is_settled(&self) -> bool {
        self.result.is_initialized()
    }

    fn settle(&self, result: Result<NodeId, LoadError>) {
        // Single thread, single settler: never contended
        let _ = self.result.set_blocking(result);
    }
}

#[derive(Debug, Clone)]
enum Slot {
    NotLoaded,
    Loading(Rc<PendingLoad>),
    Loaded(NodeId),
}

/// The sub-resources of a widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetResources {
    pub markup: String,
    pub styles: Option<String>,
    pub script: Option<String>,
}

impl WidgetResources {
    /// `index.html`, `styles.css` and `scripts.js` under `base`
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            markup: format!("{base}/index.html"),
            styles: Some(format!("{base}/styles.css")),
            script: Some(format!("{base}/scripts.js")),
        }
    }
}

/// A widget built from fetched markup on first use.
///
/// The markup is parsed into a fresh element (`<form id=...>` for search)
/// appended to `container`. The stylesheet becomes a `<link>` in the head
/// and the script a module `<script>`, each added once.
pub struct LazyWidget {
    id: String,
    tag: String,
    resources: WidgetResources,
    container: NodeId,
    doc: SharedDocument,
    fetcher: Rc<dyn ResourceFetcher>,
    slot: RefCell<Slot>,
    /// Nodes mounted by the load in progress, removed if it fails
    partial: RefCell<Vec<NodeId>>,
}

impl std::fmt::Debug for LazyWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyWidget")
            .field("id", &self.id)
            .field("resources", &self.resources)
            .field("state", &self.state())
            .finish()
    }
}

/// Settles the pending load if the caller driving it is dropped first
struct LoadGuard<'a> {
    widget: &'a LazyWidget,
    pending: Rc<PendingLoad>,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if self.pending.is_settled() {
            return;
        }
        let widget = self.widget;
        tracing::warn!("widget {} load abandoned", widget.id);
        match widget.doc.try_borrow_mut() {
            Ok(mut doc) => widget.rollback(&mut doc),
            Err(_) => tracing::warn!("widget {}: document busy, partial markup kept", widget.id),
        }
        *widget.slot.borrow_mut() = Slot::NotLoaded;
        self.pending.settle(Err(LoadError::Abandoned {
            url: widget.resources.markup.clone(),
        }));
    }
}

impl LazyWidget {
    pub fn new(
        id: impl Into<String>,
        resources: WidgetResources,
        container: NodeId,
        doc: SharedDocument,
        fetcher: Rc<dyn ResourceFetcher>,
    ) -> Self {
        Self {
            id: id.into(),
            tag: "div".into(),
            resources,
            container,
            doc,
            fetcher,
            slot: RefCell::new(Slot::NotLoaded),
            partial: RefCell::new(Vec::new()),
        }
    }

    /// Element the markup is parsed into (default `div`)
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_ascii_lowercase();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> LoadState {
        match &*self.slot.borrow() {
            Slot::NotLoaded => LoadState::NotLoaded,
            Slot::Loading(_) => LoadState::Loading,
            Slot::Loaded(_) => LoadState::Loaded,
        }
    }

    /// The in-flight load, if one is running
    pub fn pending(&self) -> Option<Rc<PendingLoad>> {
        match &*self.slot.borrow() {
            Slot::Loading(pending) => Some(pending.clone()),
            _ => None,
        }
    }

    /// The built element, once loaded
    pub fn element(&self) -> Option<NodeId> {
        match &*self.slot.borrow() {
            Slot::Loaded(element) => Some(*element),
            _ => None,
        }
    }

    /// Return the widget element, loading it first if necessary.
    ///
    /// Callers arriving during a load share its result, including an error.
    /// If the caller that started the load is dropped, the next waiter
    /// starts it again.
    pub async fn ensure_loaded(&self) -> Result<NodeId, LoadError> {
        loop {
            let current = self.slot.borrow().clone();
            match current {
                Slot::Loaded(element) => return Ok(element),
                Slot::Loading(pending) => {
                    tracing::debug!("{} already loading, waiting", self.id);
                    match pending.wait().await {
                        Err(LoadError::Abandoned { .. }) => continue,
                        result => return result,
                    }
                }
                Slot::NotLoaded => break,
            }
        }

        let pending = Rc::new(PendingLoad::default());
        *self.slot.borrow_mut() = Slot::Loading(pending.clone());
        let _guard = LoadGuard {
            widget: self,
            pending: pending.clone(),
        };
        tracing::info!("loading widget {}", self.id);

        let result = self.load().await;
        *self.slot.borrow_mut() = match &result {
            Ok(element) => Slot::Loaded(*element),
            Err(e) => {
                tracing::warn!("widget {} failed to load: {e}", self.id);
                Slot::NotLoaded
            }
        };
        pending.settle(result.clone());
        result
    }

    async fn fetch_text(&self, url: &str) -> Result<String, LoadError> {
        let response = self
            .fetcher
            .fetch_ok(url)
            .await
            .map_err(|e| LoadError::from_net(url, e))?;
        response.text().map_err(|_| LoadError::Markup {
            url: url.to_string(),
        })
    }

    async fn load(&self) -> Result<NodeId, LoadError> {
        let markup = self.fetch_text(&self.resources.markup).await?;
        if let Some(styles) = &self.resources.styles {
            self.fetch_text(styles).await?;
        }

        let element = {
            let mut doc = self.doc.borrow_mut();
            let mounted = self.mount(&mut doc, &markup);
            if mounted.is_err() {
                self.rollback(&mut doc);
            }
            mounted?
        };

        if let Some(src) = &self.resources.script {
            let loaded = match self.fetch_text(src).await {
                Ok(_) => {
                    let mut doc = self.doc.borrow_mut();
                    let script = doc.create_element("script");
                    doc.set_attribute(script, "type", "module");
                    doc.set_attribute(script, "src", src);
                    let head = doc.head();
                    doc.append_child(head, script)
                        .map(|_| ())
                        .map_err(|e| mount_error(src, e))
                }
                Err(e) => Err(e),
            };
            if let Err(e) = loaded {
                self.rollback(&mut self.doc.borrow_mut());
                return Err(e);
            }
        }

        self.partial.borrow_mut().clear();
        tracing::info!("widget {} loaded", self.id);
        Ok(element)
    }

    /// Add the stylesheet link and the widget element, recording both
    fn mount(&self, doc: &mut Document, markup: &str) -> Result<NodeId, LoadError> {
        if let Some(href) = &self.resources.styles {
            let link = doc.create_element("link");
            doc.set_attribute(link, "rel", "stylesheet");
            doc.set_attribute(link, "href", href);
            let head = doc.head();
            doc.append_child(head, link).map_err(|e| mount_error(href, e))?;
            self.partial.borrow_mut().push(link);
        }

        let element = doc.create_element(&self.tag);
        doc.set_attribute(element, "id", &self.id);
        let count = HtmlParser::new().parse_into(doc, element, markup);
        tracing::debug!("{} markup: {count} top-level nodes", self.id);
        doc.append_child(self.container, element)
            .map_err(|e| mount_error(&self.resources.markup, e))?;
        self.partial.borrow_mut().push(element);
        Ok(element)
    }

    /// Remove whatever the current load mounted
    fn rollback(&self, tree: &mut DomTree) {
        for node in self.partial.borrow_mut().drain(..) {
            tree.detach(node);
        }
    }
}

fn mount_error(url: &str, err: DomError) -> LoadError {
    LoadError::Mount {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navkit_dom::Document;
    use navkit_net::MemoryFetcher;

    const BASE: &str = "/blocks/header/search";

    fn setup(fetcher: Rc<MemoryFetcher>) -> (SharedDocument, LazyWidget) {
        let doc: SharedDocument = Rc::new(RefCell::new(Document::default()));
        let container = doc.borrow().body();
        let widget = LazyWidget::new(
            "search-modal",
            WidgetResources::from_base(BASE),
            container,
            doc.clone(),
            fetcher,
        )
        .with_tag("form");
        (doc, widget)
    }

    fn serve_all(fetcher: &MemoryFetcher) {
        fetcher.insert(
            "/blocks/header/search/index.html",
            r#"<input type="search" name="q"><div class="tools-search-suggestions"><ul></ul></div>"#,
        );
        fetcher.insert("/blocks/header/search/styles.css", ".x{}");
        fetcher.insert("/blocks/header/search/scripts.js", "export {}");
    }

    #[test]
    fn test_resources_from_base() {
        let r = WidgetResources::from_base("/widgets/search/");
        assert_eq!(r.markup, "/widgets/search/index.html");
        assert_eq!(r.styles.as_deref(), Some("/widgets/search/styles.css"));
        assert_eq!(r.script.as_deref(), Some("/widgets/search/scripts.js"));
    }

    #[test]
    fn test_load_builds_element() {
        let fetcher = Rc::new(MemoryFetcher::new());
        serve_all(&fetcher);
        let (doc, widget) = setup(fetcher.clone());

        assert_eq!(widget.state(), LoadState::NotLoaded);
        let form = smol::block_on(widget.ensure_loaded()).unwrap();
        assert_eq!(widget.state(), LoadState::Loaded);
        assert_eq!(widget.element(), Some(form));

        let doc = doc.borrow();
        assert!(doc.is_tag(form, "form"));
        assert_eq!(doc.get_element_by_id("search-modal"), Some(form));
        assert!(doc.query_selector(form, r#"input[type="search"]"#).is_some());
        let head = doc.head();
        assert!(doc.query_selector(head, "link[rel=stylesheet]").is_some());
        assert!(doc.query_selector(head, "script[type=module]").is_some());
    }

    #[test]
    fn test_loaded_is_cached() {
        let fetcher = Rc::new(MemoryFetcher::new());
        serve_all(&fetcher);
        let (_doc, widget) = setup(fetcher.clone());

        let first = smol::block_on(widget.ensure_loaded()).unwrap();
        let second = smol::block_on(widget.ensure_loaded()).unwrap();
        assert_eq!(first, second);
        assert_eq!(fetcher.requests().len(), 3);
    }

    #[test]
    fn test_concurrent_callers_share_one_load() {
        let fetcher = Rc::new(MemoryFetcher::new().suspending());
        serve_all(&fetcher);
        let (_doc, widget) = setup(fetcher.clone());

        let (a, b) = smol::block_on(smol::future::zip(
            widget.ensure_loaded(),
            widget.ensure_loaded(),
        ));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(fetcher.request_count("/blocks/header/search/index.html"), 1);
        assert_eq!(fetcher.request_count("/blocks/header/search/styles.css"), 1);
        assert_eq!(fetcher.request_count("/blocks/header/search/scripts.js"), 1);
    }

    #[test]
    fn test_pending_handle_visible_while_loading() {
        let fetcher = Rc::new(MemoryFetcher::new().suspending());
        serve_all(&fetcher);
        let (_doc, widget) = setup(fetcher);

        smol::block_on(async {
            let observer = async {
                smol::future::yield_now().await;
                assert_eq!(widget.state(), LoadState::Loading);
                let pending = widget.pending().unwrap();
                assert!(!pending.is_settled());
                pending.wait().await
            };
            let (loaded, observed) = smol::future::zip(widget.ensure_loaded(), observer).await;
            assert_eq!(loaded.unwrap(), observed.unwrap());
        });
        assert!(widget.pending().is_none());
    }

    #[test]
    fn test_failure_resets_and_retries() {
        let fetcher = Rc::new(MemoryFetcher::new());
        fetcher.fail("/blocks/header/search/index.html", "offline");
        let (doc, widget) = setup(fetcher.clone());

        let err = smol::block_on(widget.ensure_loaded()).unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
        assert_eq!(err.url(), "/blocks/header/search/index.html");
        assert_eq!(widget.state(), LoadState::NotLoaded);

        serve_all(&fetcher);
        smol::block_on(widget.ensure_loaded()).unwrap();
        assert_eq!(fetcher.request_count("/blocks/header/search/index.html"), 2);
        assert_eq!(doc.borrow().query_selector_all(doc.borrow().root(), "form").len(), 1);
    }

    #[test]
    fn test_script_failure_rolls_back() {
        let fetcher = Rc::new(MemoryFetcher::new());
        serve_all(&fetcher);
        fetcher.remove("/blocks/header/search/scripts.js");
        let (doc, widget) = setup(fetcher.clone());

        let err = smol::block_on(widget.ensure_loaded()).unwrap_err();
        assert_eq!(
            err,
            LoadError::Status {
                url: "/blocks/header/search/scripts.js".into(),
                status: 404
            }
        );
        {
            let doc = doc.borrow();
            assert_eq!(doc.get_element_by_id("search-modal"), None);
            assert!(doc.query_selector(doc.head(), "link").is_none());
        }

        serve_all(&fetcher);
        smol::block_on(widget.ensure_loaded()).unwrap();
        let doc = doc.borrow();
        assert_eq!(doc.query_selector_all(doc.head(), "link").len(), 1);
    }

    #[test]
    fn test_mount_failure_rolls_back() {
        let fetcher = Rc::new(MemoryFetcher::new());
        serve_all(&fetcher);
        let doc: SharedDocument = Rc::new(RefCell::new(Document::default()));
        let widget = LazyWidget::new(
            "search-modal",
            WidgetResources::from_base(BASE),
            NodeId::NONE,
            doc.clone(),
            fetcher.clone(),
        );

        let err = smol::block_on(widget.ensure_loaded()).unwrap_err();
        assert!(matches!(err, LoadError::Mount { ref url, .. } if url == "/blocks/header/search/index.html"));
        assert_eq!(widget.state(), LoadState::NotLoaded);
        assert_eq!(fetcher.request_count("/blocks/header/search/scripts.js"), 0);
        let doc = doc.borrow();
        assert!(doc.query_selector(doc.head(), "link").is_none());
    }

    #[test]
    fn test_concurrent_failure_reaches_every_caller() {
        let fetcher = Rc::new(MemoryFetcher::new().suspending());
        fetcher.fail("/blocks/header/search/index.html", "offline");
        let (_doc, widget) = setup(fetcher.clone());

        let (a, b) = smol::block_on(smol::future::zip(
            widget.ensure_loaded(),
            widget.ensure_loaded(),
        ));
        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert_eq!(fetcher.request_count("/blocks/header/search/index.html"), 1);
        assert_eq!(widget.state(), LoadState::NotLoaded);
    }

    #[test]
    fn test_dropped_leader_does_not_wedge_loader() {
        let fetcher = Rc::new(MemoryFetcher::new().suspending());
        serve_all(&fetcher);
        let (doc, widget) = setup(fetcher.clone());

        // Give up as soon as the first fetch suspends
        let timed_out = smol::block_on(smol::future::or(
            async { Some(widget.ensure_loaded().await) },
            async { None },
        ));
        assert!(timed_out.is_none());
        assert_eq!(widget.state(), LoadState::NotLoaded);
        assert!(widget.pending().is_none());

        let form = smol::block_on(widget.ensure_loaded()).unwrap();
        assert_eq!(widget.state(), LoadState::Loaded);
        assert_eq!(fetcher.request_count("/blocks/header/search/index.html"), 2);
        let doc = doc.borrow();
        assert_eq!(doc.get_element_by_id("search-modal"), Some(form));
        assert_eq!(doc.query_selector_all(doc.head(), "link").len(), 1);
    }

    #[test]
    fn test_dropped_leader_unmounts_partial_widget() {
        let fetcher = Rc::new(MemoryFetcher::new().suspending());
        serve_all(&fetcher);
        let (doc, widget) = setup(fetcher.clone());

        // Stop once the form is mounted and the script is still in flight
        let mounted = async {
            loop {
                if doc.borrow().get_element_by_id("search-modal").is_some() {
                    return None;
                }
                smol::future::yield_now().await;
            }
        };
        let result = smol::block_on(smol::future::or(
            async { Some(widget.ensure_loaded().await) },
            mounted,
        ));
        assert!(result.is_none());
        assert_eq!(widget.state(), LoadState::NotLoaded);
        {
            let doc = doc.borrow();
            assert_eq!(doc.get_element_by_id("search-modal"), None);
            assert!(doc.query_selector(doc.head(), "link").is_none());
            assert!(doc.query_selector(doc.head(), "script").is_none());
        }

        smol::block_on(widget.ensure_loaded()).unwrap();
        let doc = doc.borrow();
        assert_eq!(doc.query_selector_all(doc.root(), "form").len(), 1);
        assert_eq!(doc.query_selector_all(doc.head(), "link").len(), 1);
        assert_eq!(doc.query_selector_all(doc.head(), "script").len(), 1);
    }

    #[test]
    fn test_waiter_takes_over_abandoned_load() {
        let fetcher = Rc::new(MemoryFetcher::new().suspending());
        serve_all(&fetcher);
        let (_doc, widget) = setup(fetcher.clone());

        let form = smol::block_on(async {
            let mut leader = Box::pin(widget.ensure_loaded());
            assert!(smol::future::poll_once(&mut leader).await.is_none());
            let mut waiter = Box::pin(widget.ensure_loaded());
            assert!(smol::future::poll_once(&mut waiter).await.is_none());
            assert_eq!(widget.state(), LoadState::Loading);

            drop(leader);
            waiter.await
        })
        .unwrap();
        assert_eq!(widget.element(), Some(form));
        assert_eq!(fetcher.request_count("/blocks/header/search/index.html"), 2);
        assert_eq!(fetcher.request_count("/blocks/header/search/scripts.js"), 1);
    }
}
