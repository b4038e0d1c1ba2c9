//! Search
//!
//! [`SearchController`] drives `button#search`: the first click loads the
//! search widget through a [`LazyWidget`], later clicks only toggle it.
//! [`SearchForm`] is the behaviour of the loaded form: the suggestion
//! list and the results URL for a submitted query.

use std::cell::RefCell;
use std::rc::Rc;

use navkit_dom::{DomResult, DomTree, NodeId};
use navkit_net::ResourceFetcher;
use serde::Deserialize;
use url::Url;

use crate::config::SearchConfig;
use crate::decorate::build_symbol;
use crate::disclosure::DisclosureWidget;
use crate::lazy::{LazyWidget, LoadState, WidgetResources};
use crate::{LoadError, SharedDocument};

#[derive(Debug, Deserialize)]
struct SuggestionIndex {
    data: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    name: String,
    #[serde(rename = "URL")]
    url: String,
}

/// The loaded search form
#[derive(Debug, Clone)]
pub struct SearchForm {
    form: NodeId,
    results_url: String,
    suggestions_path: String,
}

impl SearchForm {
    pub fn new(form: NodeId, config: &SearchConfig) -> Self {
        Self {
            form,
            results_url: config.results_url.clone(),
            suggestions_path: config.suggestions_path.clone(),
        }
    }

    pub fn form(&self) -> NodeId {
        self.form
    }

    /// Results page for `query`. Blank queries go nowhere.
    pub fn submit_url(&self, query: &str) -> Option<Url> {
        if query.trim().is_empty() {
            return None;
        }
        match Url::parse_with_params(&self.results_url, &[("q", query)]) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("invalid search results URL {}: {e}", self.results_url);
                None
            }
        }
    }

    /// Submit the form: the query is the value of its first input
    pub fn submit(&self, tree: &DomTree) -> Option<Url> {
        let input = tree.query_selector(self.form, "input")?;
        self.submit_url(tree.get_attribute(input, "value").unwrap_or_default())
    }

    /// Fill `.tools-search-suggestions ul` from the suggestions index.
    /// Returns how many links were added.
    pub async fn populate_suggestions(
        &self,
        doc: &SharedDocument,
        fetcher: &dyn ResourceFetcher,
    ) -> Result<usize, LoadError> {
        let Some(list) = doc
            .borrow()
            .query_selector(self.form, ".tools-search-suggestions ul")
        else {
            tracing::debug!("search form has no suggestion list");
            return Ok(0);
        };

        let url = self.suggestions_path.as_str();
        let response = fetcher
            .fetch_ok(url)
            .await
            .map_err(|e| LoadError::from_net(url, e))?;
        let index: SuggestionIndex =
            serde_json::from_slice(&response.body).map_err(|e| LoadError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let mut doc = doc.borrow_mut();
        for suggestion in &index.data {
            append_suggestion(&mut doc, list, suggestion).map_err(|e| LoadError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(index.data.len())
    }
}

fn append_suggestion(tree: &mut DomTree, list: NodeId, suggestion: &Suggestion) -> DomResult<()> {
    let li = tree.create_element("li");
    let a = tree.create_element("a");
    tree.set_attribute(a, "href", &suggestion.url);
    tree.set_text_content(a, &suggestion.name)?;
    tree.append_child(li, a)?;
    tree.append_child(list, li)?;
    Ok(())
}

/// The search trigger and its lazily loaded form
pub struct SearchController {
    button: NodeId,
    widget: LazyWidget,
    disclosure: RefCell<Option<DisclosureWidget>>,
    form: RefCell<Option<SearchForm>>,
    config: SearchConfig,
    doc: SharedDocument,
    fetcher: Rc<dyn ResourceFetcher>,
}

impl std::fmt::Debug for SearchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchController")
            .field("button", &self.button)
            .field("widget", &self.widget)
            .field("expanded", &self.is_expanded())
            .finish()
    }
}

impl SearchController {
    /// Control `button`; the form is mounted in the button's list item
    pub fn new(
        button: NodeId,
        config: SearchConfig,
        doc: SharedDocument,
        fetcher: Rc<dyn ResourceFetcher>,
    ) -> Self {
        let container = {
            let tree = doc.borrow();
            tree.closest(button, "li")
                .or_else(|| tree.parent(button))
                .unwrap_or(button)
        };
        let widget = LazyWidget::new(
            config.modal_id.clone(),
            WidgetResources::from_base(&config.base_path),
            container,
            doc.clone(),
            fetcher.clone(),
        )
        .with_tag("form");

        Self {
            button,
            widget,
            disclosure: RefCell::new(None),
            form: RefCell::new(None),
            config,
            doc,
            fetcher,
        }
    }

    pub fn button(&self) -> NodeId {
        self.button
    }

    pub fn widget(&self) -> &LazyWidget {
        &self.widget
    }

    pub fn load_state(&self) -> LoadState {
        self.widget.state()
    }

    pub fn is_expanded(&self) -> bool {
        self.disclosure
            .borrow()
            .as_ref()
            .is_some_and(DisclosureWidget::is_expanded)
    }

    /// The form behaviour, once loaded
    pub fn form(&self) -> Option<SearchForm> {
        self.form.borrow().clone()
    }

    /// Click on the search button. Loads the widget on first use, then
    /// flips it and focuses the search input when opening. A failed load
    /// is returned and the next click retries.
    pub async fn toggle(&self) -> Result<bool, LoadError> {
        let form = self.widget.ensure_loaded().await?;

        let first_build = self.disclosure.borrow().is_none();
        if first_build {
            let search_form = self.build(form);
            if let Err(e) = search_form
                .populate_suggestions(&self.doc, self.fetcher.as_ref())
                .await
            {
                tracing::warn!("search suggestions unavailable: {e}");
            }
        }

        let mut doc = self.doc.borrow_mut();
        let mut disclosure = self.disclosure.borrow_mut();
        let Some(widget) = disclosure.as_mut() else {
            return Ok(false);
        };
        let expanded = widget.toggle(&mut doc);
        if expanded {
            if let Some(input) = doc.query_selector(form, r#"input[type="search"]"#) {
                doc.focus(input);
            }
        }
        Ok(expanded)
    }

    /// First successful load: decorate the button and take control of the form
    fn build(&self, form: NodeId) -> SearchForm {
        let mut doc = self.doc.borrow_mut();
        let close = build_symbol(&mut doc, "close");
        if let Err(e) = doc.append_child(self.button, close) {
            tracing::warn!("search close symbol not added: {e}");
        }
        doc.set_attribute(self.button, "aria-controls", &self.config.modal_id);

        let widget = DisclosureWidget::new("search", self.button, form);
        widget.sync(&mut doc);
        *self.disclosure.borrow_mut() = Some(widget);
        let search_form = SearchForm::new(form, &self.config);
        *self.form.borrow_mut() = Some(search_form.clone());
        search_form
    }
}
