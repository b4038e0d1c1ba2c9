//! Fragment loading
//!
//! Header and footer content is authored as separate documents served at
//! `{path}.plain.html`. A fragment is parsed into a detached `<main>`.

use navkit_dom::{Document, NodeId};
use navkit_html::HtmlParser;
use navkit_net::{Request, ResourceFetcher};
use url::Url;

use crate::{HeaderError, SharedDocument};

/// Fragment path named by `<meta name="{name}">`, or `default`.
///
/// The metadata value may be relative or absolute; it is resolved
/// against the document URL and only its path is kept.
pub fn metadata_path(doc: &Document, name: &str, default: &str) -> String {
    let Some(meta) = doc.metadata(name) else {
        return default.to_string();
    };

    let resolved = Url::parse(doc.url())
        .and_then(|base| base.join(&meta))
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(&meta)));
    match resolved {
        Ok(url) => url.path().to_string(),
        Err(e) => {
            tracing::warn!("ignoring {name} metadata {meta:?}: {e}");
            default.to_string()
        }
    }
}

/// Load the fragment at `path` into a detached `<main>` element.
///
/// Paths must be site-absolute; anything else, or a non-2xx response,
/// yields `None`. Transport failures are errors.
pub async fn load_fragment(
    fetcher: &dyn ResourceFetcher,
    doc: &SharedDocument,
    path: &str,
) -> Result<Option<NodeId>, HeaderError> {
    if !path.starts_with('/') {
        tracing::debug!("fragment path {path:?} is not site-absolute");
        return Ok(None);
    }
    let base = path
        .strip_suffix(".plain.html")
        .or_else(|| path.strip_suffix(".html"))
        .unwrap_or(path);
    let url = format!("{base}.plain.html");

    let response = fetcher.fetch(Request::get(&url)).await?;
    if !response.is_success() {
        tracing::debug!("fragment {url} returned {}", response.status);
        return Ok(None);
    }
    let html = response.text()?;

    let mut doc = doc.borrow_mut();
    let main = doc.create_element("main");
    let count = HtmlParser::new().parse_into(&mut doc, main, &html);
    tracing::debug!("fragment {url}: {count} top-level nodes");
    Ok(Some(main))
}
