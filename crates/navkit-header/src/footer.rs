//! Footer decoration
//!
//! Same fragment pattern as the header, without any interactive state:
//! the footer fragment is moved into the block and icon images are
//! inlined as SVG so they can be styled.

use navkit_dom::NodeId;
use navkit_html::HtmlParser;
use navkit_net::ResourceFetcher;

use crate::config::HeaderConfig;
use crate::fragment::{load_fragment, metadata_path};
use crate::{HeaderError, SharedDocument};

/// Load the footer fragment into `block`. Returns the footer container.
pub async fn decorate_footer(
    doc: &SharedDocument,
    block: NodeId,
    fetcher: &dyn ResourceFetcher,
    config: &HeaderConfig,
) -> Result<NodeId, HeaderError> {
    let path = metadata_path(&doc.borrow(), "footer", &config.footer_path);
    let fragment = load_fragment(fetcher, doc, &path).await?;
    let Some(fragment) = fragment else {
        return Err(HeaderError::MissingFragment(path));
    };

    let (footer, icons) = {
        let mut doc = doc.borrow_mut();
        doc.remove_children(block);
        let footer = doc.create_element("div");
        for child in doc.element_children(fragment) {
            doc.append_child(footer, child)?;
        }
        doc.append_child(block, footer)?;
        let icons = doc.query_selector_all(footer, ".icon img[src]");
        (footer, icons)
    };

    for img in icons {
        inline_icon(doc, img, fetcher).await;
    }
    Ok(footer)
}

/// Replace an `<img>` with the `<svg>` its `src` points at. Failures keep the image.
async fn inline_icon(doc: &SharedDocument, img: NodeId, fetcher: &dyn ResourceFetcher) {
    let Some(src) = doc.borrow().get_attribute(img, "src").map(str::to_string) else {
        return;
    };
    let markup = match fetcher.fetch_ok(&src).await.and_then(|r| r.text()) {
        Ok(markup) => markup,
        Err(e) => {
            tracing::warn!("footer icon {src} not inlined: {e}");
            return;
        }
    };

    let mut doc = doc.borrow_mut();
    let temp = doc.create_element("div");
    HtmlParser::new().parse_into(&mut doc, temp, &markup);
    let Some(svg) = doc.query_selector(temp, "svg") else {
        tracing::warn!("footer icon {src} has no <svg>");
        return;
    };
    if let Err(e) = doc.replace_with(img, svg) {
        tracing::warn!("footer icon {src} not inlined: {e}");
    }
}
