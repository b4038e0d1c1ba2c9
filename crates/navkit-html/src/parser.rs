//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it to the navkit arena DOM.
//! Whitespace-only text nodes are dropped during conversion, so
//! `children`/`textContent` see only authored content.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use navkit_dom::{Document, DomTree, NodeId};

/// HTML5 parser
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a document URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
        let mut document = Document::new(url);
        let (head, body) = (document.head(), document.body());

        if let Some(html_el) = find_child(&dom.document, "html") {
            if let Some(src) = find_child(&html_el, "head") {
                self.convert_children(&src, document.tree_mut(), head);
            }
            if let Some(src) = find_child(&html_el, "body") {
                self.convert_children(&src, document.tree_mut(), body);
            }
        }

        tracing::debug!("Parsed {} nodes", document.tree().len());
        document
    }

    /// Parse an HTML fragment and append its body content to `container`.
    ///
    /// Returns the number of top-level nodes appended.
    pub fn parse_into(&self, tree: &mut DomTree, container: NodeId, html: &str) -> usize {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
        let before = tree.children(container).count();

        if let Some(body) = find_child(&dom.document, "html").and_then(|h| find_child(&h, "body")) {
            self.convert_children(&body, tree, container);
        }

        tree.children(container).count() - before
    }

    fn convert_children(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) {
        for child in handle.children.borrow().iter() {
            self.convert_node(child, tree, parent);
        }
    }

    /// Convert an RcDom node to our DOM format
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) {
        match &handle.data {
            RcNodeData::Document => self.convert_children(handle, tree, parent),
            RcNodeData::Text { contents } => {
                let text = contents.borrow();
                if !text.trim().is_empty() {
                    let id = tree.create_text(&text);
                    attach(tree, parent, id);
                }
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(contents);
                attach(tree, parent, id);
            }
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    tree.set_attribute(id, &attr.name.local, &*attr.value);
                }
                attach(tree, parent, id);
                self.convert_children(handle, tree, id);
            }
            RcNodeData::Doctype { .. } | RcNodeData::ProcessingInstruction { .. } => {}
        }
    }
}

fn attach(tree: &mut DomTree, parent: NodeId, child: NodeId) {
    if let Err(e) = tree.append_child(parent, child) {
        tracing::warn!("dropping parsed node: {e}");
    }
}

fn find_child(handle: &Handle, tag: &str) -> Option<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .find(|c| matches!(&c.data, RcNodeData::Element { name, .. } if &*name.local == tag))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
        let doc = HtmlParser::new().parse(html);

        assert!(doc.query_selector(doc.head(), "title").is_some());
        let p = doc.query_selector(doc.body(), "p").unwrap();
        assert_eq!(doc.text_content(p), "Hello");
    }

    #[test]
    fn test_parse_into_container() {
        let mut tree = DomTree::new();
        let main = tree.create_element("main");
        let count = HtmlParser::new().parse_into(&mut tree, main, "<div>one</div>\n<div>two</div>");

        assert_eq!(count, 2);
        assert_eq!(tree.element_children(main).len(), 2);
        assert_eq!(tree.text_content(main), "onetwo");
    }

    #[test]
    fn test_attributes_survive() {
        let mut tree = DomTree::new();
        let main = tree.create_element("main");
        HtmlParser::new().parse_into(
            &mut tree,
            main,
            r#"<p><span class="icon icon-search"></span><a href="/x" title="T">go</a></p>"#,
        );

        let span = tree.query_selector(main, "span.icon-search").unwrap();
        assert!(tree.has_class(span, "icon"));
        let a = tree.query_selector(main, "a[href]").unwrap();
        assert_eq!(tree.get_attribute(a, "title"), Some("T"));
    }
}
