//! navkit HTML Parser
//!
//! HTML5 parsing built on html5ever, producing navkit DOM nodes.

mod parser;

pub use navkit_dom::{Document, DomTree, NodeId};
pub use parser::HtmlParser;

/// Parse a full HTML document
pub fn parse(html: &str) -> Document {
    HtmlParser::new().parse(html)
}
