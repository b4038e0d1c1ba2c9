//! Element Query
//!
//! querySelector, querySelectorAll, closest and matches over a small
//! selector subset: type, `#id`, `.class`, `[attr]`, `[attr=value]`,
//! compounds of those, the descendant combinator and comma lists.

use std::iter::Peekable;
use std::str::Chars;

use crate::{DomError, DomResult, DomTree, NodeId};

/// One compound selector, e.g. `span.icon.icon-search` or `input[type="search"]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, Option<String>)>,
}

/// Parsed selector list (`ul, ol`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    /// Each entry is a chain of compounds joined by descendant combinators
    selectors: Vec<Vec<Compound>>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    ident
}

impl Compound {
    /// Parse a single compound selector
    pub fn parse(s: &str) -> DomResult<Self> {
        let invalid = || DomError::InvalidSelector(s.to_string());
        let mut compound = Compound::default();
        let mut chars = s.chars().peekable();

        if chars.peek() == Some(&'*') {
            chars.next();
        } else if chars.peek().is_some_and(|&c| is_ident_char(c)) {
            compound.tag = Some(take_ident(&mut chars).to_ascii_lowercase());
        }

        while let Some(c) = chars.next() {
            match c {
                '#' => {
                    let id = take_ident(&mut chars);
                    if id.is_empty() {
                        return Err(invalid());
                    }
                    compound.id = Some(id);
                }
                '.' => {
                    let class = take_ident(&mut chars);
                    if class.is_empty() {
                        return Err(invalid());
                    }
                    compound.classes.push(class);
                }
                '[' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) => body.push(c),
                            None => return Err(invalid()),
                        }
                    }
                    let attr = match body.split_once('=') {
                        Some((name, value)) => {
                            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                            (name.trim().to_string(), Some(value.to_string()))
                        }
                        None => (body.trim().to_string(), None),
                    };
                    if attr.0.is_empty() || !attr.0.chars().all(is_ident_char) {
                        return Err(invalid());
                    }
                    compound.attrs.push(attr);
                }
                _ => return Err(invalid()),
            }
        }

        Ok(compound)
    }

    /// Check a single element against this compound
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(elem) = tree.element(node) else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|t| t != elem.tag) {
            return false;
        }
        if self.id.as_deref().is_some_and(|id| elem.id() != Some(id)) {
            return false;
        }
        if !self.classes.iter().all(|c| elem.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, value)| {
            match (elem.attrs.get_attribute(name), value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            }
        })
    }
}

/// Split on whitespace that is not inside `[...]`
fn split_compounds(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if let Some(st) = start.take() {
                parts.push(&s[st..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        parts.push(&s[st..]);
    }
    parts
}

impl SelectorList {
    /// Parse a comma separated selector list
    pub fn parse(s: &str) -> DomResult<Self> {
        let mut selectors = Vec::new();
        for part in s.split(',') {
            let compounds = split_compounds(part)
                .into_iter()
                .map(Compound::parse)
                .collect::<DomResult<Vec<_>>>()?;
            if compounds.is_empty() {
                return Err(DomError::InvalidSelector(s.to_string()));
            }
            selectors.push(compounds);
        }
        Ok(Self { selectors })
    }

    /// Check an element against any selector in the list
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.selectors.iter().any(|chain| matches_chain(tree, node, chain))
    }
}

/// Right-to-left match with descendant combinators only
fn matches_chain(tree: &DomTree, node: NodeId, chain: &[Compound]) -> bool {
    let Some((last, rest)) = chain.split_last() else {
        return false;
    };
    if !last.matches(tree, node) {
        return false;
    }
    let mut ancestor = tree.parent(node);
    for compound in rest.iter().rev() {
        loop {
            let Some(a) = ancestor else { return false };
            ancestor = tree.parent(a);
            if compound.matches(tree, a) {
                break;
            }
        }
    }
    true
}

fn parse_or_log(selector: &str) -> Option<SelectorList> {
    match SelectorList::parse(selector) {
        Ok(list) => Some(list),
        Err(e) => {
            tracing::warn!("{e}");
            None
        }
    }
}

impl DomTree {
    /// First descendant of `root` matching `selector`
    pub fn query_selector(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        let list = parse_or_log(selector)?;
        self.descendants(root)
            .into_iter()
            .find(|&n| list.matches(self, n))
    }

    /// All descendants of `root` matching `selector`, in document order
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let Some(list) = parse_or_log(selector) else {
            return Vec::new();
        };
        self.descendants(root)
            .into_iter()
            .filter(|&n| list.matches(self, n))
            .collect()
    }

    /// Nearest inclusive ancestor matching `selector`
    pub fn closest(&self, node: NodeId, selector: &str) -> Option<NodeId> {
        let list = parse_or_log(selector)?;
        let mut current = Some(node);
        while let Some(id) = current {
            if list.matches(self, id) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// `element.matches(selector)`
    pub fn matches(&self, node: NodeId, selector: &str) -> bool {
        parse_or_log(selector).is_some_and(|list| list.matches(self, node))
    }

    /// Descendant of `root` with the given `id` attribute
    pub fn find_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&n| self.id_of(n) == Some(id))
    }
}
