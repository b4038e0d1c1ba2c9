//! navkit DOM - Document Object Model
//!
//! Arena-allocated DOM tree the navigation widgets decorate.
//! Nodes are addressed by [`NodeId`] and never move once created.

mod attributes;
mod dataset;
mod document;
mod node;
mod observer;
mod selector;
mod serialize;
mod tree;

pub use attributes::{Attr, NamedNodeMap};
pub use dataset::{to_camel_case, to_kebab_case};
pub use document::Document;
pub use node::{ElementData, Node, NodeData};
pub use observer::MutationRecord;
pub use selector::{Compound, SelectorList};
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this ID points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Convert the sentinel into `None`
    #[inline]
    pub fn get(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }

    /// Raw arena index
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found
    #[error("Node not found")]
    NotFound,

    /// Hierarchy error (e.g., inserting an ancestor into its descendant)
    #[error("Hierarchy request error")]
    HierarchyRequest,

    /// Selector could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}
