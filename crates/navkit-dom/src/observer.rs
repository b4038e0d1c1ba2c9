//! Attribute mutation records
//!
//! A trimmed-down MutationObserver: when observation is enabled the tree
//! appends one record per attribute write, in the order the writes happen.

use crate::NodeId;

/// Mutation record for an attribute change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub attribute_name: String,
    pub old_value: Option<String>,
    /// `None` when the attribute was removed
    pub new_value: Option<String>,
}

impl MutationRecord {
    /// Check whether this record wrote `value` into `name` on `target`
    pub fn is(&self, target: NodeId, name: &str, value: &str) -> bool {
        self.target == target
            && self.attribute_name == name
            && self.new_value.as_deref() == Some(value)
    }
}
