#![forbid(unsafe_code)]

//! Errors raised by tree mutations.

use crate::node::NodeId;

/// Errors from element-tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The inserted node is the parent itself or one of its ancestors.
    HierarchyRequest { parent: NodeId, child: NodeId },
}

impl std::fmt::Display for DomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HierarchyRequest { parent, child } => write!(
                f,
                "hierarchy request: node {child} cannot be inserted into its descendant {parent}"
            ),
        }
    }
}

impl std::error::Error for DomError {}
