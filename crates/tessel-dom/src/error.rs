//! DOM operation errors

use crate::NodeRef;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors (named after the host exceptions they mirror)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node handle does not exist
    #[error("node {0:?} not found")]
    NotFound(NodeRef),

    /// Hierarchy error (e.g., inserting an ancestor, children under text)
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(&'static str),

    /// Reference node is not a child of the parent
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeRef, child: NodeRef },

    /// No connected element carries this `id` attribute
    #[error("no element with id {0:?}")]
    IdNotFound(String),

    /// Invalid name for an element or attribute
    #[error("invalid character in name {0:?}")]
    InvalidCharacter(String),

    /// Namespace and prefix do not agree
    #[error("namespace error for {name:?} in {namespace:?}")]
    Namespace { name: String, namespace: Option<String> },

    /// Operation needs an element
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeRef),

    /// FormData construction on something that is not a form
    #[error("node {0:?} is not a form element")]
    NotAForm(NodeRef),

    /// Property the host cannot assign directly
    #[error("property {0} is not supported here")]
    NotSupported(&'static str),
}
