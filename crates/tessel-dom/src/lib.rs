//! Tessel DOM - host document tree
//!
//! Arena-allocated document model that the mutation interpreter edits.
//! Nodes are addressed by [`NodeRef`], the host-native handle to a node;
//! detached nodes stay addressable until they are freed explicitly.

mod node;
mod tree;
mod document;
mod error;
mod validate;
mod listeners;
mod serialize;
pub mod events;
pub mod forms;

pub use node::{Node, NodeData, ElementData, ElementKind, Attribute, TextData, Property, ControlState};
pub use tree::{DomTree, Children, Descendants};
pub use document::Document;
pub use error::{DomError, DomResult};
pub use validate::{validate_name, validate_and_extract, QualifiedName, XML_NS, XMLNS_NS, HTML_NS, SVG_NS};
pub use listeners::{HandlerId, EventListener, ListenerOptions, ListenerRegistry};
pub use events::{NativeEvent, EventDetail, EventPhase};
pub use forms::{FormData, FormDataValue, FileEntry};

/// Host-side node handle: arena index plus the generation of the cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef {
    index: u32,
    generation: u32,
}

impl NodeRef {
    /// The document node
    pub const DOCUMENT: NodeRef = NodeRef::new(0, 0);
    /// Sentinel for "no node"
    pub const NONE: NodeRef = NodeRef::new(u32::MAX, 0);

    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Check if this handle points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self.index != Self::NONE.index
    }

    /// Raw index
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the arena cell this handle was issued for
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}
