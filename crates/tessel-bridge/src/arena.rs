//! Node Arena
//!
//! Maps compute-module [`NodeId`]s to live document nodes. This is the only
//! way the interpreter and the event layer name a node. A reverse map lets
//! event resolution go from a host node back to its id.

use std::collections::HashMap;

use tessel_dom::{Document, NodeRef};

use crate::NodeId;

/// Text of the comment node that stands in for an empty slot
pub(crate) const PLACEHOLDER_TEXT: &str = "placeholder";

/// Arena errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("node id {0} is not bound")]
    NotFound(NodeId),
}

/// Exclusive binding of one id to one node
#[derive(Debug, PartialEq, Eq)]
pub struct NodeHandle {
    id: NodeId,
    node: NodeRef,
}

impl NodeHandle {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> NodeRef {
        self.node
    }
}

/// Id-indexed registry of node handles
#[derive(Debug, Default)]
pub struct NodeArena {
    handles: HashMap<NodeId, NodeHandle>,
    reverse: HashMap<NodeRef, NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty placeholder node and bind it to `id`.
    ///
    /// An occupied id is released first.
    pub fn create(&mut self, doc: &mut Document, id: NodeId) -> NodeRef {
        let node = doc.tree_mut().create_comment(PLACEHOLDER_TEXT);
        self.set(id, node);
        node
    }

    /// Bind an existing node to `id`.
    ///
    /// Whatever `id` held is released, and so is any other id `node` was
    /// bound to, so both directions stay one-to-one.
    pub fn set(&mut self, id: NodeId, node: NodeRef) {
        if let Some(previous) = self.reverse.get(&node).copied() {
            if previous == id {
                return;
            }
            tracing::debug!(%previous, %id, "node rebound to a new id");
            self.release(previous);
        }
        if let Some(old) = self.release(id) {
            tracing::debug!(%id, ?old, "id reassigned, previous node released");
        }

        self.handles.insert(id, NodeHandle { id, node });
        self.reverse.insert(node, id);
    }

    /// Node bound to `id`
    pub fn get(&self, id: NodeId) -> Result<NodeRef, ArenaError> {
        self.handles.get(&id)
            .map(NodeHandle::node)
            .ok_or(ArenaError::NotFound(id))
    }

    /// Drop the handle for `id`, returning the node it pointed at
    pub fn release(&mut self, id: NodeId) -> Option<NodeRef> {
        let handle = self.handles.remove(&id)?;
        self.reverse.remove(&handle.node);
        Some(handle.node)
    }

    /// Id a node is bound to
    pub fn lookup(&self, node: NodeRef) -> Option<NodeId> {
        self.reverse.get(&node).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_ok()
    }

    /// Number of live handles
    pub fn live_count(&self) -> usize {
        self.reverse.len()
    }

    /// Live handles, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &NodeHandle> {
        self.handles.values()
    }

    /// Release everything
    pub fn clear(&mut self) {
        self.handles.clear();
        self.reverse.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let mut doc = Document::new();
        let mut arena = NodeArena::new();
        let node = arena.create(&mut doc, NodeId(5));

        assert_eq!(arena.get(NodeId(5)), Ok(node));
        assert_eq!(arena.get(NodeId(4)), Err(ArenaError::NotFound(NodeId(4))));
        assert!(matches!(
            &doc.tree().node(node).unwrap().data,
            tessel_dom::NodeData::Comment(text) if text == PLACEHOLDER_TEXT
        ));
        assert_eq!(arena.lookup(node), Some(NodeId(5)));
    }

    #[test]
    fn test_create_on_occupied_id_replaces() {
        let mut doc = Document::new();
        let mut arena = NodeArena::new();
        let first = arena.create(&mut doc, NodeId(1));
        let second = arena.create(&mut doc, NodeId(1));

        assert_ne!(first, second);
        assert_eq!(arena.get(NodeId(1)), Ok(second));
        assert_eq!(arena.lookup(first), None);
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    fn test_rebinding_node_releases_old_id() {
        let doc = Document::new();
        let mut arena = NodeArena::new();
        let body = doc.body();
        arena.set(NodeId(2), body);
        arena.set(NodeId(7), body);

        assert!(!arena.contains(NodeId(2)));
        assert_eq!(arena.lookup(body), Some(NodeId(7)));
        assert_eq!(arena.iter().count(), 1);
    }

    #[test]
    fn test_sparse_ids() {
        let mut doc = Document::new();
        let mut arena = NodeArena::new();
        let high = arena.create(&mut doc, NodeId(u32::MAX - 1));
        let low = arena.create(&mut doc, NodeId(1));

        assert_eq!(arena.get(NodeId(u32::MAX - 1)), Ok(high));
        assert_eq!(arena.get(NodeId(1)), Ok(low));
        assert_eq!(arena.live_count(), 2);
        assert_eq!(arena.release(NodeId(u32::MAX - 1)), Some(high));
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    fn test_release_allows_reuse() {
        let mut doc = Document::new();
        let mut arena = NodeArena::new();
        let node = arena.create(&mut doc, NodeId(3));

        assert_eq!(arena.release(NodeId(3)), Some(node));
        assert_eq!(arena.release(NodeId(3)), None);
        assert_eq!(arena.lookup(node), None);

        let body = doc.body();
        arena.set(NodeId(3), body);
        assert_eq!(arena.get(NodeId(3)), Ok(body));
    }
}
