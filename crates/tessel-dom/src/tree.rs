//! DOM Tree (arena-based allocation)
//!
//! Structural edits keep the first-child/next-sibling links consistent at
//! every step; callers may walk the tree between any two operations.
//!
//! Freed cells go on a free list and are reused. Every reuse bumps the
//! cell's generation, so a [`NodeRef`] to a freed node stops resolving
//! instead of aliasing whatever took its place.

use std::collections::HashMap;

use crate::{
    Node, NodeData, NodeRef, ElementData, Attribute, DomError, DomResult,
    validate_and_extract, HTML_NS,
};

/// One arena cell
#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-based DOM tree
#[derive(Debug, Clone)]
pub struct DomTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            slots: vec![Slot { generation: 0, node: Some(Node::document()) }],
            free: Vec::new(),
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeRef {
        NodeRef::DOCUMENT
    }

    /// Get a node by handle
    pub fn get(&self, id: NodeRef) -> Option<&Node> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    /// Get a mutable node by handle
    pub fn get_mut(&mut self, id: NodeRef) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    /// Get a node or fail with NotFound
    pub fn node(&self, id: NodeRef) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeRef) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    /// Element data or NotAnElement
    pub fn element(&self, id: NodeRef) -> DomResult<&ElementData> {
        self.node(id)?.as_element().ok_or(DomError::NotAnElement(id))
    }

    /// Mutable element data or NotAnElement
    pub fn element_mut(&mut self, id: NodeRef) -> DomResult<&mut ElementData> {
        self.node_mut(id)?.as_element_mut().ok_or(DomError::NotAnElement(id))
    }

    /// Number of live nodes, attached or not
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Check if tree holds only the document node
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Allocated cells, live or free
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn push(&mut self, node: Node) -> NodeRef {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeRef::new(index, slot.generation);
        }
        // Cells are reused, so the index only grows with the live count;
        // the allocator gives out long before it could reach the sentinel.
        let index = self.slots.len() as u32;
        debug_assert!(index != NodeRef::NONE.index());
        self.slots.push(Slot { generation: 0, node: Some(node) });
        NodeRef::new(index, 0)
    }

    /// Apply `f` to a node reached through a link
    fn update(&mut self, id: NodeRef, f: impl FnOnce(&mut Node)) {
        if let Some(node) = self.get_mut(id) {
            f(node);
        }
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create an HTML element (tag is lowercased)
    pub fn create_element(&mut self, tag: &str) -> NodeRef {
        let local = tag.to_ascii_lowercase();
        self.push(Node::element(ElementData::new(&local, None, None)))
    }

    /// Create an element in a namespace, validating the qualified name
    pub fn create_element_ns(&mut self, namespace: Option<&str>, qualified_name: &str) -> DomResult<NodeRef> {
        let name = validate_and_extract(namespace, qualified_name)?;
        if name.namespace.as_deref() == Some(HTML_NS) && name.prefix.is_none() {
            return Ok(self.create_element(&name.local_name));
        }
        let data = ElementData::new(&name.local_name, name.prefix, name.namespace);
        Ok(self.push(Node::element(data)))
    }

    /// Create a text node
    pub fn create_text(&mut self, text: &str) -> NodeRef {
        self.push(Node::text(text.to_string()))
    }

    /// Create a comment node
    pub fn create_comment(&mut self, text: &str) -> NodeRef {
        self.push(Node::comment(text.to_string()))
    }

    /// Insert a fully built node (used by parsers)
    pub fn insert_node(&mut self, mut node: Node) -> NodeRef {
        node.parent = NodeRef::NONE;
        node.first_child = NodeRef::NONE;
        node.last_child = NodeRef::NONE;
        node.prev_sibling = NodeRef::NONE;
        node.next_sibling = NodeRef::NONE;
        self.push(node)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Parent of a node (None if detached)
    pub fn parent(&self, id: NodeRef) -> Option<NodeRef> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// First child
    pub fn first_child(&self, id: NodeRef) -> Option<NodeRef> {
        self.get(id).map(|n| n.first_child).filter(|c| c.is_valid())
    }

    /// Next sibling
    pub fn next_sibling(&self, id: NodeRef) -> Option<NodeRef> {
        self.get(id).map(|n| n.next_sibling).filter(|c| c.is_valid())
    }

    /// Iterate over direct children
    pub fn children(&self, id: NodeRef) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id).unwrap_or(NodeRef::NONE),
        }
    }

    /// Pre-order walk of `id` and everything below it
    pub fn descendants(&self, id: NodeRef) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            next: if self.get(id).is_some() { id } else { NodeRef::NONE },
        }
    }

    /// Walk from `id` up to the topmost ancestor (inclusive)
    pub fn ancestors(&self, id: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        std::iter::successors(self.get(id).map(|_| id), move |&n| self.parent(n))
    }

    /// Is `ancestor` equal to `node` or one of its ancestors?
    pub fn is_inclusive_ancestor(&self, ancestor: NodeRef, node: NodeRef) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    /// Is the node connected to the document?
    pub fn is_connected(&self, id: NodeRef) -> bool {
        self.ancestors(id).last() == Some(NodeRef::DOCUMENT)
    }

    /// Follow a child-index path from `root`
    pub fn child_at_path(&self, root: NodeRef, path: &[usize]) -> Option<NodeRef> {
        path.iter().try_fold(root, |node, &index| self.children(node).nth(index))
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    fn ensure_pre_insertion_validity(&self, parent: NodeRef, child: NodeRef) -> DomResult<()> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;
        if !parent_node.is_container() {
            return Err(DomError::HierarchyRequest("parent cannot have children"));
        }
        if matches!(child_node.data, NodeData::Document) {
            return Err(DomError::HierarchyRequest("document cannot be inserted"));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest("node is an ancestor of the parent"));
        }
        if matches!(parent_node.data, NodeData::Document) && child_node.is_text() {
            return Err(DomError::HierarchyRequest("text cannot be a document child"));
        }
        Ok(())
    }

    /// Unlink a node from its parent; no-op when detached
    pub fn detach(&mut self, id: NodeRef) -> DomResult<()> {
        let (parent, prev, next) = {
            let node = self.node(id)?;
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return Ok(());
        }
        if prev.is_valid() {
            self.update(prev, |n| n.next_sibling = next);
        } else {
            self.update(parent, |n| n.first_child = next);
        }
        if next.is_valid() {
            self.update(next, |n| n.prev_sibling = prev);
        } else {
            self.update(parent, |n| n.last_child = prev);
        }
        self.update(id, |n| {
            n.parent = NodeRef::NONE;
            n.prev_sibling = NodeRef::NONE;
            n.next_sibling = NodeRef::NONE;
        });
        Ok(())
    }

    /// Link a detached node under `parent` before `before` (NONE appends)
    fn link(&mut self, parent: NodeRef, child: NodeRef, before: NodeRef) {
        let anchor = if before.is_valid() { before } else { parent };
        let prev = self.get(anchor).map_or(NodeRef::NONE, |n| {
            if before.is_valid() { n.prev_sibling } else { n.last_child }
        });
        self.update(child, |n| {
            n.parent = parent;
            n.prev_sibling = prev;
            n.next_sibling = before;
        });
        if prev.is_valid() {
            self.update(prev, |n| n.next_sibling = child);
        } else {
            self.update(parent, |n| n.first_child = child);
        }
        if before.is_valid() {
            self.update(before, |n| n.prev_sibling = child);
        } else {
            self.update(parent, |n| n.last_child = child);
        }
    }

    /// Append a child node, moving it from its old position
    pub fn append_child(&mut self, parent: NodeRef, child: NodeRef) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (None appends)
    pub fn insert_before(&mut self, parent: NodeRef, child: NodeRef, reference: Option<NodeRef>) -> DomResult<()> {
        self.ensure_pre_insertion_validity(parent, child)?;
        let mut before = reference.unwrap_or(NodeRef::NONE);
        if before.is_valid() && self.node(before)?.parent != parent {
            return Err(DomError::NotAChild { parent, child: before });
        }
        if before == child {
            before = self.node(child)?.next_sibling;
        }
        self.detach(child)?;
        self.link(parent, child, before);
        Ok(())
    }

    /// Remove a child from a specific parent
    pub fn remove_child(&mut self, parent: NodeRef, child: NodeRef) -> DomResult<()> {
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child)
    }

    /// Insert nodes after `reference` in order; no-op when reference is detached
    pub fn insert_after(&mut self, reference: NodeRef, nodes: &[NodeRef]) -> DomResult<()> {
        let Some(parent) = self.parent(reference) else {
            self.node(reference)?;
            return Ok(());
        };
        let mut anchor = self.next_sibling(reference);
        // The anchor must not be one of the nodes being moved
        while let Some(a) = anchor {
            if !nodes.contains(&a) {
                break;
            }
            anchor = self.next_sibling(a);
        }
        for &node in nodes {
            self.insert_before(parent, node, anchor)?;
        }
        Ok(())
    }

    /// Insert nodes before `reference` in order; no-op when reference is detached
    pub fn insert_all_before(&mut self, reference: NodeRef, nodes: &[NodeRef]) -> DomResult<()> {
        let Some(parent) = self.parent(reference) else {
            self.node(reference)?;
            return Ok(());
        };
        let mut anchor = Some(reference);
        while let Some(a) = anchor {
            if !nodes.contains(&a) {
                break;
            }
            anchor = self.next_sibling(a);
        }
        for &node in nodes {
            self.insert_before(parent, node, anchor)?;
        }
        Ok(())
    }

    /// Replace `old` with `nodes` (like `ChildNode.replaceWith`)
    pub fn replace_with(&mut self, old: NodeRef, nodes: &[NodeRef]) -> DomResult<()> {
        let Some(parent) = self.parent(old) else {
            self.node(old)?;
            return Ok(());
        };
        for &node in nodes {
            self.ensure_pre_insertion_validity(parent, node)?;
        }
        let mut anchor = self.next_sibling(old);
        while let Some(a) = anchor {
            if !nodes.contains(&a) {
                break;
            }
            anchor = self.next_sibling(a);
        }
        if !nodes.contains(&old) {
            self.detach(old)?;
        }
        for &node in nodes {
            self.insert_before(parent, node, anchor)?;
        }
        Ok(())
    }

    /// Detach every child of `parent`
    pub fn clear_children(&mut self, parent: NodeRef) -> DomResult<()> {
        while let Some(child) = self.first_child(parent) {
            self.detach(child)?;
        }
        Ok(())
    }

    /// Deep-clone a subtree; the copy is detached
    pub fn clone_subtree(&mut self, id: NodeRef) -> DomResult<NodeRef> {
        if matches!(self.node(id)?.data, NodeData::Document) {
            return Err(DomError::HierarchyRequest("document cannot be cloned"));
        }
        // Pre-order, so every parent is copied before its children and
        // children are appended in order
        let sources: Vec<NodeRef> = self.descendants(id).collect();
        let mut copies: HashMap<NodeRef, NodeRef> = HashMap::with_capacity(sources.len());
        for source in sources {
            let node = self.node(source)?.clone();
            let parent = node.parent;
            let copy = self.insert_node(node);
            if source != id {
                if let Some(&parent_copy) = copies.get(&parent) {
                    self.link(parent_copy, copy, NodeRef::NONE);
                }
            }
            copies.insert(source, copy);
        }
        copies.get(&id).copied().ok_or(DomError::NotFound(id))
    }

    /// Detach `id` and free it along with everything below it.
    ///
    /// Handles to freed nodes stop resolving. Returns the freed nodes in
    /// pre-order.
    pub fn free_subtree(&mut self, id: NodeRef) -> DomResult<Vec<NodeRef>> {
        if matches!(self.node(id)?.data, NodeData::Document) {
            return Err(DomError::HierarchyRequest("document cannot be freed"));
        }
        self.detach(id)?;
        let freed: Vec<NodeRef> = self.descendants(id).collect();
        for &node in &freed {
            let slot = &mut self.slots[node.index() as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index());
        }
        Ok(freed)
    }

    // ------------------------------------------------------------------
    // Attributes and text
    // ------------------------------------------------------------------

    /// Set a plain attribute
    pub fn set_attribute(&mut self, id: NodeRef, name: &str, value: &str) -> DomResult<()> {
        crate::validate_name(name)?;
        let elem = self.element_mut(id)?;
        let name = if elem.namespace.is_none() { name.to_ascii_lowercase() } else { name.to_string() };
        elem.set_attr(Attribute::new(&name, value));
        Ok(())
    }

    /// Set a namespaced attribute
    pub fn set_attribute_ns(&mut self, id: NodeRef, namespace: Option<&str>, qualified_name: &str, value: &str) -> DomResult<()> {
        let name = validate_and_extract(namespace, qualified_name)?;
        let elem = self.element_mut(id)?;
        elem.set_attr(Attribute {
            local_name: name.local_name,
            prefix: name.prefix,
            namespace: name.namespace,
            value: value.to_string(),
        });
        Ok(())
    }

    /// Remove an attribute; missing attributes are ignored
    pub fn remove_attribute(&mut self, id: NodeRef, namespace: Option<&str>, name: &str) -> DomResult<()> {
        let elem = self.element_mut(id)?;
        let local = match namespace {
            Some(_) => name.rsplit(':').next().unwrap_or(name).to_string(),
            None if elem.namespace.is_none() => name.to_ascii_lowercase(),
            None => name.to_string(),
        };
        elem.remove_attr(namespace.filter(|ns| !ns.is_empty()), &local);
        Ok(())
    }

    /// Toggle a boolean attribute; returns whether it is now present
    pub fn toggle_attribute(&mut self, id: NodeRef, name: &str, force: Option<bool>) -> DomResult<bool> {
        crate::validate_name(name)?;
        let present = self.element(id)?.has_attr(&name.to_ascii_lowercase());
        let want = force.unwrap_or(!present);
        if want && !present {
            self.set_attribute(id, name, "")?;
        } else if !want && present {
            self.remove_attribute(id, None, name)?;
        }
        Ok(want)
    }

    /// Get a plain attribute value
    pub fn attribute(&self, id: NodeRef, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    /// Set (or with an empty value, remove) an inline style property
    pub fn set_style(&mut self, id: NodeRef, property: &str, value: &str) -> DomResult<()> {
        let elem = self.element_mut(id)?;
        if value.is_empty() {
            elem.style.retain(|(name, _)| name != property);
            return Ok(());
        }
        match elem.style.iter_mut().find(|(name, _)| name == property) {
            Some((_, existing)) => *existing = value.to_string(),
            None => elem.style.push((property.to_string(), value.to_string())),
        }
        Ok(())
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeRef) -> String {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(t)) => t.content.clone(),
            Some(NodeData::Comment(c)) => c.clone(),
            _ => self.descendants(id)
                .filter_map(|n| self.get(n).and_then(Node::as_text))
                .collect(),
        }
    }

    /// Replace the content of a node with a single text child
    pub fn set_text_content(&mut self, id: NodeRef, text: &str) -> DomResult<()> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(t) => {
                t.content = text.to_string();
                return Ok(());
            }
            NodeData::Comment(c) => {
                *c = text.to_string();
                return Ok(());
            }
            NodeData::Document => return Ok(()),
            NodeData::Element(_) => {}
        }
        self.clear_children(id)?;
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.link(id, text_node, NodeRef::NONE);
        }
        Ok(())
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeRef,
}

impl Iterator for Children<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        self.next = self.tree.get(current).map(|n| n.next_sibling).unwrap_or(NodeRef::NONE);
        Some(current)
    }
}

/// Pre-order iterator bounded by a subtree root
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeRef,
    next: NodeRef,
}

impl Iterator for Descendants<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        let node = self.tree.get(current)?;
        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            // Climb until a sibling exists, never leaving the root
            let mut cursor = current;
            loop {
                if cursor == self.root {
                    break NodeRef::NONE;
                }
                let Some(n) = self.tree.get(cursor) else { break NodeRef::NONE };
                if n.next_sibling.is_valid() {
                    break n.next_sibling;
                }
                cursor = n.parent;
                if !cursor.is_valid() {
                    break NodeRef::NONE;
                }
            }
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_list(tree: &DomTree, parent: NodeRef) -> Vec<NodeRef> {
        tree.children(parent).collect()
    }

    #[test]
    fn test_append_and_order() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        tree.append_child(div, a).unwrap();
        tree.append_child(div, b).unwrap();

        assert_eq!(child_list(&tree, div), vec![a, b]);
        assert_eq!(tree.parent(a), Some(div));
        assert_eq!(tree.text_content(div), "ab");
    }

    #[test]
    fn test_insert_before_moves_node() {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul");
        let one = tree.create_element("li");
        let two = tree.create_element("li");
        let three = tree.create_element("li");
        for li in [one, two, three] {
            tree.append_child(ul, li).unwrap();
        }
        tree.insert_before(ul, three, Some(one)).unwrap();

        assert_eq!(child_list(&tree, ul), vec![three, one, two]);
        assert_eq!(tree.get(two).unwrap().last_child, NodeRef::NONE);
        assert_eq!(tree.get(ul).unwrap().last_child, two);
    }

    #[test]
    fn test_cannot_insert_ancestor() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        tree.append_child(outer, inner).unwrap();

        let err = tree.append_child(inner, outer).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest(_)));
    }

    #[test]
    fn test_text_cannot_have_children() {
        let mut tree = DomTree::new();
        let text = tree.create_text("x");
        let span = tree.create_element("span");
        assert!(tree.append_child(text, span).is_err());
    }

    #[test]
    fn test_replace_with_many() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let old = tree.create_comment("placeholder");
        let tail = tree.create_text("tail");
        tree.append_child(div, old).unwrap();
        tree.append_child(div, tail).unwrap();

        let a = tree.create_element("a");
        let b = tree.create_element("b");
        tree.replace_with(old, &[a, b]).unwrap();

        assert_eq!(child_list(&tree, div), vec![a, b, tail]);
        assert_eq!(tree.parent(old), None);
    }

    #[test]
    fn test_insert_after_last_child() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let first = tree.create_element("p");
        tree.append_child(div, first).unwrap();
        let x = tree.create_element("i");
        let y = tree.create_element("b");
        tree.insert_after(first, &[x, y]).unwrap();

        assert_eq!(child_list(&tree, div), vec![first, x, y]);
    }

    #[test]
    fn test_clone_subtree_is_detached_and_deep() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let span = tree.create_element("span");
        let text = tree.create_text("hi");
        tree.append_child(div, span).unwrap();
        tree.append_child(span, text).unwrap();

        let copy = tree.clone_subtree(div).unwrap();
        assert_ne!(copy, div);
        assert_eq!(tree.parent(copy), None);
        assert_eq!(tree.text_content(copy), "hi");
        let copied_span = tree.first_child(copy).unwrap();
        assert_ne!(copied_span, span);
    }

    #[test]
    fn test_clone_deep_chain() {
        let mut tree = DomTree::new();
        let mut top = tree.create_element("div");
        for _ in 0..100_000 {
            let parent = tree.create_element("div");
            tree.append_child(parent, top).unwrap();
            top = parent;
        }
        let copy = tree.clone_subtree(top).unwrap();
        assert_eq!(tree.descendants(copy).count(), 100_001);
    }

    #[test]
    fn test_free_subtree_reuses_cells() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let span = tree.create_element("span");
        let text = tree.create_text("x");
        tree.append_child(div, span).unwrap();
        tree.append_child(span, text).unwrap();
        let root = tree.root();
        tree.append_child(root, div).unwrap();
        let live = tree.len();

        assert_eq!(tree.free_subtree(span).unwrap(), vec![span, text]);
        assert_eq!(tree.len(), live - 2);
        assert_eq!(tree.first_child(div), None);
        assert!(tree.get(span).is_none());
        assert!(tree.get(text).is_none());

        // Cells come back with a new generation
        let capacity = tree.capacity();
        let p = tree.create_element("p");
        assert_eq!(tree.capacity(), capacity);
        assert_ne!(p, span);
        assert_ne!(p, text);
        assert!(tree.get(span).is_none() && tree.get(text).is_none());
        assert!(matches!(tree.node(text), Err(DomError::NotFound(_))));
    }

    #[test]
    fn test_document_cannot_be_freed() {
        let mut tree = DomTree::new();
        let root = tree.root();
        assert!(tree.free_subtree(root).is_err());
    }

    #[test]
    fn test_descendants_stay_in_subtree() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        let sibling = tree.create_element("d");
        let root = tree.create_element("div");
        tree.append_child(root, a).unwrap();
        tree.append_child(root, sibling).unwrap();
        tree.append_child(a, b).unwrap();
        tree.append_child(b, c).unwrap();

        let walked: Vec<NodeRef> = tree.descendants(a).collect();
        assert_eq!(walked, vec![a, b, c]);
    }

    #[test]
    fn test_toggle_attribute() {
        let mut tree = DomTree::new();
        let input = tree.create_element("input");
        assert!(tree.toggle_attribute(input, "disabled", None).unwrap());
        assert_eq!(tree.attribute(input, "disabled"), Some(""));
        assert!(!tree.toggle_attribute(input, "disabled", None).unwrap());
        assert!(tree.toggle_attribute(input, "hidden", Some(true)).unwrap());
        assert!(tree.toggle_attribute(input, "hidden", Some(true)).unwrap());
        assert_eq!(tree.attribute(input, "hidden"), Some(""));
    }

    #[test]
    fn test_style_set_and_remove() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.set_style(div, "color", "red").unwrap();
        tree.set_style(div, "margin", "0").unwrap();
        tree.set_style(div, "color", "blue").unwrap();
        assert_eq!(tree.element(div).unwrap().style_text().as_deref(), Some("color: blue; margin: 0;"));
        tree.set_style(div, "color", "").unwrap();
        assert_eq!(tree.element(div).unwrap().style_property("color"), None);
    }
}
