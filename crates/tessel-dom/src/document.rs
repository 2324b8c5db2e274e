//! Document - High-level document API

use crate::{
    DomTree, DomError, DomResult, NodeRef, Property, HandlerId,
    ListenerOptions, ListenerRegistry, NativeEvent, EventPhase,
};

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    tree: DomTree,
    /// Installed event listeners
    listeners: ListenerRegistry,
    /// Cached reference to <html> element
    html_element: NodeRef,
    /// Cached reference to <head> element
    head_element: NodeRef,
    /// Cached reference to <body> element
    body_element: NodeRef,
}

impl Document {
    /// Create a document with an html/head/body skeleton
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Freshly created nodes under the document cannot violate hierarchy rules
        let root = tree.root();
        let linked = tree.append_child(root, html)
            .and_then(|_| tree.append_child(html, head))
            .and_then(|_| tree.append_child(html, body));
        debug_assert!(linked.is_ok());

        Self {
            tree,
            listeners: ListenerRegistry::new(),
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Create an empty document (no structure)
    pub fn empty() -> Self {
        Self {
            tree: DomTree::new(),
            listeners: ListenerRegistry::new(),
            html_element: NodeRef::NONE,
            head_element: NodeRef::NONE,
            body_element: NodeRef::NONE,
        }
    }

    /// Locate the html/head/body elements after a parser filled the tree
    pub fn finalize(&mut self) {
        let find = |tree: &DomTree, parent: NodeRef, tag: &str| {
            tree.children(parent).find(|&n| {
                tree.get(n)
                    .and_then(|node| node.as_element())
                    .is_some_and(|e| e.namespace.is_none() && e.local_name == tag)
            })
        };
        let html = find(&self.tree, self.tree.root(), "html");
        self.html_element = html.unwrap_or(NodeRef::NONE);
        if let Some(html) = html {
            self.head_element = find(&self.tree, html, "head").unwrap_or(NodeRef::NONE);
            self.body_element = find(&self.tree, html, "body").unwrap_or(NodeRef::NONE);
        }
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeRef {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeRef {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeRef {
        self.body_element
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Access installed listeners
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Get connected element by `id` attribute
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeRef> {
        if id.is_empty() {
            return None;
        }
        self.tree.descendants(self.tree.root())
            .find(|&n| self.tree.attribute(n, "id") == Some(id))
    }

    /// Assign a DOM property directly.
    ///
    /// `innerHTML` needs an HTML parser and is handled by the caller.
    pub fn set_property(&mut self, node: NodeRef, property: Property, value: &str) -> DomResult<()> {
        match property {
            Property::ClassName => self.tree.set_attribute(node, "class", value),
            Property::TextContent => self.tree.set_text_content(node, value),
            Property::Value => self.set_value(node, value),
            Property::Checked => {
                let checked = !matches!(value, "" | "false" | "0");
                self.set_checked(node, checked)
            }
            Property::InnerHtml => Err(DomError::NotSupported("innerHTML")),
        }
    }

    /// Replace all children of a node with already created nodes
    pub fn replace_children(&mut self, node: NodeRef, children: &[NodeRef]) -> DomResult<()> {
        if !self.tree.node(node)?.is_container() {
            return Err(DomError::HierarchyRequest("node cannot have children"));
        }
        self.tree.clear_children(node)?;
        for &child in children {
            self.tree.append_child(node, child)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Install a listener; false if an identical one exists
    pub fn add_event_listener(&mut self, target: NodeRef, event_type: &str, handler: HandlerId, options: ListenerOptions) -> DomResult<bool> {
        self.tree.node(target)?;
        Ok(self.listeners.add(target, event_type, handler, options))
    }

    /// Remove a listener; false if none matched
    pub fn remove_event_listener(&mut self, target: NodeRef, event_type: &str, handler: HandlerId, capture: bool) -> DomResult<bool> {
        self.tree.node(target)?;
        Ok(self.listeners.remove(target, event_type, handler, capture))
    }

    /// Remove and return every listener on a node
    pub fn take_event_listeners(&mut self, target: NodeRef) -> Vec<(String, crate::EventListener)> {
        self.listeners.take_all(target)
    }

    /// Detach a subtree and free its nodes, dropping any listeners still on
    /// them. Returns how many nodes were freed.
    pub fn free_subtree(&mut self, root: NodeRef) -> DomResult<usize> {
        let freed = self.tree.free_subtree(root)?;
        for &node in &freed {
            self.listeners.take_all(node);
        }
        Ok(freed.len())
    }

    /// Dispatch an event through capture, target and bubble phases.
    ///
    /// `invoke` is called for each matching listener in order. Returns false
    /// when a listener prevented the default action.
    pub fn dispatch_event<F>(&mut self, event: &mut NativeEvent, mut invoke: F) -> DomResult<bool>
    where
        F: FnMut(&Document, HandlerId, &mut NativeEvent),
    {
        let target = event.target;
        self.tree.node(target)?;
        let path: Vec<NodeRef> = self.tree.ancestors(target).collect();
        tracing::trace!(event = %event.event_type, ?target, depth = path.len(), "dispatch");

        // Capture: outermost ancestor down to the target
        for &node in path.iter().rev() {
            event.phase = if node == target { EventPhase::AtTarget } else { EventPhase::Capturing };
            self.invoke_listeners(node, event, true, &mut invoke);
            if event.is_propagation_stopped() {
                return Ok(self.finish(event));
            }
        }

        // Bubble: target back up to the outermost ancestor
        for (depth, &node) in path.iter().enumerate() {
            if depth > 0 && !event.bubbles {
                break;
            }
            event.phase = if node == target { EventPhase::AtTarget } else { EventPhase::Bubbling };
            self.invoke_listeners(node, event, false, &mut invoke);
            if event.is_propagation_stopped() {
                break;
            }
        }
        Ok(self.finish(event))
    }

    fn invoke_listeners<F>(&mut self, node: NodeRef, event: &mut NativeEvent, capture: bool, invoke: &mut F)
    where
        F: FnMut(&Document, HandlerId, &mut NativeEvent),
    {
        let listeners = self.listeners.get(node, &event.event_type);
        event.current_target = node;
        for listener in listeners.into_iter().filter(|l| l.capture == capture) {
            if listener.once {
                self.listeners.remove(node, &event.event_type, listener.handler_id, capture);
            }
            invoke(&*self, listener.handler_id, event);
            if event.is_immediate_propagation_stopped() {
                break;
            }
        }
    }

    fn finish(&self, event: &mut NativeEvent) -> bool {
        event.phase = EventPhase::None;
        event.current_target = NodeRef::NONE;
        !event.is_default_prevented()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
