//! Mutation Interpreter
//!
//! Applies decoded instructions to the document in stream order. There is
//! no rollback: the first failing instruction ends the pass and whatever ran
//! before it stays applied.
//!
//! Nodes the compute module can no longer reach are freed: removed and
//! replaced subtrees, old children of `innerHTML`/`textContent`, and
//! detached nodes whose last id went away.

use tessel_dom::{Document, DomError, HandlerId, ListenerOptions, NodeRef, Property};

use crate::codec::{EditReader, Instruction};
use crate::events::Handler;
use crate::{BridgeResult, CallbackId, CallbackTable, NodeArena, NodeId, TemplateCache};

/// Borrowed view of the runtime state one pass needs
pub(crate) struct Interpreter<'a> {
    pub doc: &'a mut Document,
    pub arena: &'a mut NodeArena,
    pub templates: &'a mut TemplateCache,
    pub callbacks: &'a mut CallbackTable,
}

impl Interpreter<'_> {
    /// Run every instruction in `reader`; returns how many were applied
    pub fn run(&mut self, reader: EditReader<'_>) -> BridgeResult<usize> {
        let mut applied = 0;
        for instruction in reader {
            let instruction = instruction?;
            tracing::trace!(opcode = instruction.opcode(), "apply");
            self.execute(instruction)?;
            applied += 1;
        }
        Ok(applied)
    }

    fn node(&self, id: NodeId) -> BridgeResult<NodeRef> {
        Ok(self.arena.get(id)?)
    }

    fn nodes(&self, ids: &[NodeId]) -> BridgeResult<Vec<NodeRef>> {
        ids.iter().map(|&id| self.node(id)).collect()
    }

    pub fn execute(&mut self, instruction: Instruction) -> BridgeResult<()> {
        match instruction {
            // Creation
            Instruction::CreateElement { id, tag, namespace } => {
                let tree = self.doc.tree_mut();
                let node = match namespace.as_deref() {
                    Some(ns) => tree.create_element_ns(Some(ns), &tag)?,
                    None => {
                        tessel_dom::validate_name(&tag)?;
                        tree.create_element(&tag)
                    }
                };
                self.bind(id, node)?;
            }
            Instruction::CreateText { id, text } => {
                let node = self.doc.tree_mut().create_text(&text);
                self.bind(id, node)?;
            }
            Instruction::CreatePlaceholder { id } => {
                let previous = self.arena.get(id).ok();
                self.arena.create(self.doc, id);
                if let Some(previous) = previous {
                    self.reclaim_if_orphaned(previous)?;
                }
            }
            Instruction::LoadTemplate { template, id, slots } => {
                let root = self.templates.instantiate(self.doc, self.arena, template, &slots)?;
                self.bind(id, root)?;
            }
            Instruction::SaveTemplate { template, nodes } => {
                self.templates.save(self.doc, template, nodes)?;
            }
            Instruction::BindElementById { id, dom_id } => {
                let node = self.doc.get_element_by_id(&dom_id).ok_or(DomError::IdNotFound(dom_id))?;
                self.bind(id, node)?;
            }

            // Attributes and properties
            Instruction::SetAttribute { id, name, value, namespace } => {
                let node = self.node(id)?;
                let tree = self.doc.tree_mut();
                match namespace.as_deref() {
                    Some(ns) => tree.set_attribute_ns(node, Some(ns), &name, &value)?,
                    None => tree.set_attribute(node, &name, &value)?,
                }
            }
            Instruction::RemoveAttribute { id, name, namespace } => {
                let node = self.node(id)?;
                self.doc.tree_mut().remove_attribute(node, namespace.as_deref(), &name)?;
            }
            Instruction::ToggleAttribute { id, name, force } => {
                let node = self.node(id)?;
                self.doc.tree_mut().toggle_attribute(node, &name, force)?;
            }
            Instruction::SetStyle { id, property, value } => {
                let node = self.node(id)?;
                self.doc.tree_mut().set_style(node, &property, &value)?;
            }
            Instruction::SetProperty { id, property, value } => {
                let node = self.node(id)?;
                self.set_property(node, property, &value)?;
            }

            // Tree edits
            Instruction::AppendChildren { parent, children } => {
                let parent = self.node(parent)?;
                for child in self.nodes(&children)? {
                    self.doc.tree_mut().append_child(parent, child)?;
                }
            }
            Instruction::InsertBefore { reference, nodes } => {
                let reference = self.node(reference)?;
                let nodes = self.nodes(&nodes)?;
                self.doc.tree_mut().insert_all_before(reference, &nodes)?;
            }
            Instruction::InsertAfter { reference, nodes } => {
                let reference = self.node(reference)?;
                let nodes = self.nodes(&nodes)?;
                self.doc.tree_mut().insert_after(reference, &nodes)?;
            }
            Instruction::Remove { id } => {
                let node = self.node(id)?;
                self.release_subtree(node)?;
            }
            Instruction::ReplaceWith { id, nodes } => {
                let old = self.node(id)?;
                let nodes = self.nodes(&nodes)?;
                // A detached `old` has no position to replace; it stays bound
                let replaced = self.doc.tree().parent(old).is_some();
                self.doc.tree_mut().replace_with(old, &nodes)?;
                if replaced && !nodes.contains(&old) {
                    self.release_subtree(old)?;
                }
            }
            Instruction::FreeId { id } => {
                if let Some(node) = self.arena.release(id) {
                    self.reclaim_if_orphaned(node)?;
                }
            }

            // Listeners
            Instruction::NewEventListener { id, name, callback, capture } => {
                let node = self.node(id)?;
                self.callbacks.check_attachable(callback)?;
                let options = ListenerOptions { capture, ..ListenerOptions::default() };
                if self.doc.add_event_listener(node, &name, callback.handler(), options)? {
                    self.callbacks.attach(callback)?;
                }
            }
            Instruction::RemoveEventListener { id, name, callback, capture } => {
                let node = self.node(id)?;
                let removed = self.doc.remove_event_listener(node, &name, callback.handler(), capture)?;
                if removed && self.callbacks.get(callback).is_some() {
                    self.callbacks.detach(callback)?;
                } else if removed {
                    tracing::trace!(?callback, "listener removed after its callback was released");
                }
            }
        }
        Ok(())
    }

    fn set_property(&mut self, node: NodeRef, property: Property, value: &str) -> BridgeResult<()> {
        match property {
            Property::InnerHtml => {
                let parsed = tessel_html::parse_fragment(self.doc, node, value)?;
                self.release_children(node)?;
                self.doc.replace_children(node, &parsed)?;
            }
            Property::TextContent => {
                self.release_children(node)?;
                self.doc.set_property(node, property, value)?;
            }
            _ => self.doc.set_property(node, property, value)?,
        }
        Ok(())
    }

    /// Bind `id`, freeing the node it held if nothing else reaches it
    fn bind(&mut self, id: NodeId, node: NodeRef) -> BridgeResult<()> {
        let previous = self.arena.get(id).ok().filter(|&p| p != node);
        self.arena.set(id, node);
        if let Some(previous) = previous {
            self.reclaim_if_orphaned(previous)?;
        }
        Ok(())
    }

    /// Free a detached subtree once no id inside it is bound
    fn reclaim_if_orphaned(&mut self, node: NodeRef) -> BridgeResult<()> {
        let tree = self.doc.tree();
        let orphaned = node != tree.root()
            && tree.get(node).is_some()
            && tree.parent(node).is_none()
            && tree.descendants(node).all(|n| self.arena.lookup(n).is_none());
        if orphaned {
            self.release_subtree(node)?;
        }
        Ok(())
    }

    fn release_children(&mut self, node: NodeRef) -> BridgeResult<()> {
        let children: Vec<NodeRef> = self.doc.tree().children(node).collect();
        for child in children {
            self.release_subtree(child)?;
        }
        Ok(())
    }

    /// Unbind every id and callback listener inside a subtree, then detach
    /// and free its nodes
    fn release_subtree(&mut self, root: NodeRef) -> BridgeResult<()> {
        let nodes: Vec<NodeRef> = self.doc.tree().descendants(root).collect();
        let mut released = 0;
        for node in nodes {
            if let Some(id) = self.arena.lookup(node) {
                self.arena.release(id);
                released += 1;
            }
            for (_, listener) in self.doc.take_event_listeners(node) {
                if let Some(callback) = callback_of(listener.handler_id) {
                    // Only counted attachments reach the host
                    if let Err(err) = self.callbacks.detach(callback) {
                        tracing::warn!(%err, "listener without a live callback");
                    }
                }
            }
        }
        let freed = self.doc.free_subtree(root)?;
        tracing::trace!(?root, released, freed, "subtree released");
        Ok(())
    }
}

fn callback_of(handler: HandlerId) -> Option<CallbackId> {
    match Handler::decode(handler) {
        Handler::Callback(id) => Some(id),
        Handler::Delegate => None,
    }
}
