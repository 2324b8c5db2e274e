//! Template Cache
//!
//! Static subtree shapes are built once, kept detached, and deep-cloned on
//! every use. Only the dynamic positions (slots) of a clone are registered
//! in the arena, in the same pre-order they were discovered at save time.

use std::collections::HashMap;

use tessel_dom::{Document, NodeRef};

use crate::arena::{NodeArena, PLACEHOLDER_TEXT};
use crate::{BridgeResult, NodeId};

/// Template errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template {0} is not defined")]
    Unknown(u32),

    #[error("template must have exactly one root, found {0}")]
    RootCount(usize),

    #[error("descriptor list ends at {index} while children are still expected")]
    Malformed { index: usize },

    #[error("template {template} has {expected} slots but {found} ids were supplied")]
    SlotCount { template: u32, expected: usize, found: usize },
}

/// Attribute on a template element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAttribute {
    pub name: String,
    pub value: String,
    pub namespace: Option<String>,
}

/// One entry of a flat pre-order template description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    Element {
        tag: String,
        namespace: Option<String>,
        attrs: Vec<TemplateAttribute>,
        /// Number of descriptors that follow as direct children
        child_count: u32,
        /// Register this element itself on instantiation
        slot: bool,
    },
    /// Static text
    Text(String),
    /// Empty text node filled in after instantiation
    DynamicText,
    /// Empty placeholder filled in after instantiation
    Placeholder,
}

impl TemplateNode {
    /// Plain element with `child_count` children following it
    pub fn element(tag: &str, child_count: u32) -> Self {
        TemplateNode::Element {
            tag: tag.to_string(),
            namespace: None,
            attrs: Vec::new(),
            child_count,
            slot: false,
        }
    }

    pub fn text(text: &str) -> Self {
        TemplateNode::Text(text.to_string())
    }

    /// Add an attribute (no-op on non-elements)
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        if let TemplateNode::Element { attrs, .. } = &mut self {
            attrs.push(TemplateAttribute {
                name: name.to_string(),
                value: value.to_string(),
                namespace: None,
            });
        }
        self
    }

    /// Mark an element as a slot (no-op on non-elements)
    pub fn as_slot(mut self) -> Self {
        if let TemplateNode::Element { slot, .. } = &mut self {
            *slot = true;
        }
        self
    }

    fn is_slot(&self) -> bool {
        match self {
            TemplateNode::Element { slot, .. } => *slot,
            TemplateNode::Text(_) => false,
            TemplateNode::DynamicText | TemplateNode::Placeholder => true,
        }
    }
}

/// Saved prototype
#[derive(Debug)]
pub struct Template {
    nodes: Vec<TemplateNode>,
    root: NodeRef,
    /// Child-index paths from the root, in pre-order
    slots: Vec<Vec<usize>>,
}

impl Template {
    /// Detached prototype root
    pub fn root(&self) -> NodeRef {
        self.root
    }

    pub fn descriptors(&self) -> &[TemplateNode] {
        &self.nodes
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

/// Id-indexed template store
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: HashMap<u32, Template>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and store a template.
    ///
    /// Saving the same descriptors again is a no-op; different descriptors
    /// replace the stored prototype.
    pub fn save(&mut self, doc: &mut Document, template_id: u32, nodes: Vec<TemplateNode>) -> BridgeResult<()> {
        if self.templates.get(&template_id).is_some_and(|t| t.nodes == nodes) {
            return Ok(());
        }

        let mut builder = Builder { doc: &mut *doc, nodes: &nodes, cursor: 0, path: Vec::new(), slots: Vec::new() };
        let mut roots = Vec::new();
        while builder.cursor < nodes.len() {
            roots.push(builder.build()?);
        }
        let [root] = roots[..] else {
            return Err(TemplateError::RootCount(roots.len()).into());
        };
        let slots = builder.slots;

        tracing::debug!(template_id, descriptors = nodes.len(), slots = slots.len(), "template saved");
        if let Some(old) = self.templates.insert(template_id, Template { nodes, root, slots }) {
            tracing::debug!(template_id, "template redefined");
            doc.free_subtree(old.root)?;
        }
        Ok(())
    }

    /// Clone a template and bind its slots to `slot_ids` in pre-order.
    ///
    /// The returned root is detached and not bound.
    pub fn instantiate(
        &self,
        doc: &mut Document,
        arena: &mut NodeArena,
        template_id: u32,
        slot_ids: &[NodeId],
    ) -> BridgeResult<NodeRef> {
        let template = self.templates.get(&template_id).ok_or(TemplateError::Unknown(template_id))?;
        if template.slots.len() != slot_ids.len() {
            return Err(TemplateError::SlotCount {
                template: template_id,
                expected: template.slots.len(),
                found: slot_ids.len(),
            }
            .into());
        }

        let root = doc.tree_mut().clone_subtree(template.root)?;
        for (path, &id) in template.slots.iter().zip(slot_ids) {
            let node = doc.tree()
                .child_at_path(root, path)
                .ok_or(TemplateError::Malformed { index: template.nodes.len() })?;
            arena.set(id, node);
        }
        Ok(root)
    }

    pub fn get(&self, template_id: u32) -> Option<&Template> {
        self.templates.get(&template_id)
    }

    pub fn contains(&self, template_id: u32) -> bool {
        self.templates.contains_key(&template_id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Element still waiting for children during a build
struct OpenElement {
    node: NodeRef,
    remaining: u32,
    children: Vec<NodeRef>,
}

struct Builder<'a> {
    doc: &'a mut Document,
    nodes: &'a [TemplateNode],
    cursor: usize,
    path: Vec<usize>,
    slots: Vec<Vec<usize>>,
}

impl Builder<'_> {
    /// Build the subtree starting at the cursor.
    ///
    /// Open elements live on an explicit stack, so nesting depth costs heap
    /// rather than stack. Children are linked when their parent completes,
    /// while the parent is still a detached root.
    fn build(&mut self) -> BridgeResult<NodeRef> {
        let nodes = self.nodes;
        let mut open: Vec<OpenElement> = Vec::new();
        loop {
            let index = self.cursor;
            let desc = nodes.get(index).ok_or(TemplateError::Malformed { index })?;
            self.cursor += 1;
            if desc.is_slot() {
                self.slots.push(self.path.clone());
            }

            let (node, child_count) = self.create(desc)?;
            if child_count > 0 {
                open.push(OpenElement { node, remaining: child_count, children: Vec::new() });
                self.path.push(0);
                continue;
            }

            // `node` is complete; close every ancestor it completes
            let mut finished = node;
            loop {
                let Some(parent) = open.last_mut() else {
                    return Ok(finished);
                };
                parent.children.push(finished);
                parent.remaining -= 1;
                if parent.remaining > 0 {
                    if let Some(sibling) = self.path.last_mut() {
                        *sibling += 1;
                    }
                    break;
                }
                let Some(done) = open.pop() else {
                    return Ok(finished);
                };
                self.path.pop();
                let tree = self.doc.tree_mut();
                for child in done.children {
                    tree.append_child(done.node, child)?;
                }
                finished = done.node;
            }
        }
    }

    /// Create one detached node; returns it with its expected child count
    fn create(&mut self, desc: &TemplateNode) -> BridgeResult<(NodeRef, u32)> {
        let tree = self.doc.tree_mut();
        let created = match desc {
            TemplateNode::Element { tag, namespace, attrs, child_count, .. } => {
                let node = match namespace {
                    Some(ns) => tree.create_element_ns(Some(ns), tag)?,
                    None => {
                        tessel_dom::validate_name(tag)?;
                        tree.create_element(tag)
                    }
                };
                for attr in attrs {
                    match &attr.namespace {
                        Some(ns) => tree.set_attribute_ns(node, Some(ns), &attr.name, &attr.value)?,
                        None => tree.set_attribute(node, &attr.name, &attr.value)?,
                    }
                }
                (node, *child_count)
            }
            TemplateNode::Text(text) => (tree.create_text(text), 0),
            TemplateNode::DynamicText => (tree.create_text(""), 0),
            TemplateNode::Placeholder => (tree.create_comment(PLACEHOLDER_TEXT), 0),
        };
        Ok(created)
    }
}
