//! Instruction stream codec
//!
//! Little-endian, length-prefixed encoding of tree edits. The compute module
//! writes streams with [`EditWriter`]; the interpreter reads them straight
//! out of shared memory with [`EditReader`].

use tessel_dom::Property;

use crate::memory::{MemoryBridge, MemoryError};
use crate::template::{TemplateAttribute, TemplateNode};
use crate::{CallbackId, NodeId};

/// Opcodes
pub mod op {
    pub const CREATE_ELEMENT: u8 = 0x01;
    pub const CREATE_TEXT: u8 = 0x02;
    pub const CREATE_PLACEHOLDER: u8 = 0x03;
    pub const LOAD_TEMPLATE: u8 = 0x04;
    pub const SAVE_TEMPLATE: u8 = 0x05;
    pub const BIND_ELEMENT_BY_ID: u8 = 0x06;

    pub const SET_ATTRIBUTE: u8 = 0x10;
    pub const REMOVE_ATTRIBUTE: u8 = 0x11;
    pub const TOGGLE_ATTRIBUTE: u8 = 0x12;
    pub const SET_STYLE: u8 = 0x13;
    pub const SET_PROPERTY: u8 = 0x14;

    pub const APPEND_CHILDREN: u8 = 0x20;
    pub const INSERT_BEFORE: u8 = 0x21;
    pub const INSERT_AFTER: u8 = 0x22;
    pub const REMOVE: u8 = 0x23;
    pub const REPLACE_WITH: u8 = 0x24;
    pub const FREE_ID: u8 = 0x25;

    pub const NEW_EVENT_LISTENER: u8 = 0x30;
    pub const REMOVE_EVENT_LISTENER: u8 = 0x31;
}

// Template descriptor kinds
const DESC_ELEMENT: u8 = 0;
const DESC_TEXT: u8 = 1;
const DESC_DYNAMIC_TEXT: u8 = 2;
const DESC_PLACEHOLDER: u8 = 3;

/// Decode errors (all fatal to the pass)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("stream truncated at offset {offset}: {needed} more bytes expected")]
    Truncated { offset: usize, needed: usize },

    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("invalid flag byte {value} at offset {offset}")]
    InvalidFlag { value: u8, offset: usize },

    #[error("unknown property code {code} at offset {offset}")]
    UnknownProperty { code: u8, offset: usize },

    #[error("unknown template descriptor kind {kind} at offset {offset}")]
    UnknownDescriptor { kind: u8, offset: usize },

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// A decoded instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    CreateElement { id: NodeId, tag: String, namespace: Option<String> },
    CreateText { id: NodeId, text: String },
    CreatePlaceholder { id: NodeId },
    LoadTemplate { template: u32, id: NodeId, slots: Vec<NodeId> },
    SaveTemplate { template: u32, nodes: Vec<TemplateNode> },
    BindElementById { id: NodeId, dom_id: String },

    SetAttribute { id: NodeId, name: String, value: String, namespace: Option<String> },
    RemoveAttribute { id: NodeId, name: String, namespace: Option<String> },
    ToggleAttribute { id: NodeId, name: String, force: Option<bool> },
    SetStyle { id: NodeId, property: String, value: String },
    SetProperty { id: NodeId, property: Property, value: String },

    AppendChildren { parent: NodeId, children: Vec<NodeId> },
    InsertBefore { reference: NodeId, nodes: Vec<NodeId> },
    InsertAfter { reference: NodeId, nodes: Vec<NodeId> },
    Remove { id: NodeId },
    ReplaceWith { id: NodeId, nodes: Vec<NodeId> },
    FreeId { id: NodeId },

    NewEventListener { id: NodeId, name: String, callback: CallbackId, capture: bool },
    RemoveEventListener { id: NodeId, name: String, callback: CallbackId, capture: bool },
}

impl Instruction {
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::CreateElement { .. } => op::CREATE_ELEMENT,
            Instruction::CreateText { .. } => op::CREATE_TEXT,
            Instruction::CreatePlaceholder { .. } => op::CREATE_PLACEHOLDER,
            Instruction::LoadTemplate { .. } => op::LOAD_TEMPLATE,
            Instruction::SaveTemplate { .. } => op::SAVE_TEMPLATE,
            Instruction::BindElementById { .. } => op::BIND_ELEMENT_BY_ID,
            Instruction::SetAttribute { .. } => op::SET_ATTRIBUTE,
            Instruction::RemoveAttribute { .. } => op::REMOVE_ATTRIBUTE,
            Instruction::ToggleAttribute { .. } => op::TOGGLE_ATTRIBUTE,
            Instruction::SetStyle { .. } => op::SET_STYLE,
            Instruction::SetProperty { .. } => op::SET_PROPERTY,
            Instruction::AppendChildren { .. } => op::APPEND_CHILDREN,
            Instruction::InsertBefore { .. } => op::INSERT_BEFORE,
            Instruction::InsertAfter { .. } => op::INSERT_AFTER,
            Instruction::Remove { .. } => op::REMOVE,
            Instruction::ReplaceWith { .. } => op::REPLACE_WITH,
            Instruction::FreeId { .. } => op::FREE_ID,
            Instruction::NewEventListener { .. } => op::NEW_EVENT_LISTENER,
            Instruction::RemoveEventListener { .. } => op::REMOVE_EVENT_LISTENER,
        }
    }
}

fn property_code(property: Property) -> u8 {
    match property {
        Property::ClassName => 0,
        Property::TextContent => 1,
        Property::InnerHtml => 2,
        Property::Value => 3,
        Property::Checked => 4,
    }
}

fn property_from_code(code: u8) -> Option<Property> {
    Some(match code {
        0 => Property::ClassName,
        1 => Property::TextContent,
        2 => Property::InnerHtml,
        3 => Property::Value,
        4 => Property::Checked,
        _ => return None,
    })
}

// ============================================================================
// Writer
// ============================================================================

/// Builds an instruction stream
#[derive(Debug, Default, Clone)]
pub struct EditWriter {
    bytes: Vec<u8>,
}

impl EditWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded bytes so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn put_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    fn put_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn put_str(&mut self, value: &str) {
        self.put_u32(value.len() as u32);
        self.bytes.extend_from_slice(value.as_bytes());
    }

    fn put_opt_str(&mut self, value: Option<&str>) {
        match value {
            Some(value) => {
                self.put_u8(1);
                self.put_str(value);
            }
            None => self.put_u8(0),
        }
    }

    fn put_bool(&mut self, value: bool) {
        self.put_u8(value as u8);
    }

    fn put_ids(&mut self, ids: &[NodeId]) {
        self.put_u32(ids.len() as u32);
        for id in ids {
            self.put_u32(id.0);
        }
    }

    fn put_descriptor(&mut self, node: &TemplateNode) {
        match node {
            TemplateNode::Element { tag, namespace, attrs, child_count, slot } => {
                self.put_u8(DESC_ELEMENT);
                self.put_str(tag);
                self.put_opt_str(namespace.as_deref());
                self.put_u32(attrs.len() as u32);
                for attr in attrs {
                    self.put_str(&attr.name);
                    self.put_str(&attr.value);
                    self.put_opt_str(attr.namespace.as_deref());
                }
                self.put_u32(*child_count);
                self.put_bool(*slot);
            }
            TemplateNode::Text(text) => {
                self.put_u8(DESC_TEXT);
                self.put_str(text);
            }
            TemplateNode::DynamicText => self.put_u8(DESC_DYNAMIC_TEXT),
            TemplateNode::Placeholder => self.put_u8(DESC_PLACEHOLDER),
        }
    }

    /// Encode any instruction
    pub fn push(&mut self, instruction: &Instruction) -> &mut Self {
        self.put_u8(instruction.opcode());
        match instruction {
            Instruction::CreateElement { id, tag, namespace } => {
                self.put_u32(id.0);
                self.put_str(tag);
                self.put_opt_str(namespace.as_deref());
            }
            Instruction::CreateText { id, text } => {
                self.put_u32(id.0);
                self.put_str(text);
            }
            Instruction::CreatePlaceholder { id }
            | Instruction::Remove { id }
            | Instruction::FreeId { id } => self.put_u32(id.0),
            Instruction::LoadTemplate { template, id, slots } => {
                self.put_u32(*template);
                self.put_u32(id.0);
                self.put_ids(slots);
            }
            Instruction::SaveTemplate { template, nodes } => {
                self.put_u32(*template);
                self.put_u32(nodes.len() as u32);
                for node in nodes {
                    self.put_descriptor(node);
                }
            }
            Instruction::BindElementById { id, dom_id } => {
                self.put_u32(id.0);
                self.put_str(dom_id);
            }
            Instruction::SetAttribute { id, name, value, namespace } => {
                self.put_u32(id.0);
                self.put_str(name);
                self.put_str(value);
                self.put_opt_str(namespace.as_deref());
            }
            Instruction::RemoveAttribute { id, name, namespace } => {
                self.put_u32(id.0);
                self.put_str(name);
                self.put_opt_str(namespace.as_deref());
            }
            Instruction::ToggleAttribute { id, name, force } => {
                self.put_u32(id.0);
                self.put_str(name);
                self.put_u8(match force {
                    None => 0,
                    Some(false) => 1,
                    Some(true) => 2,
                });
            }
            Instruction::SetStyle { id, property, value } => {
                self.put_u32(id.0);
                self.put_str(property);
                self.put_str(value);
            }
            Instruction::SetProperty { id, property, value } => {
                self.put_u32(id.0);
                self.put_u8(property_code(*property));
                self.put_str(value);
            }
            Instruction::AppendChildren { parent: id, children: nodes }
            | Instruction::InsertBefore { reference: id, nodes }
            | Instruction::InsertAfter { reference: id, nodes }
            | Instruction::ReplaceWith { id, nodes } => {
                self.put_u32(id.0);
                self.put_ids(nodes);
            }
            Instruction::NewEventListener { id, name, callback, capture }
            | Instruction::RemoveEventListener { id, name, callback, capture } => {
                self.put_u32(id.0);
                self.put_str(name);
                self.put_u32(callback.0);
                self.put_bool(*capture);
            }
        }
        self
    }

    pub fn create_element(&mut self, id: NodeId, tag: &str) -> &mut Self {
        self.push(&Instruction::CreateElement { id, tag: tag.into(), namespace: None })
    }

    pub fn create_element_ns(&mut self, id: NodeId, tag: &str, namespace: &str) -> &mut Self {
        self.push(&Instruction::CreateElement { id, tag: tag.into(), namespace: Some(namespace.into()) })
    }

    pub fn create_text(&mut self, id: NodeId, text: &str) -> &mut Self {
        self.push(&Instruction::CreateText { id, text: text.into() })
    }

    pub fn create_placeholder(&mut self, id: NodeId) -> &mut Self {
        self.push(&Instruction::CreatePlaceholder { id })
    }

    pub fn load_template(&mut self, template: u32, id: NodeId, slots: &[NodeId]) -> &mut Self {
        self.push(&Instruction::LoadTemplate { template, id, slots: slots.to_vec() })
    }

    pub fn save_template(&mut self, template: u32, nodes: &[TemplateNode]) -> &mut Self {
        self.push(&Instruction::SaveTemplate { template, nodes: nodes.to_vec() })
    }

    pub fn bind_element_by_id(&mut self, id: NodeId, dom_id: &str) -> &mut Self {
        self.push(&Instruction::BindElementById { id, dom_id: dom_id.into() })
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> &mut Self {
        self.push(&Instruction::SetAttribute { id, name: name.into(), value: value.into(), namespace: None })
    }

    pub fn set_attribute_ns(&mut self, id: NodeId, name: &str, value: &str, namespace: &str) -> &mut Self {
        self.push(&Instruction::SetAttribute {
            id,
            name: name.into(),
            value: value.into(),
            namespace: Some(namespace.into()),
        })
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> &mut Self {
        self.push(&Instruction::RemoveAttribute { id, name: name.into(), namespace: None })
    }

    pub fn toggle_attribute(&mut self, id: NodeId, name: &str, force: Option<bool>) -> &mut Self {
        self.push(&Instruction::ToggleAttribute { id, name: name.into(), force })
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) -> &mut Self {
        self.push(&Instruction::SetStyle { id, property: property.into(), value: value.into() })
    }

    pub fn set_property(&mut self, id: NodeId, property: Property, value: &str) -> &mut Self {
        self.push(&Instruction::SetProperty { id, property, value: value.into() })
    }

    pub fn append_children(&mut self, parent: NodeId, children: &[NodeId]) -> &mut Self {
        self.push(&Instruction::AppendChildren { parent, children: children.to_vec() })
    }

    pub fn insert_before(&mut self, reference: NodeId, nodes: &[NodeId]) -> &mut Self {
        self.push(&Instruction::InsertBefore { reference, nodes: nodes.to_vec() })
    }

    pub fn insert_after(&mut self, reference: NodeId, nodes: &[NodeId]) -> &mut Self {
        self.push(&Instruction::InsertAfter { reference, nodes: nodes.to_vec() })
    }

    pub fn remove(&mut self, id: NodeId) -> &mut Self {
        self.push(&Instruction::Remove { id })
    }

    pub fn replace_with(&mut self, id: NodeId, nodes: &[NodeId]) -> &mut Self {
        self.push(&Instruction::ReplaceWith { id, nodes: nodes.to_vec() })
    }

    pub fn free_id(&mut self, id: NodeId) -> &mut Self {
        self.push(&Instruction::FreeId { id })
    }

    pub fn new_event_listener(&mut self, id: NodeId, name: &str, callback: CallbackId, capture: bool) -> &mut Self {
        self.push(&Instruction::NewEventListener { id, name: name.into(), callback, capture })
    }

    pub fn remove_event_listener(&mut self, id: NodeId, name: &str, callback: CallbackId, capture: bool) -> &mut Self {
        self.push(&Instruction::RemoveEventListener { id, name: name.into(), callback, capture })
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Decodes instructions from a window of shared memory.
///
/// Every operand read takes a fresh view, so nothing derived from the buffer
/// outlives a single read.
pub struct EditReader<'a> {
    memory: &'a MemoryBridge,
    pos: usize,
    end: usize,
    failed: bool,
}

impl<'a> EditReader<'a> {
    pub fn new(memory: &'a MemoryBridge, offset: usize, len: usize) -> Self {
        Self { memory, pos: offset, end: offset.saturating_add(len), failed: false }
    }

    /// Offset of the next unread byte
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.end
    }

    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        if self.end.saturating_sub(self.pos) < needed {
            return Err(DecodeError::Truncated { offset: self.pos, needed });
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        let value = self.memory.view::<u8>()?.read_at(self.pos)?;
        self.pos += 1;
        Ok(value)
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        self.ensure(4)?;
        let value = self.memory.view::<u32>()?.read_at(self.pos)?;
        self.pos += 4;
        Ok(value)
    }

    fn id(&mut self) -> Result<NodeId, DecodeError> {
        self.u32().map(NodeId)
    }

    fn str(&mut self) -> Result<String, DecodeError> {
        let len = self.u32()? as usize;
        self.ensure(len)?;
        let offset = self.pos;
        let text = {
            let view = self.memory.view::<u8>()?;
            std::str::from_utf8(view.bytes(offset, len)?)
                .map_err(|_| DecodeError::InvalidUtf8 { offset })?
                .to_string()
        };
        self.pos += len;
        Ok(text)
    }

    fn bool(&mut self) -> Result<bool, DecodeError> {
        let offset = self.pos;
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidFlag { value, offset }),
        }
    }

    fn opt_str(&mut self) -> Result<Option<String>, DecodeError> {
        if self.bool()? { self.str().map(Some) } else { Ok(None) }
    }

    fn tristate(&mut self) -> Result<Option<bool>, DecodeError> {
        let offset = self.pos;
        match self.u8()? {
            0 => Ok(None),
            1 => Ok(Some(false)),
            2 => Ok(Some(true)),
            value => Err(DecodeError::InvalidFlag { value, offset }),
        }
    }

    fn ids(&mut self) -> Result<Vec<NodeId>, DecodeError> {
        let count = self.u32()? as usize;
        self.ensure(count.saturating_mul(4))?;
        (0..count).map(|_| self.id()).collect()
    }

    fn descriptor(&mut self) -> Result<TemplateNode, DecodeError> {
        let offset = self.pos;
        Ok(match self.u8()? {
            DESC_ELEMENT => {
                let tag = self.str()?;
                let namespace = self.opt_str()?;
                let attr_count = self.u32()? as usize;
                let mut attrs = Vec::with_capacity(attr_count.min(64));
                for _ in 0..attr_count {
                    attrs.push(TemplateAttribute {
                        name: self.str()?,
                        value: self.str()?,
                        namespace: self.opt_str()?,
                    });
                }
                let child_count = self.u32()?;
                let slot = self.bool()?;
                TemplateNode::Element { tag, namespace, attrs, child_count, slot }
            }
            DESC_TEXT => TemplateNode::Text(self.str()?),
            DESC_DYNAMIC_TEXT => TemplateNode::DynamicText,
            DESC_PLACEHOLDER => TemplateNode::Placeholder,
            kind => return Err(DecodeError::UnknownDescriptor { kind, offset }),
        })
    }

    fn instruction(&mut self) -> Result<Instruction, DecodeError> {
        let offset = self.pos;
        Ok(match self.u8()? {
            op::CREATE_ELEMENT => Instruction::CreateElement {
                id: self.id()?,
                tag: self.str()?,
                namespace: self.opt_str()?,
            },
            op::CREATE_TEXT => Instruction::CreateText { id: self.id()?, text: self.str()? },
            op::CREATE_PLACEHOLDER => Instruction::CreatePlaceholder { id: self.id()? },
            op::LOAD_TEMPLATE => Instruction::LoadTemplate {
                template: self.u32()?,
                id: self.id()?,
                slots: self.ids()?,
            },
            op::SAVE_TEMPLATE => {
                let template = self.u32()?;
                let count = self.u32()? as usize;
                self.ensure(count)?;
                let nodes = (0..count).map(|_| self.descriptor()).collect::<Result<_, _>>()?;
                Instruction::SaveTemplate { template, nodes }
            }
            op::BIND_ELEMENT_BY_ID => Instruction::BindElementById { id: self.id()?, dom_id: self.str()? },
            op::SET_ATTRIBUTE => Instruction::SetAttribute {
                id: self.id()?,
                name: self.str()?,
                value: self.str()?,
                namespace: self.opt_str()?,
            },
            op::REMOVE_ATTRIBUTE => Instruction::RemoveAttribute {
                id: self.id()?,
                name: self.str()?,
                namespace: self.opt_str()?,
            },
            op::TOGGLE_ATTRIBUTE => Instruction::ToggleAttribute {
                id: self.id()?,
                name: self.str()?,
                force: self.tristate()?,
            },
            op::SET_STYLE => Instruction::SetStyle { id: self.id()?, property: self.str()?, value: self.str()? },
            op::SET_PROPERTY => {
                let id = self.id()?;
                let code_offset = self.pos;
                let code = self.u8()?;
                let property = property_from_code(code)
                    .ok_or(DecodeError::UnknownProperty { code, offset: code_offset })?;
                Instruction::SetProperty { id, property, value: self.str()? }
            }
            op::APPEND_CHILDREN => Instruction::AppendChildren { parent: self.id()?, children: self.ids()? },
            op::INSERT_BEFORE => Instruction::InsertBefore { reference: self.id()?, nodes: self.ids()? },
            op::INSERT_AFTER => Instruction::InsertAfter { reference: self.id()?, nodes: self.ids()? },
            op::REMOVE => Instruction::Remove { id: self.id()? },
            op::REPLACE_WITH => Instruction::ReplaceWith { id: self.id()?, nodes: self.ids()? },
            op::FREE_ID => Instruction::FreeId { id: self.id()? },
            op::NEW_EVENT_LISTENER => Instruction::NewEventListener {
                id: self.id()?,
                name: self.str()?,
                callback: CallbackId(self.u32()?),
                capture: self.bool()?,
            },
            op::REMOVE_EVENT_LISTENER => Instruction::RemoveEventListener {
                id: self.id()?,
                name: self.str()?,
                callback: CallbackId(self.u32()?),
                capture: self.bool()?,
            },
            opcode => return Err(DecodeError::UnknownOpcode { opcode, offset }),
        })
    }
}

impl Iterator for EditReader<'_> {
    type Item = Result<Instruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.is_at_end() {
            return None;
        }
        let result = self.instruction();
        self.failed = result.is_err();
        Some(result)
    }
}
