//! DOM Node - Compact representation
//!
//! Nodes link to each other through [`NodeRef`] indices instead of pointers,
//! so the whole tree lives in one arena and detached subtrees cost nothing
//! extra to keep around.

use crate::{NodeRef, FileEntry, HTML_NS};

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (NONE if detached or the document)
    pub parent: NodeRef,
    /// First child
    pub first_child: NodeRef,
    /// Last child (for O(1) append)
    pub last_child: NodeRef,
    /// Previous sibling
    pub prev_sibling: NodeRef,
    /// Next sibling
    pub next_sibling: NodeRef,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeRef::NONE,
            first_child: NodeRef::NONE,
            last_child: NodeRef::NONE,
            prev_sibling: NodeRef::NONE,
            next_sibling: NodeRef::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(data: ElementData) -> Self {
        Self::with_data(NodeData::Element(data))
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::with_data(NodeData::Text(TextData { content }))
    }

    /// Create a new comment node
    pub fn comment(content: String) -> Self {
        Self::with_data(NodeData::Comment(content))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Whether this node may hold children
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self.data, NodeData::Element(_) | NodeData::Document)
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(&t.content),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(TextData),
    /// Comment (also used for placeholders)
    Comment(String),
}

/// Capability tag resolved once when the element is created.
///
/// Anything that reads form-control state branches on this instead of
/// re-checking the tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Input,
    Select,
    TextArea,
    Form,
    SelectOption,
    Generic,
}

impl ElementKind {
    /// Resolve the kind for a tag in a namespace (None means HTML)
    pub fn resolve(local_name: &str, namespace: Option<&str>) -> Self {
        if namespace.is_some_and(|ns| ns != HTML_NS) {
            return Self::Generic;
        }
        match local_name {
            "input" => Self::Input,
            "select" => Self::Select,
            "textarea" => Self::TextArea,
            "form" => Self::Form,
            "option" => Self::SelectOption,
            _ => Self::Generic,
        }
    }

    /// Elements whose value is a form-control value
    pub fn is_form_control(self) -> bool {
        matches!(self, Self::Input | Self::Select | Self::TextArea)
    }
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Local name (lowercased for HTML elements)
    pub local_name: String,
    /// Namespace prefix, if created with a qualified name
    pub prefix: Option<String>,
    /// Namespace URI (None for plain HTML elements)
    pub namespace: Option<String>,
    /// Capability tag
    pub kind: ElementKind,
    /// Attributes in insertion order
    pub attrs: Vec<Attribute>,
    /// Inline style declarations in insertion order
    pub style: Vec<(String, String)>,
    /// Form-control state that shadows attributes once written
    pub control: ControlState,
}

impl ElementData {
    pub fn new(local_name: &str, prefix: Option<String>, namespace: Option<String>) -> Self {
        let kind = ElementKind::resolve(local_name, namespace.as_deref());
        Self {
            local_name: local_name.to_string(),
            prefix,
            namespace,
            kind,
            attrs: Vec::new(),
            style: Vec::new(),
            control: ControlState::default(),
        }
    }

    /// Qualified tag name as serialized
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Get an attribute value (no namespace)
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.get_attr_ns(None, name)
    }

    /// Get an attribute value by namespace and local name
    pub fn get_attr_ns(&self, namespace: Option<&str>, local_name: &str) -> Option<&str> {
        self.attrs.iter()
            .find(|a| a.namespace.as_deref() == namespace && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Check for a boolean attribute
    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    /// Set an attribute, replacing the value of an existing one
    pub fn set_attr(&mut self, attr: Attribute) {
        for existing in self.attrs.iter_mut() {
            if existing.namespace == attr.namespace && existing.local_name == attr.local_name {
                existing.value = attr.value;
                return;
            }
        }
        self.attrs.push(attr);
    }

    /// Remove an attribute; returns whether one was present
    pub fn remove_attr(&mut self, namespace: Option<&str>, local_name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|a| !(a.namespace.as_deref() == namespace && a.local_name == local_name));
        self.attrs.len() != before
    }

    /// Get a style property
    pub fn style_property(&self, property: &str) -> Option<&str> {
        self.style.iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }

    /// Serialized `style` declaration block
    pub fn style_text(&self) -> Option<String> {
        if self.style.is_empty() {
            return None;
        }
        let decls: Vec<String> = self.style.iter()
            .map(|(name, value)| format!("{}: {};", name, value))
            .collect();
        Some(decls.join(" "))
    }
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub local_name: String,
    pub prefix: Option<String>,
    pub namespace: Option<String>,
    pub value: String,
}

impl Attribute {
    /// Plain attribute without a namespace
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            local_name: name.to_string(),
            prefix: None,
            namespace: None,
            value: value.to_string(),
        }
    }

    /// Qualified name as serialized
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }
}

/// Live form-control state.
///
/// `None` means "not dirty": the value falls back to the content attribute.
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    /// Dirty value (input, textarea)
    pub value: Option<String>,
    /// Dirty checkedness (checkbox, radio)
    pub checked: Option<bool>,
    /// Dirty selectedness (option)
    pub selected: Option<bool>,
    /// Files picked into a file input
    pub files: Vec<FileEntry>,
}

/// Text node data
#[derive(Debug, Clone)]
pub struct TextData {
    pub content: String,
}

/// Properties assigned directly instead of through attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    ClassName,
    TextContent,
    InnerHtml,
    Value,
    Checked,
}

impl Property {
    /// DOM property name
    pub fn name(self) -> &'static str {
        match self {
            Self::ClassName => "className",
            Self::TextContent => "textContent",
            Self::InnerHtml => "innerHTML",
            Self::Value => "value",
            Self::Checked => "checked",
        }
    }
}
