//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it into the Tessel tree.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, parse_fragment, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use tessel_dom::{Attribute, Document, DomTree, ElementData, Node, NodeRef, HTML_NS};

use crate::HtmlError;

/// HTML5 parser
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a complete HTML document
    pub fn parse(&self, html: &str) -> Result<Document, HtmlError> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?;

        let mut document = Document::empty();
        let root = document.tree().root();
        for child in dom.document.children.borrow().iter() {
            if let Some(id) = self.convert(child, document.tree_mut())? {
                document.tree_mut().append_child(root, id)?;
            }
        }
        document.finalize();

        tracing::debug!(nodes = document.tree().len(), "parsed document");
        Ok(document)
    }

    /// Parse markup as the new children of `context` and return the
    /// top-level nodes, detached, in document order.
    ///
    /// The context element decides the tokenizer state and insertion mode,
    /// so `<tr>` under a table or `<style>` under a div survive as elements.
    pub fn parse_fragment(&self, doc: &mut Document, context: NodeRef, html: &str) -> Result<Vec<NodeRef>, HtmlError> {
        let context = {
            let element = doc.tree().element(context)?;
            let ns = element.namespace.as_deref().unwrap_or(HTML_NS);
            QualName::new(None, Namespace::from(ns), LocalName::from(element.local_name.as_str()))
        };
        let dom = parse_fragment(RcDom::default(), Default::default(), context, Vec::new(), false)
            .from_utf8()
            .read_from(&mut html.as_bytes())?;

        // Fragment content lands under a synthetic <html> root
        let children = dom.document.children.borrow();
        let Some(container) = children.first() else {
            return Ok(Vec::new());
        };

        let mut nodes = Vec::new();
        for child in container.children.borrow().iter() {
            if let Some(id) = self.convert(child, doc.tree_mut())? {
                nodes.push(id);
            }
        }
        tracing::trace!(count = nodes.len(), "parsed fragment");
        Ok(nodes)
    }

    /// Convert an RcDom subtree; returns the detached root, if it maps to a node
    fn convert(&self, handle: &Handle, tree: &mut DomTree) -> Result<Option<NodeRef>, HtmlError> {
        let Some(root) = convert_node(handle, tree) else {
            return Ok(None);
        };
        // Explicit stack so nesting depth is bounded by the heap
        let mut stack: Vec<(Handle, NodeRef)> = Vec::new();
        push_children(&mut stack, handle, root);
        while let Some((handle, parent)) = stack.pop() {
            if let Some(id) = convert_node(&handle, tree) {
                tree.append_child(parent, id)?;
                push_children(&mut stack, &handle, id);
            }
        }
        Ok(Some(root))
    }
}

fn push_children(stack: &mut Vec<(Handle, NodeRef)>, handle: &Handle, parent: NodeRef) {
    if matches!(handle.data, RcNodeData::Element { .. }) {
        stack.extend(handle.children.borrow().iter().rev().map(|c| (c.clone(), parent)));
    }
}

/// Create the detached counterpart of a single RcDom node
fn convert_node(handle: &Handle, tree: &mut DomTree) -> Option<NodeRef> {
    let id = match &handle.data {
        RcNodeData::Text { contents } => tree.create_text(&contents.borrow()),
        RcNodeData::Comment { contents } => tree.create_comment(contents),
        RcNodeData::Element { name, attrs, .. } => {
            let namespace = match &*name.ns {
                "" | HTML_NS => None,
                ns => Some(ns.to_string()),
            };
            let prefix = name.prefix.as_ref().map(|p| p.to_string());
            let mut elem = ElementData::new(&name.local, prefix, namespace);

            for attr in attrs.borrow().iter() {
                if attr.name.ns.is_empty() && &*attr.name.local == "style" {
                    elem.style = parse_style(&attr.value);
                    continue;
                }
                elem.set_attr(Attribute {
                    local_name: attr.name.local.to_string(),
                    prefix: attr.name.prefix.as_ref().map(|p| p.to_string()),
                    namespace: (!attr.name.ns.is_empty()).then(|| attr.name.ns.to_string()),
                    value: attr.value.to_string(),
                });
            }
            tree.insert_node(Node::element(elem))
        }
        // Doctypes and processing instructions have no counterpart
        RcNodeData::Document
        | RcNodeData::Doctype { .. }
        | RcNodeData::ProcessingInstruction { .. } => return None,
    };
    Some(id)
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_style(text: &str) -> Vec<(String, String)> {
    text.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            (!name.is_empty() && !value.is_empty()).then(|| (name, value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple() {
        let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
        let doc = HtmlParser::new().parse(html).unwrap();

        assert!(doc.body().is_valid());
        assert!(doc.head().is_valid());
        assert_eq!(doc.inner_html(doc.body()), "<p>Hello</p>");
    }

    #[test]
    fn test_fragment_is_detached() {
        let mut doc = Document::new();
        let body = doc.body();
        let nodes = HtmlParser::new()
            .parse_fragment(&mut doc, body, "<b>bold</b> and <i>italic</i>")
            .unwrap();

        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|&n| doc.tree().parent(n).is_none()));
        assert_eq!(doc.outer_html(nodes[0]), "<b>bold</b>");
        assert_eq!(doc.tree().text_content(nodes[1]), " and ");
    }

    #[test]
    fn test_svg_keeps_namespace() {
        let mut doc = Document::new();
        let body = doc.body();
        let nodes = HtmlParser::new()
            .parse_fragment(&mut doc, body, "<svg><circle r=\"4\"></circle></svg>")
            .unwrap();

        let svg = doc.tree().element(nodes[0]).unwrap();
        assert_eq!(svg.namespace.as_deref(), Some(tessel_dom::SVG_NS));
    }

    #[test]
    fn test_style_attribute_becomes_declarations() {
        let mut doc = Document::new();
        let body = doc.body();
        let nodes = HtmlParser::new()
            .parse_fragment(&mut doc, body, "<div style=\"color: red; margin:0\"></div>")
            .unwrap();

        let div = doc.tree().element(nodes[0]).unwrap();
        assert_eq!(div.style_property("color"), Some("red"));
        assert_eq!(div.style_property("margin"), Some("0"));
    }

    #[test]
    fn test_fragment_keeps_head_content() {
        let mut doc = Document::new();
        let div = doc.tree_mut().create_element("div");
        let nodes = HtmlParser::new()
            .parse_fragment(&mut doc, div, "<style>.a{color:red}</style><b>x</b>")
            .unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(doc.outer_html(nodes[0]), "<style>.a{color:red}</style>");
        assert_eq!(doc.outer_html(nodes[1]), "<b>x</b>");
    }

    #[test]
    fn test_fragment_in_table_context() {
        let mut doc = Document::new();
        let table = doc.tree_mut().create_element("table");
        let nodes = HtmlParser::new()
            .parse_fragment(&mut doc, table, "<tr><td>1</td></tr>")
            .unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.outer_html(nodes[0]), "<tbody><tr><td>1</td></tr></tbody>");
    }

    #[test]
    fn test_fragment_needs_element_context() {
        let mut doc = Document::new();
        let text = doc.tree_mut().create_text("x");
        let err = HtmlParser::new().parse_fragment(&mut doc, text, "<b></b>").unwrap_err();
        assert!(matches!(err, HtmlError::Tree(tessel_dom::DomError::NotAnElement(_))));
    }
}
