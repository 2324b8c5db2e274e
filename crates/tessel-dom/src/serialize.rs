//! HTML serialization (outerHTML / innerHTML)

use crate::{Document, NodeData, NodeRef};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "source", "track", "wbr",
];

/// Elements whose text children serialize verbatim
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

impl Document {
    /// Serialize a node and its subtree
    pub fn outer_html(&self, node: NodeRef) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Serialize the children of a node
    pub fn inner_html(&self, node: NodeRef) -> String {
        let mut out = String::new();
        for child in self.tree().children(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn in_raw_text(&self, node: NodeRef) -> bool {
        self.tree()
            .parent(node)
            .and_then(|p| self.tree().element(p).ok())
            .is_some_and(|e| e.namespace.is_none() && RAW_TEXT_ELEMENTS.contains(&e.local_name.as_str()))
    }

    fn write_node(&self, node: NodeRef, out: &mut String) {
        let Some(n) = self.tree().get(node) else { return };
        match &n.data {
            NodeData::Document => {
                for child in self.tree().children(node) {
                    self.write_node(child, out);
                }
            }
            NodeData::Text(text) if self.in_raw_text(node) => out.push_str(&text.content),
            NodeData::Text(text) => escape_text(&text.content, out),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Element(elem) => {
                let name = elem.qualified_name();
                out.push('<');
                out.push_str(&name);
                for attr in &elem.attrs {
                    out.push(' ');
                    out.push_str(&attr.qualified_name());
                    out.push_str("=\"");
                    escape_attr(&attr.value, out);
                    out.push('"');
                }
                if let Some(style) = elem.style_text() {
                    out.push_str(" style=\"");
                    escape_attr(&style, out);
                    out.push('"');
                }
                out.push('>');
                if elem.namespace.is_none() && VOID_ELEMENTS.contains(&elem.local_name.as_str()) {
                    return;
                }
                for child in self.tree().children(node) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&name);
                out.push('>');
            }
        }
    }
}
