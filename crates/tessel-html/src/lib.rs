//! Tessel HTML Parser
//!
//! HTML5 parsing built on html5ever, converted into the Tessel document tree.
//! Used for whole documents and for `innerHTML` fragments.

mod parser;

pub use parser::HtmlParser;

use tessel_dom::{Document, DomError, NodeRef};

/// Parse an HTML string into a new document
pub fn parse(html: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse(html)
}

/// Parse an HTML fragment in the context of the element `context`, into
/// detached nodes owned by `doc`
pub fn parse_fragment(doc: &mut Document, context: NodeRef, html: &str) -> Result<Vec<NodeRef>, HtmlError> {
    HtmlParser::new().parse_fragment(doc, context, html)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("failed to read HTML input: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not build tree: {0}")]
    Tree(#[from] DomError),
}
