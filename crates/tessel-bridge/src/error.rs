//! Bridge errors

use tessel_dom::DomError;
use tessel_html::HtmlError;

use crate::{ArenaError, CallbackError, DecodeError, MemoryError, TemplateError};

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Everything a boundary call can fail with
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Malformed instruction stream
    #[error("protocol error: {0}")]
    Protocol(#[from] DecodeError),

    /// Operand names an id that is not bound
    #[error("lookup error: {0}")]
    Lookup(#[from] ArenaError),

    /// The document rejected an operation
    #[error("host error: {0}")]
    Host(#[from] DomError),

    /// Markup assigned through innerHTML could not be parsed
    #[error("markup error: {0}")]
    Markup(String),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("callback error: {0}")]
    Callback(#[from] CallbackError),
}

impl From<HtmlError> for BridgeError {
    fn from(err: HtmlError) -> Self {
        match err {
            HtmlError::Tree(dom) => BridgeError::Host(dom),
            other => BridgeError::Markup(other.to_string()),
        }
    }
}

impl BridgeError {
    /// Protocol and lookup errors mean the stream itself is bad
    pub fn is_protocol(&self) -> bool {
        matches!(self, BridgeError::Protocol(_) | BridgeError::Lookup(_))
    }
}
