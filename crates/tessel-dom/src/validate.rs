//! Name and namespace validation
//!
//! Mirrors the checks the host performs in `createElementNS` and
//! `setAttributeNS`; failures surface as host-API errors.

use crate::{DomError, DomResult};

pub const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// Validated qualified name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace: Option<String>,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.'
}

/// Check that `name` is a valid XML name
pub fn validate_name(name: &str) -> DomResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => is_name_start(first) && chars.all(is_name_char),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DomError::InvalidCharacter(name.to_string()))
    }
}

/// Validate a qualified name against a namespace and split it
pub fn validate_and_extract(namespace: Option<&str>, qualified_name: &str) -> DomResult<QualifiedName> {
    let namespace = namespace.filter(|ns| !ns.is_empty());
    validate_name(qualified_name)?;

    let (prefix, local_name) = match qualified_name.split_once(':') {
        Some((prefix, local)) => {
            if prefix.is_empty() || local.is_empty() || local.contains(':') {
                return Err(DomError::InvalidCharacter(qualified_name.to_string()));
            }
            (Some(prefix), local)
        }
        None => (None, qualified_name),
    };

    let namespace_error = || DomError::Namespace {
        name: qualified_name.to_string(),
        namespace: namespace.map(str::to_string),
    };

    if prefix.is_some() && namespace.is_none() {
        return Err(namespace_error());
    }
    if prefix == Some("xml") && namespace != Some(XML_NS) {
        return Err(namespace_error());
    }
    let is_xmlns = qualified_name == "xmlns" || prefix == Some("xmlns");
    if is_xmlns != (namespace == Some(XMLNS_NS)) {
        return Err(namespace_error());
    }

    Ok(QualifiedName {
        prefix: prefix.map(str::to_string),
        local_name: local_name.to_string(),
        namespace: namespace.map(str::to_string),
    })
}
