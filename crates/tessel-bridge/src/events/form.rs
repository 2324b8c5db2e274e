//! Form entry decoding
//!
//! Turns the host's ordered entry list into a field map keyed by name, with
//! repeated names (multi-selects, checkbox groups) kept as several values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tessel_dom::{Document, DomResult, ElementKind, FileEntry, FormDataValue, NodeRef};

/// Field name to submitted values, in submission order per name
pub type FieldMap = BTreeMap<String, Vec<FormValue>>;

/// Description of a submitted file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValue {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub last_modified: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<u8>,
}

impl From<&FileEntry> for FileValue {
    fn from(file: &FileEntry) -> Self {
        Self {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.content.len() as u64,
            last_modified: file.last_modified,
            content: file.content.clone(),
        }
    }
}

/// One submitted value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Text(String),
    File(FileValue),
}

impl FormValue {
    pub fn text(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(text) => Some(text),
            FormValue::File(_) => None,
        }
    }
}

/// Decode the entry list of a form element
pub fn decode_form(doc: &Document, form: NodeRef) -> DomResult<FieldMap> {
    let data = doc.form_data(form)?;
    let mut fields = FieldMap::new();
    for (name, value) in data.entries() {
        let value = match value {
            FormDataValue::String(text) => FormValue::Text(text.clone()),
            FormDataValue::File(file) => FormValue::File(file.into()),
        };
        fields.entry(name.to_string()).or_default().push(value);
    }
    Ok(fields)
}

/// Nearest form element at or above `node`
pub fn enclosing_form(doc: &Document, node: NodeRef) -> Option<NodeRef> {
    doc.tree().ancestors(node).find(|&n| {
        doc.tree().get(n)
            .and_then(|node| node.as_element())
            .is_some_and(|e| e.kind == ElementKind::Form)
    })
}
