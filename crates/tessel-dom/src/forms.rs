//! Form controls and FormData
//!
//! Live value/checkedness/selectedness of form controls and the entry list
//! a form produces when it is submitted.

use crate::{Document, DomError, DomResult, ElementKind, NodeRef};

/// FormData entry value
#[derive(Debug, Clone, PartialEq)]
pub enum FormDataValue {
    /// String value
    String(String),
    /// File value
    File(FileEntry),
}

/// File entry in FormData (or picked into a file input)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileEntry {
    /// File name
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// File content
    pub content: Vec<u8>,
    /// Last modified timestamp
    pub last_modified: u64,
}

impl FileEntry {
    pub fn new(name: &str, mime_type: &str, content: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            content: content.to_vec(),
            last_modified: 0,
        }
    }

    /// The entry a file input with nothing selected contributes
    pub fn empty() -> Self {
        Self::new("", "application/octet-stream", &[])
    }
}

/// FormData object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    /// Entries (supports multiple values per key)
    entries: Vec<(String, FormDataValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a string value
    pub fn append(&mut self, name: &str, value: &str) {
        self.entries.push((name.to_string(), FormDataValue::String(value.to_string())));
    }

    /// Append a file
    pub fn append_file(&mut self, name: &str, file: FileEntry) {
        self.entries.push((name.to_string(), FormDataValue::File(file)));
    }

    /// Get first value for name
    pub fn get(&self, name: &str) -> Option<&FormDataValue> {
        self.entries.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Get all values for name
    pub fn get_all(&self, name: &str) -> Vec<&FormDataValue> {
        self.entries.iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v)
            .collect()
    }

    /// Check if key exists
    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Get all entries in tree order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FormDataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Document {
    /// Lowercased `type` of an input (defaults to "text")
    pub fn input_type(&self, node: NodeRef) -> String {
        self.tree().attribute(node, "type")
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "text".to_string())
    }

    fn kind(&self, node: NodeRef) -> Option<ElementKind> {
        self.tree().get(node)?.as_element().map(|e| e.kind)
    }

    /// Is this a checkbox or radio input?
    pub fn is_checkable(&self, node: NodeRef) -> bool {
        self.kind(node) == Some(ElementKind::Input)
            && matches!(self.input_type(node).as_str(), "checkbox" | "radio")
    }

    /// Current value of a form control or option.
    ///
    /// Returns None for elements that carry no value.
    pub fn value(&self, node: NodeRef) -> Option<String> {
        let elem = self.tree().get(node)?.as_element()?;
        match elem.kind {
            ElementKind::Input => {
                if let Some(value) = &elem.control.value {
                    return Some(value.clone());
                }
                if let Some(value) = elem.get_attr("value") {
                    return Some(value.to_string());
                }
                Some(if self.is_checkable(node) { "on".to_string() } else { String::new() })
            }
            ElementKind::TextArea => Some(
                elem.control.value.clone().unwrap_or_else(|| self.tree().text_content(node)),
            ),
            ElementKind::Select => Some(
                self.selected_options(node)
                    .first()
                    .and_then(|&opt| self.value(opt))
                    .unwrap_or_default(),
            ),
            ElementKind::SelectOption => Some(match elem.get_attr("value") {
                Some(value) => value.to_string(),
                None => self.tree().text_content(node).split_whitespace().collect::<Vec<_>>().join(" "),
            }),
            ElementKind::Form | ElementKind::Generic => elem.get_attr("value").map(str::to_string),
        }
    }

    /// Assign the `value` property
    pub fn set_value(&mut self, node: NodeRef, value: &str) -> DomResult<()> {
        let kind = self.tree().element(node)?.kind;
        match kind {
            ElementKind::Input | ElementKind::TextArea => {
                self.tree_mut().element_mut(node)?.control.value = Some(value.to_string());
            }
            ElementKind::Select => {
                let mut matched = false;
                for option in self.options(node) {
                    let hit = !matched && self.value(option).as_deref() == Some(value);
                    matched |= hit;
                    self.tree_mut().element_mut(option)?.control.selected = Some(hit);
                }
            }
            ElementKind::SelectOption | ElementKind::Form | ElementKind::Generic => {
                self.tree_mut().set_attribute(node, "value", value)?;
            }
        }
        Ok(())
    }

    /// Current checkedness (false for anything but inputs)
    pub fn checked(&self, node: NodeRef) -> bool {
        match self.tree().get(node).and_then(|n| n.as_element()) {
            Some(elem) if elem.kind == ElementKind::Input => {
                elem.control.checked.unwrap_or_else(|| elem.has_attr("checked"))
            }
            _ => false,
        }
    }

    /// Assign the `checked` property; ignored on non-inputs
    pub fn set_checked(&mut self, node: NodeRef, checked: bool) -> DomResult<()> {
        let elem = self.tree_mut().element_mut(node)?;
        if elem.kind == ElementKind::Input {
            elem.control.checked = Some(checked);
        }
        Ok(())
    }

    /// Files picked into a file input
    pub fn files(&self, node: NodeRef) -> &[FileEntry] {
        self.tree().get(node)
            .and_then(|n| n.as_element())
            .map(|e| e.control.files.as_slice())
            .unwrap_or(&[])
    }

    /// Pick files into a file input
    pub fn set_files(&mut self, node: NodeRef, files: Vec<FileEntry>) -> DomResult<()> {
        self.tree_mut().element_mut(node)?.control.files = files;
        Ok(())
    }

    /// Option elements inside a select, in tree order
    pub fn options(&self, select: NodeRef) -> Vec<NodeRef> {
        self.tree().descendants(select)
            .filter(|&n| self.kind(n) == Some(ElementKind::SelectOption))
            .collect()
    }

    fn option_selectedness(&self, option: NodeRef) -> bool {
        self.tree().get(option)
            .and_then(|n| n.as_element())
            .map(|e| e.control.selected.unwrap_or_else(|| e.has_attr("selected")))
            .unwrap_or(false)
    }

    /// Selected options of a select.
    ///
    /// A single-choice select always shows one option: the last one marked
    /// selected, or else the first enabled option.
    pub fn selected_options(&self, select: NodeRef) -> Vec<NodeRef> {
        let options = self.options(select);
        let selected: Vec<NodeRef> = options.iter()
            .copied()
            .filter(|&o| self.option_selectedness(o))
            .collect();
        if self.tree().attribute(select, "multiple").is_some() {
            return selected;
        }
        match selected.last() {
            Some(&last) => vec![last],
            None => options.into_iter()
                .find(|&o| self.tree().attribute(o, "disabled").is_none())
                .into_iter()
                .collect(),
        }
    }

    /// Build the entry list a form submits
    pub fn form_data(&self, form: NodeRef) -> DomResult<FormData> {
        if self.kind(form) != Some(ElementKind::Form) {
            return Err(DomError::NotAForm(form));
        }
        let mut data = FormData::new();
        for node in self.tree().descendants(form).skip(1) {
            let Some(elem) = self.tree().get(node).and_then(|n| n.as_element()) else {
                continue;
            };
            if !elem.kind.is_form_control() || elem.has_attr("disabled") {
                continue;
            }
            let name = match elem.get_attr("name") {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };
            match elem.kind {
                ElementKind::Select => {
                    for option in self.selected_options(node) {
                        data.append(&name, &self.value(option).unwrap_or_default());
                    }
                }
                ElementKind::Input => {
                    let input_type = self.input_type(node);
                    match input_type.as_str() {
                        "submit" | "button" | "reset" | "image" => {}
                        "checkbox" | "radio" => {
                            if self.checked(node) {
                                data.append(&name, &self.value(node).unwrap_or_default());
                            }
                        }
                        "file" => {
                            let files = self.files(node);
                            if files.is_empty() {
                                data.append_file(&name, FileEntry::empty());
                            }
                            for file in files {
                                data.append_file(&name, file.clone());
                            }
                        }
                        _ => data.append(&name, &self.value(node).unwrap_or_default()),
                    }
                }
                _ => data.append(&name, &self.value(node).unwrap_or_default()),
            }
        }
        Ok(data)
    }
}
