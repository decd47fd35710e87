//! Live field values

use crate::schema::FieldKind;
use bytes::Bytes;

/// A file picked for a file-type field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FileAttachment {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Current value of a field, typed per field kind
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// text, email, tel, date, number, textarea
    Text(String),
    /// checkbox
    Flag(bool),
    /// select, radio
    Choice(Option<String>),
    /// file
    File(Option<FileAttachment>),
}

impl FieldValue {
    /// Initial value for a freshly rendered control
    pub fn empty_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Checkbox => FieldValue::Flag(false),
            FieldKind::Select | FieldKind::Radio => FieldValue::Choice(None),
            FieldKind::File => FieldValue::File(None),
            _ => FieldValue::Text(String::new()),
        }
    }

    /// Emptiness as the required check sees it
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Flag(checked) => !checked,
            FieldValue::Choice(choice) => choice.as_deref().map_or(true, |c| c.trim().is_empty()),
            FieldValue::File(file) => file.as_ref().map_or(true, |f| f.file_name.is_empty()),
        }
    }

    /// String the length and pattern rules apply to.
    ///
    /// Text is trimmed, a file contributes its name, a checkbox has none.
    pub fn rule_subject(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.trim()),
            FieldValue::Choice(choice) => choice.as_deref().map(str::trim),
            FieldValue::File(file) => file.as_ref().map(|f| f.file_name.as_str()),
            FieldValue::Flag(_) => None,
        }
    }

    /// Whether this value shape fits a field of `kind`
    pub fn fits(&self, kind: FieldKind) -> bool {
        match self {
            FieldValue::Text(_) => kind.is_text_like(),
            FieldValue::Flag(_) => kind == FieldKind::Checkbox,
            FieldValue::Choice(_) => kind.is_choice(),
            FieldValue::File(_) => kind == FieldKind::File,
        }
    }

    /// Form-data encoding used on submission; files are carried separately
    pub fn to_form_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Flag(checked) => Some(checked.to_string()),
            FieldValue::Choice(choice) => Some(choice.clone().unwrap_or_default()),
            FieldValue::File(_) => None,
        }
    }
}
