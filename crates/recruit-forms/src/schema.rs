//! Form schema as delivered by the config service
//!
//! The wire shape is a JSON object of section name to an array of field
//! rows. Section order is significant, so the schema is deserialized with
//! a map visitor rather than into a hash map.

use crate::error::RuleError;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Kind of control a field renders as
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Email,
    Tel,
    Date,
    Number,
    Textarea,
    Select,
    File,
    Radio,
    Checkbox,
    /// Unrecognized kinds fall back to a plain text input
    #[serde(other)]
    Text,
}

impl FieldKind {
    /// Kinds whose value is free text typed by the applicant
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            FieldKind::Text
                | FieldKind::Email
                | FieldKind::Tel
                | FieldKind::Date
                | FieldKind::Number
                | FieldKind::Textarea
        )
    }

    /// Kinds whose value is one of the declared options
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldKind::Select | FieldKind::Radio)
    }

    /// HTML-style input type for single-line inputs
    pub fn input_type(&self) -> &'static str {
        match self {
            FieldKind::Email => "email",
            FieldKind::Tel => "tel",
            FieldKind::Date => "date",
            FieldKind::Number => "number",
            FieldKind::File => "file",
            FieldKind::Radio => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Select => "select",
            FieldKind::Textarea => "textarea",
            FieldKind::Text => "text",
        }
    }
}

/// Extra constraints beyond required-ness
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RuleSet {
    /// True when no constraint is declared
    pub fn is_empty(&self) -> bool {
        self.min_length.is_none() && self.max_length.is_none() && self.pattern.is_none()
    }
}

/// Schema-declared definition of one form field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub required: bool,
    #[serde(default, deserialize_with = "deserialize_options")]
    pub options: Vec<String>,
    /// Raw rule JSON as stored server-side, usually a JSON-encoded string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<serde_json::Value>,
}

impl FieldDescriptor {
    /// Create a descriptor with no options and no rules
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required,
            options: Vec::new(),
            validations: None,
        }
    }

    /// Attach declared options (select/radio)
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a rule set, stored in the same encoded form the server uses
    pub fn with_rules(mut self, rules: &RuleSet) -> Self {
        self.validations = serde_json::to_string(rules).ok().map(serde_json::Value::String);
        self
    }

    /// Parse the declared rules.
    ///
    /// Absent, null and blank rule strings mean "no rules". Anything else
    /// that is not a rule object is an error the caller is expected to
    /// degrade from.
    pub fn rules(&self) -> Result<RuleSet, RuleError> {
        match &self.validations {
            None | Some(serde_json::Value::Null) => Ok(RuleSet::default()),
            Some(serde_json::Value::String(raw)) if raw.trim().is_empty() => Ok(RuleSet::default()),
            Some(serde_json::Value::String(raw)) => Ok(serde_json::from_str(raw)?),
            Some(other) => Ok(serde_json::from_value(other.clone())?),
        }
    }
}

/// `required` arrives as a bool or as a 0/1 database column
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        None => false,
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(n)) => n != 0,
        Some(Flag::Text(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
    })
}

/// `options` arrives as an array or as a comma-separated string
fn deserialize_options<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Options {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Option::<Options>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Options::List(list)) => list,
        Some(Options::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    })
}

/// Ordered mapping from section name to its fields
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    sections: Vec<(String, Vec<FieldDescriptor>)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the config-service JSON body
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Append a section, keeping insertion order
    pub fn with_section(mut self, name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        self.push_section(name, fields);
        self
    }

    pub fn push_section(&mut self, name: impl Into<String>, fields: Vec<FieldDescriptor>) {
        self.sections.push((name.into(), fields));
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|(n, _)| n == name)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &[FieldDescriptor])> {
        self.sections.iter().map(|(n, f)| (n.as_str(), f.as_slice()))
    }

    pub fn into_sections(self) -> Vec<(String, Vec<FieldDescriptor>)> {
        self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (name, fields) in &self.sections {
            map.serialize_entry(name, fields)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of section name to field array")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Schema, A::Error> {
                let mut schema = Schema::new();
                while let Some((name, fields)) = access.next_entry::<String, Vec<FieldDescriptor>>()? {
                    if schema.has_section(&name) {
                        return Err(de::Error::custom(format!("duplicate section `{}`", name)));
                    }
                    schema.push_section(name, fields);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}
