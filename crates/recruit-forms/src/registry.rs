//! Field Registry - holds the loaded schema and derives flattened views

use crate::error::{FormsError, Result};
use crate::rules::CompiledRules;
use crate::schema::{FieldDescriptor, Schema};
use std::collections::HashMap;

/// One schema section with its fields in declared order
#[derive(Clone, Debug)]
pub struct Section {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl Section {
    /// Required fields of this section
    pub fn required(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.required)
    }
}

/// Loaded schema with name lookup and compiled rules
#[derive(Debug, Default)]
pub struct FieldRegistry {
    sections: Vec<Section>,
    /// field name -> (section index, field index)
    index: HashMap<String, (usize, usize)>,
    rules: HashMap<String, CompiledRules>,
}

impl FieldRegistry {
    /// Load a schema, rejecting it if a field name appears twice
    pub fn load(schema: Schema, pattern_size_limit: usize) -> Result<Self> {
        let mut sections = Vec::with_capacity(schema.len());
        let mut index = HashMap::new();
        let mut rules = HashMap::new();

        for (s_idx, (name, fields)) in schema.into_sections().into_iter().enumerate() {
            for (f_idx, field) in fields.iter().enumerate() {
                if let Some(&(prev, _)) = index.get(&field.name) {
                    // the current section is not pushed yet
                    let first_section = sections.get(prev).map_or_else(|| name.clone(), |s: &Section| s.name.clone());
                    return Err(FormsError::DuplicateField {
                        name: field.name.clone(),
                        first_section,
                        second_section: name,
                    });
                }
                index.insert(field.name.clone(), (s_idx, f_idx));
                rules.insert(field.name.clone(), CompiledRules::for_field(field, pattern_size_limit));
            }
            sections.push(Section { name, fields });
        }

        tracing::debug!(sections = sections.len(), fields = index.len(), "schema loaded");

        Ok(Self { sections, index, rules })
    }

    /// All fields flattened across sections, order preserved
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn find(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&(s, f)| &self.sections[s].fields[f])
    }

    /// Compiled rules for a field; empty for unknown names
    pub fn rules(&self, name: &str) -> Option<&CompiledRules> {
        self.rules.get(name)
    }

    pub fn sections_in_order(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
