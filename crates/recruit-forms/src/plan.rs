//! Render plan - presentation-agnostic description of what to draw

use crate::registry::FieldRegistry;
use crate::schema::{FieldDescriptor, FieldKind};
use serde::Serialize;

/// Control to draw for one field
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    /// Single-line input; `input_type` is email, tel, date, number or text
    Input { input_type: &'static str },
    TextArea,
    Select { options: Vec<String> },
    RadioGroup { options: Vec<String> },
    Checkbox,
    FileUpload { accept: Option<String> },
}

impl Control {
    pub fn for_field(descriptor: &FieldDescriptor) -> Self {
        match descriptor.kind {
            FieldKind::Text | FieldKind::Email | FieldKind::Tel | FieldKind::Date | FieldKind::Number => {
                Control::Input { input_type: descriptor.kind.input_type() }
            }
            FieldKind::Textarea => Control::TextArea,
            FieldKind::Select => Control::Select { options: descriptor.options.clone() },
            FieldKind::Radio => Control::RadioGroup { options: descriptor.options.clone() },
            FieldKind::Checkbox => Control::Checkbox,
            FieldKind::File => Control::FileUpload { accept: None },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ControlPlan {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub read_only: bool,
    #[serde(flatten)]
    pub control: Control,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionPlan {
    /// 1-based step number shown in the progress indicator
    pub step: usize,
    pub name: String,
    pub fields: Vec<ControlPlan>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenderPlan {
    pub sections: Vec<SectionPlan>,
}

impl RenderPlan {
    /// Build the plan for a registry; `read_only` names fields the applicant cannot edit
    pub fn build(registry: &FieldRegistry, read_only: &[&str], cv_field: &str) -> Self {
        let sections = registry
            .sections_in_order()
            .iter()
            .enumerate()
            .map(|(idx, section)| SectionPlan {
                step: idx + 1,
                name: section.name.clone(),
                fields: section
                    .fields
                    .iter()
                    .map(|field| {
                        let mut control = Control::for_field(field);
                        if field.name == cv_field {
                            control = Control::FileUpload { accept: Some(".pdf".into()) };
                        }
                        ControlPlan {
                            name: field.name.clone(),
                            label: field.label.clone(),
                            required: field.required,
                            read_only: read_only.contains(&field.name.as_str()),
                            control,
                        }
                    })
                    .collect(),
            })
            .collect();
        Self { sections }
    }

    pub fn find(&self, name: &str) -> Option<&ControlPlan> {
        self.sections.iter().flat_map(|s| s.fields.iter()).find(|c| c.name == name)
    }

    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }
}
