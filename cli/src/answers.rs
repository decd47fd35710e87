//! Answers file: TOML table of field name to value

use anyhow::{Context, Result};
use recruit_forms::{
    FieldKind, FieldValue, FileAttachment, FormEngine, FormsError, Interaction, Presenter, EMAIL_FIELD, NAME_FIELD,
};
use std::collections::BTreeMap;
use std::path::Path;

pub type Answers = BTreeMap<String, toml::Value>;

pub fn load(path: &Path) -> Result<Answers> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_cv(path: &Path) -> Result<FileAttachment> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let is_pdf = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
    let content_type = if is_pdf { "application/pdf" } else { "application/octet-stream" };
    Ok(FileAttachment::new(file_name, content_type, bytes))
}

fn as_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_flag(value: &toml::Value) -> bool {
    match value {
        toml::Value::Boolean(b) => *b,
        toml::Value::Integer(n) => *n != 0,
        other => matches!(as_text(other).to_ascii_lowercase().as_str(), "true" | "yes" | "on" | "1"),
    }
}

/// Interactions an applicant would produce to enter `value` into a field of `kind`
pub fn interactions_for(kind: FieldKind, value: &toml::Value) -> Vec<Interaction> {
    match kind {
        FieldKind::Checkbox => vec![Interaction::Commit(FieldValue::Flag(as_flag(value)))],
        FieldKind::Select | FieldKind::Radio => {
            let text = as_text(value);
            let choice = Some(text).filter(|t| !t.trim().is_empty());
            vec![Interaction::Commit(FieldValue::Choice(choice))]
        }
        FieldKind::File => Vec::new(),
        _ => vec![Interaction::Input(FieldValue::Text(as_text(value))), Interaction::Blur],
    }
}

/// Feed answers into the engine in schema order.
///
/// Returns the answer keys that were not applied: no editable field by
/// that name, or a value the field does not accept.
pub fn apply<P: Presenter>(engine: &mut FormEngine<P>, answers: &Answers, cv: Option<FileAttachment>, cv_field: &str) -> Result<Vec<String>> {
    let fields: Vec<(String, FieldKind)> = engine
        .registry()
        .all_fields()
        .map(|f| (f.name.clone(), f.kind))
        .collect();

    let mut rejected = Vec::new();
    for (name, kind) in &fields {
        if name == NAME_FIELD || name == EMAIL_FIELD {
            continue;
        }
        let Some(value) = answers.get(name) else { continue };
        for interaction in interactions_for(*kind, value) {
            match engine.on_interaction(name, interaction) {
                Ok(_) => {}
                Err(FormsError::ValueMismatch(field)) => {
                    rejected.push(field);
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    if let Some(file) = cv {
        let target = fields
            .iter()
            .find(|(name, kind)| name == cv_field && *kind == FieldKind::File)
            .or_else(|| fields.iter().find(|(_, kind)| *kind == FieldKind::File));
        match target {
            Some((name, _)) => {
                engine.on_interaction(name, Interaction::Commit(FieldValue::File(Some(file))))?;
            }
            None => tracing::warn!("form has no file field for the CV"),
        }
    }

    let editable = |key: &String| {
        key != NAME_FIELD
            && key != EMAIL_FIELD
            && fields.iter().any(|(name, kind)| name == key && *kind != FieldKind::File)
    };
    let mut ignored: Vec<String> = answers.keys().filter(|k| !editable(k)).cloned().collect();
    ignored.extend(rejected);
    Ok(ignored)
}
