//! Validation rule evaluation
//!
//! Checks run in a fixed order and the first failure wins:
//! required, minimum length, maximum length, pattern. Length and pattern
//! only apply once a value is present, so an optional empty field is
//! always valid.
//!
//! Patterns come from server-controlled JSON and are treated as untrusted:
//! they are compiled once per field with a bounded program size, and the
//! `regex` engine guarantees linear-time matching. A pattern that fails to
//! compile is dropped rather than blocking the form.

use crate::error::RuleError;
use crate::schema::{FieldDescriptor, RuleSet};
use crate::value::FieldValue;
use regex::{Regex, RegexBuilder};

/// Outcome of evaluating one field
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationVerdict {
    Valid,
    Invalid(String),
}

impl ValidationVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationVerdict::Valid)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ValidationVerdict::Valid => None,
            ValidationVerdict::Invalid(msg) => Some(msg),
        }
    }
}

/// A field's rule set with its pattern compiled
#[derive(Clone, Debug, Default)]
pub struct CompiledRules {
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    error_message: Option<String>,
}

impl CompiledRules {
    /// Compile a rule set, failing on a bad or oversized pattern
    pub fn compile(rules: &RuleSet, size_limit: usize) -> Result<Self, RuleError> {
        let pattern = match rules.pattern.as_deref() {
            Some(p) if !p.is_empty() => Some(compile_pattern(p, size_limit)?),
            _ => None,
        };
        Ok(Self {
            min_length: rules.min_length,
            max_length: rules.max_length,
            pattern,
            error_message: rules.error_message.clone(),
        })
    }

    /// Compile a descriptor's rules, degrading to whatever part is usable.
    ///
    /// Malformed rule JSON yields no rules at all; a bad pattern drops only
    /// the pattern and keeps the length limits.
    pub fn for_field(descriptor: &FieldDescriptor, size_limit: usize) -> Self {
        let rules = match descriptor.rules() {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!(field = %descriptor.name, error = %e, "ignoring malformed validation rules");
                return Self::default();
            }
        };
        if rules.is_empty() {
            return Self::default();
        }

        match Self::compile(&rules, size_limit) {
            Ok(compiled) => compiled,
            Err(e) => {
                tracing::warn!(field = %descriptor.name, error = %e, "ignoring validation pattern");
                Self {
                    min_length: rules.min_length,
                    max_length: rules.max_length,
                    pattern: None,
                    error_message: rules.error_message,
                }
            }
        }
    }
}

fn compile_pattern(pattern: &str, size_limit: usize) -> Result<Regex, RuleError> {
    // Full-value match, like an HTML pattern attribute
    RegexBuilder::new(&format!("^(?:{})$", pattern))
        .size_limit(size_limit)
        .dfa_size_limit(size_limit)
        .build()
        .map_err(|e| match e {
            regex::Error::CompiledTooBig(limit) => RuleError::PatternTooLarge(limit),
            other => RuleError::Pattern(other.to_string()),
        })
}

/// Evaluate a field's current value against its rules
pub fn evaluate(descriptor: &FieldDescriptor, rules: &CompiledRules, value: &FieldValue) -> ValidationVerdict {
    let label = descriptor.label.as_str();

    if value.is_empty() {
        return if descriptor.required {
            ValidationVerdict::Invalid(format!("{} is required.", label))
        } else {
            ValidationVerdict::Valid
        };
    }

    let subject = match value.rule_subject() {
        Some(s) if !s.is_empty() => s,
        _ => return ValidationVerdict::Valid,
    };
    let length = subject.chars().count();

    if let Some(min) = rules.min_length {
        if length < min {
            return ValidationVerdict::Invalid(format!("{} must be at least {} characters.", label, min));
        }
    }

    if let Some(max) = rules.max_length {
        if length > max {
            return ValidationVerdict::Invalid(format!("{} must not exceed {} characters.", label, max));
        }
    }

    if let Some(pattern) = &rules.pattern {
        if !pattern.is_match(subject) {
            let message = rules
                .error_message
                .clone()
                .unwrap_or_else(|| format!("Invalid {} format.", label.to_lowercase()));
            return ValidationVerdict::Invalid(message);
        }
    }

    ValidationVerdict::Valid
}
