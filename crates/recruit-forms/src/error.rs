//! Error types for the form engine

use thiserror::Error;

/// Form engine error type
#[derive(Error, Debug)]
pub enum FormsError {
    /// Two sections declare the same field name
    #[error("duplicate field `{name}` in sections `{first_section}` and `{second_section}`")]
    DuplicateField {
        name: String,
        first_section: String,
        second_section: String,
    },

    /// Interaction addressed a field the schema does not define
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Value shape does not match the field's kind
    #[error("value does not fit field: {0}")]
    ValueMismatch(String),

    /// Interaction addressed an identity-derived field
    #[error("field is read-only: {0}")]
    ReadOnlyField(String),

    /// Session did not supply the applicant's name or email
    #[error("missing identity: {0}")]
    MissingIdentity(&'static str),

    /// Submission gated by one or more invalid fields
    #[error("{failures} field(s) invalid, first: {first_field}: {message}")]
    ValidationFailed {
        first_field: String,
        message: String,
        failures: usize,
    },

    /// Submission service reported a failure
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// Draft store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for the form engine
pub type Result<T> = std::result::Result<T, FormsError>;

/// Malformed validation rules attached to a field.
///
/// Never fatal: the offending rule is dropped and the field keeps rendering.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("malformed rule JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(String),

    #[error("pattern exceeds size limit of {0} bytes")]
    PatternTooLarge(usize),
}

/// Failure fetching the form schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigLoadError {
    #[error("could not reach form service: {0}")]
    Network(String),

    #[error("form configuration unavailable: {status} {status_text}")]
    Http { status: u16, status_text: String },

    #[error("form configuration is malformed: {0}")]
    Decode(String),
}

/// Failure submitting the application
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// Request never reached the server
    #[error("network error: please check your connection and try again ({0})")]
    Network(String),

    /// Server answered with a non-success status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Draft store failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
