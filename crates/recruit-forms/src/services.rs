//! External collaborators: schema source and submission sink

use crate::error::{ConfigLoadError, SubmissionError};
use crate::schema::Schema;
use crate::value::FileAttachment;
use async_trait::async_trait;

/// Assembled application, ready to send
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    /// Every non-file field in schema order
    pub fields: Vec<(String, String)>,
    /// (field name, attachment) for each selected file
    pub files: Vec<(String, FileAttachment)>,
}

impl Submission {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn file(&self, name: &str) -> Option<&FileAttachment> {
        self.files.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }
}

/// Server acknowledgement of a successful submission
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub message: Option<String>,
}

/// Source of the form schema
#[async_trait]
pub trait ConfigService: Send + Sync {
    async fn fetch_schema(&self) -> Result<Schema, ConfigLoadError>;
}

/// Sink for completed applications
#[async_trait]
pub trait SubmissionService: Send + Sync {
    async fn submit(&self, submission: Submission) -> Result<SubmissionReceipt, SubmissionError>;
}
