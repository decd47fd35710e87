//! Engine settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Quiet period before a draft is written
    pub debounce_ms: u64,
    /// Upper bound on a compiled rule pattern, in bytes
    pub pattern_size_limit: usize,
    /// Section appended when the schema has no CV upload
    pub cv_section: String,
    /// Name of the appended CV field, also its multipart part name
    pub cv_field: String,
    /// Draft key prefix; the applicant's email is appended
    pub draft_key_prefix: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            pattern_size_limit: 256 * 1024,
            cv_section: "CV / Resume Upload".into(),
            cv_field: "cv-resume".into(),
            draft_key_prefix: "application-draft:".into(),
        }
    }
}

impl EngineSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
