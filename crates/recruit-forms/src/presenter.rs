//! Presentation seam
//!
//! The presenter draws what the engine tells it to. It never validates
//! and never holds field state of its own.

use crate::plan::RenderPlan;
use crate::tracker::Progress;

/// Visual verdict of a field
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldState {
    /// Edited since the last verdict; any shown error is cleared
    Pending,
    Valid,
    Invalid(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Toast-style notification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

pub trait Presenter {
    fn render(&mut self, plan: &RenderPlan);

    /// Show a value the engine set on the applicant's behalf
    fn fill(&mut self, _field: &str, _display: &str) {}

    fn show_field_state(&mut self, field: &str, state: FieldState);

    fn show_progress(&mut self, progress: &Progress);

    fn focus(&mut self, field: &str);

    fn set_submit_enabled(&mut self, enabled: bool);

    fn notify(&mut self, notice: Notice);
}
