//! Terminal presenter

use colored::Colorize;
use recruit_forms::{Control, FieldState, Notice, NoticeLevel, Presenter, Progress, RenderPlan, SectionStatus};
use std::collections::BTreeMap;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Section")]
    section: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Draws the form as plain terminal text
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    /// Suppress the layout dump, e.g. for `apply`
    quiet: bool,
    progress: Option<Progress>,
    invalid: BTreeMap<String, String>,
}

impl TerminalPresenter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet, ..Default::default() }
    }

    pub fn invalid_fields(&self) -> &BTreeMap<String, String> {
        &self.invalid
    }

    pub fn print_progress(&self) {
        let Some(progress) = &self.progress else { return };
        let rows: Vec<StepRow> = progress
            .steps
            .iter()
            .enumerate()
            .map(|(idx, step)| StepRow {
                step: idx + 1,
                section: step.section.clone(),
                status: match step.status {
                    SectionStatus::Complete => "complete".green().to_string(),
                    SectionStatus::Partial => "partial".yellow().to_string(),
                    SectionStatus::Empty => "empty".dimmed().to_string(),
                },
            })
            .collect();
        println!("{}", Table::new(rows));
        println!(
            "Progress: {}/{} required fields ({}%)",
            progress.completed, progress.total, progress.percent
        );
    }
}

fn describe(control: &Control) -> String {
    match control {
        Control::Input { input_type } => format!("<{}>", input_type),
        Control::TextArea => "<textarea>".into(),
        Control::Select { options } => format!("select: {}", options.join(" | ")),
        Control::RadioGroup { options } => format!("one of: {}", options.join(" | ")),
        Control::Checkbox => "[ ]".into(),
        Control::FileUpload { accept } => match accept {
            Some(ext) => format!("<file {}>", ext),
            None => "<file>".into(),
        },
    }
}

impl Presenter for TerminalPresenter {
    fn render(&mut self, plan: &RenderPlan) {
        if self.quiet {
            return;
        }
        for section in &plan.sections {
            println!("{}", format!("{}. {}", section.step, section.name).bold());
            for field in &section.fields {
                let marker = if field.required { "*".red().to_string() } else { " ".into() };
                let lock = if field.read_only { " (from your account)" } else { "" };
                println!("  {}{:<24} {}{}", marker, field.label, describe(&field.control).dimmed(), lock);
                println!("   {}", field.name.dimmed());
            }
        }
    }

    fn fill(&mut self, field: &str, text: &str) {
        tracing::debug!(field = %field, value = %text, "filled");
    }

    fn show_field_state(&mut self, field: &str, state: FieldState) {
        match state {
            FieldState::Invalid(message) => {
                self.invalid.insert(field.to_string(), message);
            }
            FieldState::Valid | FieldState::Pending => {
                self.invalid.remove(field);
            }
        }
    }

    fn show_progress(&mut self, progress: &Progress) {
        self.progress = Some(progress.clone());
    }

    fn focus(&mut self, field: &str) {
        if let Some(message) = self.invalid.get(field) {
            eprintln!("{} {}: {}", "→".red(), field.bold(), message);
        }
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        if !enabled {
            println!("{}", "Submitting application...".dimmed());
        }
    }

    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => println!("{} {}", "✔".green(), notice.message),
            NoticeLevel::Info => println!("{}", notice.message),
            NoticeLevel::Error => eprintln!("{} {}", "✘".red(), notice.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_clears_shown_error() {
        let mut presenter = TerminalPresenter::new(true);
        presenter.show_field_state("phone", FieldState::Invalid("Invalid phone format.".into()));
        assert_eq!(presenter.invalid_fields()["phone"], "Invalid phone format.");

        presenter.fill("phone", "5550100");
        presenter.show_field_state("phone", FieldState::Pending);
        assert!(presenter.invalid_fields().is_empty());
    }
}
