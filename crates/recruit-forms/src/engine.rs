//! Form Engine - orchestrates registry, rules, tracker and drafts
//!
//! Interactions come in two weights. `Input` is the cheap path for raw
//! keystrokes: it stores the value, marks the field pending and refreshes
//! progress from the current completion set. `Commit` and `Blur` run the
//! full evaluation, record the verdict and only then refresh progress, so
//! progress never lags the event that triggered it.

use crate::config::EngineSettings;
use crate::debounce::Debouncer;
use crate::error::{FormsError, Result};
use crate::persistence::{PersistenceAdapter, SnapshotStore, SnapshotValue};
use crate::plan::RenderPlan;
use crate::presenter::{FieldState, Notice, Presenter};
use crate::registry::FieldRegistry;
use crate::rules::{self, ValidationVerdict};
use crate::schema::{FieldDescriptor, FieldKind, RuleSet, Schema};
use crate::services::{Submission, SubmissionReceipt, SubmissionService};
use crate::tracker::{CompletionTracker, Progress};
use crate::value::FieldValue;
use crate::{EMAIL_FIELD, NAME_FIELD};
use std::collections::HashMap;
use std::sync::Arc;

const IDENTITY_FIELDS: [&str; 2] = [NAME_FIELD, EMAIL_FIELD];

/// Signed-in applicant supplied by the session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    name: String,
    email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { name: name.into(), email: email.into() }
    }

    /// Both values must be present before the form may load.
    ///
    /// Present-but-empty values pass here and are caught by validation
    /// of the read-only identity fields instead.
    pub fn from_session(name: Option<String>, email: Option<String>) -> Result<Self> {
        let name = name.ok_or(FormsError::MissingIdentity("name"))?;
        let email = email.ok_or(FormsError::MissingIdentity("email"))?;
        Ok(Self { name, email })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    fn value_for(&self, field: &str) -> Option<&str> {
        match field {
            NAME_FIELD => Some(&self.name),
            EMAIL_FIELD => Some(&self.email),
            _ => None,
        }
    }
}

/// Applicant interaction with one field
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interaction {
    /// Raw change while typing
    Input(FieldValue),
    /// Settled change: select, radio, checkbox or file pick
    Commit(FieldValue),
    /// Focus left the field
    Blur,
}

pub struct FormEngine<P: Presenter> {
    settings: EngineSettings,
    registry: FieldRegistry,
    tracker: CompletionTracker,
    plan: RenderPlan,
    values: HashMap<String, FieldValue>,
    identity: Identity,
    presenter: P,
    drafts: Option<Arc<PersistenceAdapter>>,
    debouncer: Debouncer,
}

impl<P: Presenter> FormEngine<P> {
    /// Load the schema, render it and seed the identity fields
    pub fn initialize(mut schema: Schema, identity: Identity, presenter: P, settings: EngineSettings) -> Result<Self> {
        let has_cv_field = schema
            .sections()
            .any(|(_, fields)| fields.iter().any(|f| f.name == settings.cv_field));
        if !schema.has_section(&settings.cv_section) && !has_cv_field {
            tracing::debug!(section = %settings.cv_section, "appending CV upload section");
            schema.push_section(settings.cv_section.clone(), vec![cv_field(&settings.cv_field)]);
        }

        let registry = FieldRegistry::load(schema, settings.pattern_size_limit)?;
        let tracker = CompletionTracker::new(&registry);
        let plan = RenderPlan::build(&registry, &IDENTITY_FIELDS, &settings.cv_field);
        let values = registry
            .all_fields()
            .map(|f| (f.name.clone(), FieldValue::empty_for(f.kind)))
            .collect();

        let mut engine = Self {
            debouncer: Debouncer::new(settings.debounce()),
            settings,
            registry,
            tracker,
            plan,
            values,
            identity,
            presenter,
            drafts: None,
        };

        engine.presenter.render(&engine.plan);
        engine.seed_identity();
        engine.refresh_progress();

        tracing::info!(
            sections = engine.plan.sections.len(),
            fields = engine.registry.len(),
            required = engine.tracker.required_total(),
            "form initialized"
        );

        Ok(engine)
    }

    fn seed_identity(&mut self) {
        for field in IDENTITY_FIELDS {
            let Some(descriptor) = self.registry.find(field) else { continue };
            if !descriptor.kind.is_text_like() {
                continue;
            }
            let value = self.identity.value_for(field).unwrap_or_default().to_string();
            self.presenter.fill(field, &value);
            self.values.insert(field.to_string(), FieldValue::Text(value));
            self.check(field);
        }
    }

    /// Attach a draft store and restore any saved draft.
    ///
    /// Returns the number of fields restored.
    pub fn attach_drafts(&mut self, store: Arc<dyn SnapshotStore>) -> Result<usize> {
        let email = Some(self.identity.email()).filter(|e| !e.trim().is_empty());
        self.drafts = Some(Arc::new(PersistenceAdapter::new(store, &self.settings.draft_key_prefix, email)));
        self.restore_draft()
    }

    /// Replay the saved draft through the normal interaction paths
    pub fn restore_draft(&mut self) -> Result<usize> {
        let Some(adapter) = self.drafts.clone() else { return Ok(0) };
        let snapshot = adapter.load()?;
        let mut restored = 0;

        for (name, stored) in &snapshot {
            let Some(descriptor) = self.registry.find(name) else { continue };
            if descriptor.kind == FieldKind::File || IDENTITY_FIELDS.contains(&name.as_str()) {
                continue;
            }
            let text_like = descriptor.kind.is_text_like();
            let Some(value) = restore_value(descriptor, stored) else { continue };

            if let Some(display) = value.to_form_text() {
                self.presenter.fill(name, &display);
            }
            if text_like {
                self.handle(name, Interaction::Input(value), false)?;
                self.handle(name, Interaction::Blur, false)?;
            } else {
                self.handle(name, Interaction::Commit(value), false)?;
            }
            restored += 1;
        }

        if restored > 0 {
            tracing::info!(fields = restored, "draft restored");
            self.presenter
                .notify(Notice::info(format!("Restored {} answers from your saved draft.", restored)));
        }
        Ok(restored)
    }

    /// Feed one applicant interaction into the engine.
    ///
    /// Returns the verdict when the interaction ran full validation.
    pub fn on_interaction(&mut self, field: &str, interaction: Interaction) -> Result<Option<ValidationVerdict>> {
        self.handle(field, interaction, true)
    }

    fn handle(&mut self, field: &str, interaction: Interaction, persist: bool) -> Result<Option<ValidationVerdict>> {
        if self.registry.find(field).is_none() {
            return Err(FormsError::UnknownField(field.to_string()));
        }
        if IDENTITY_FIELDS.contains(&field) {
            return Err(FormsError::ReadOnlyField(field.to_string()));
        }

        match interaction {
            Interaction::Input(value) => {
                self.store_value(field, value)?;
                self.presenter.show_field_state(field, FieldState::Pending);
                if self.values.get(field).map_or(true, FieldValue::is_empty) {
                    self.tracker.forget(field);
                }
                self.refresh_progress();
                if persist {
                    self.schedule_save();
                }
                Ok(None)
            }
            Interaction::Commit(value) => {
                self.store_value(field, value)?;
                let verdict = self.validate_field(field);
                if persist {
                    self.schedule_save();
                }
                Ok(Some(verdict))
            }
            Interaction::Blur => Ok(Some(self.validate_field(field))),
        }
    }

    /// Store a value after checking it against the field's kind.
    ///
    /// A blank choice is stored as unset; any other choice must be one of
    /// the declared options.
    fn store_value(&mut self, field: &str, value: FieldValue) -> Result<()> {
        let Some(descriptor) = self.registry.find(field) else {
            return Err(FormsError::UnknownField(field.to_string()));
        };
        if !value.fits(descriptor.kind) {
            return Err(FormsError::ValueMismatch(field.to_string()));
        }
        let value = match value {
            FieldValue::Choice(Some(choice)) if choice.trim().is_empty() => FieldValue::Choice(None),
            FieldValue::Choice(Some(choice)) => {
                if !descriptor.options.iter().any(|o| *o == choice) {
                    return Err(FormsError::ValueMismatch(field.to_string()));
                }
                FieldValue::Choice(Some(choice))
            }
            other => other,
        };
        self.values.insert(field.to_string(), value);
        Ok(())
    }

    /// Full evaluation of one field followed by a progress refresh
    pub fn validate_field(&mut self, field: &str) -> ValidationVerdict {
        let verdict = self.check(field);
        self.refresh_progress();
        verdict
    }

    /// Evaluate, record and show one field's verdict
    fn check(&mut self, field: &str) -> ValidationVerdict {
        let Some(descriptor) = self.registry.find(field) else {
            return ValidationVerdict::Valid;
        };
        let empty = FieldValue::empty_for(descriptor.kind);
        let value = self.values.get(field).unwrap_or(&empty);
        let verdict = match self.registry.rules(field) {
            Some(compiled) => rules::evaluate(descriptor, compiled, value),
            None => rules::evaluate(descriptor, &Default::default(), value),
        };
        let has_value = !value.is_empty();

        self.tracker.record(field, &verdict, has_value);
        tracing::debug!(field = %field, valid = verdict.is_valid(), "field evaluated");

        let state = match &verdict {
            ValidationVerdict::Valid => FieldState::Valid,
            ValidationVerdict::Invalid(msg) => FieldState::Invalid(msg.clone()),
        };
        self.presenter.show_field_state(field, state);
        verdict
    }

    fn refresh_progress(&mut self) {
        let progress = self.tracker.progress();
        self.presenter.show_progress(&progress);
    }

    fn schedule_save(&mut self) {
        let Some(adapter) = &self.drafts else { return };
        if adapter.key().is_none() {
            return;
        }
        let snapshot = PersistenceAdapter::snapshot(&self.registry, &self.values);
        let adapter = Arc::clone(adapter);
        self.debouncer.schedule(move || {
            if let Err(e) = adapter.write_snapshot(&snapshot) {
                tracing::warn!(error = %e, "failed to save draft");
            }
        });
    }

    /// Validate every field and, if all pass, hand the application to `service`.
    ///
    /// The submit control stays disabled while the request is in flight.
    pub async fn submit<S>(&mut self, service: &S) -> Result<SubmissionReceipt>
    where
        S: SubmissionService + ?Sized,
    {
        let names: Vec<String> = self.registry.all_fields().map(|f| f.name.clone()).collect();
        let mut failures = Vec::new();
        for name in &names {
            if let ValidationVerdict::Invalid(msg) = self.check(name) {
                failures.push((name.clone(), msg));
            }
        }
        self.refresh_progress();

        if let Some((first_field, message)) = failures.first().cloned() {
            tracing::info!(invalid = failures.len(), first = %first_field, "submission blocked by validation");
            self.presenter.focus(&first_field);
            self.presenter.notify(Notice::error("Please fix the highlighted fields before submitting."));
            return Err(FormsError::ValidationFailed { first_field, message, failures: failures.len() });
        }

        let submission = self.assemble();
        tracing::info!(fields = submission.fields.len(), files = submission.files.len(), "submitting application");

        self.presenter.set_submit_enabled(false);
        let outcome = service.submit(submission).await;
        self.presenter.set_submit_enabled(true);

        match outcome {
            Ok(receipt) => {
                tracing::info!("application submitted");
                if let Err(e) = self.clear_draft() {
                    tracing::warn!(error = %e, "failed to clear draft after submission");
                }
                let message = receipt.message.clone().unwrap_or_else(|| "Application submitted successfully.".into());
                self.presenter.notify(Notice::success(message));
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(error = %e, "submission failed");
                self.presenter.notify(Notice::error(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Cancel any pending draft write and delete the stored draft
    pub fn clear_draft(&mut self) -> Result<()> {
        self.debouncer.cancel();
        if let Some(adapter) = &self.drafts {
            adapter.clear()?;
        }
        Ok(())
    }

    /// Write the draft immediately, replacing any pending debounced write
    pub fn flush_draft(&mut self) -> Result<()> {
        self.debouncer.cancel();
        if let Some(adapter) = &self.drafts {
            adapter.save(&self.registry, &self.values)?;
        }
        Ok(())
    }

    /// All field values in schema order, files split out
    pub fn assemble(&self) -> Submission {
        let mut submission = Submission { fields: Vec::new(), files: Vec::new() };
        for field in self.registry.all_fields() {
            match self.values.get(&field.name) {
                Some(FieldValue::File(Some(file))) => submission.files.push((field.name.clone(), file.clone())),
                Some(value) => {
                    if let Some(text) = value.to_form_text() {
                        submission.fields.push((field.name.clone(), text));
                    }
                }
                None => {}
            }
        }
        submission
    }

    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn progress(&self) -> Progress {
        self.tracker.progress()
    }

    pub fn tracker(&self) -> &CompletionTracker {
        &self.tracker
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn plan(&self) -> &RenderPlan {
        &self.plan
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn has_pending_save(&self) -> bool {
        self.debouncer.is_pending()
    }
}

fn cv_field(name: &str) -> FieldDescriptor {
    FieldDescriptor::new(name, "CV / Resume", FieldKind::File, true).with_rules(&RuleSet {
        pattern: Some(r"(?i).+\.pdf".into()),
        error_message: Some("Please upload your CV as a PDF file.".into()),
        ..Default::default()
    })
}

/// Turn a stored draft value back into a live value for `descriptor`
fn restore_value(descriptor: &FieldDescriptor, stored: &SnapshotValue) -> Option<FieldValue> {
    match descriptor.kind {
        FieldKind::Checkbox => Some(FieldValue::Flag(stored.as_flag())),
        FieldKind::Radio | FieldKind::Select => {
            let text = stored.as_text();
            let choice = descriptor.options.iter().find(|o| **o == text).cloned();
            Some(FieldValue::Choice(choice))
        }
        FieldKind::File => None,
        _ => Some(FieldValue::Text(stored.as_text())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubmissionError;
    use crate::error::StoreError;
    use crate::persistence::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::presenter::NoticeLevel;
    use crate::value::FileAttachment;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use proptest::prelude::*;

    #[derive(Debug, Default)]
    struct RecordingPresenter {
        rendered: Option<RenderPlan>,
        filled: HashMap<String, String>,
        states: HashMap<String, FieldState>,
        progress: Vec<Progress>,
        focused: Vec<String>,
        submit_toggles: Vec<bool>,
        notices: Vec<Notice>,
    }

    impl Presenter for RecordingPresenter {
        fn render(&mut self, plan: &RenderPlan) {
            self.rendered = Some(plan.clone());
        }

        fn fill(&mut self, field: &str, display: &str) {
            self.filled.insert(field.into(), display.into());
        }

        fn show_field_state(&mut self, field: &str, state: FieldState) {
            self.states.insert(field.into(), state);
        }

        fn show_progress(&mut self, progress: &Progress) {
            self.progress.push(progress.clone());
        }

        fn focus(&mut self, field: &str) {
            self.focused.push(field.into());
        }

        fn set_submit_enabled(&mut self, enabled: bool) {
            self.submit_toggles.push(enabled);
        }

        fn notify(&mut self, notice: Notice) {
            self.notices.push(notice);
        }
    }

    /// Memory store that counts writes
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: AtomicUsize,
    }

    impl SnapshotStore for CountingStore {
        fn read(&self, key: &str) -> std::result::Result<Option<String>, StoreError> {
            self.inner.read(key)
        }

        fn write(&self, key: &str, json: &str) -> std::result::Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.write(key, json)
        }

        fn remove(&self, key: &str) -> std::result::Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    #[derive(Default)]
    struct FakeSubmissions {
        calls: Mutex<Vec<Submission>>,
        fail_with: Option<SubmissionError>,
    }

    #[async_trait]
    impl SubmissionService for FakeSubmissions {
        async fn submit(&self, submission: Submission) -> std::result::Result<SubmissionReceipt, SubmissionError> {
            self.calls.lock().push(submission);
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(SubmissionReceipt { message: Some("Application submitted successfully.".into()) }),
            }
        }
    }

    const BASICS: &str = r#"{"Basics":[
        {"name":"name","label":"Name","type":"text","required":true},
        {"name":"bio","label":"Bio","type":"textarea","required":false,"validations":"{\"maxLength\":10}"}
    ]}"#;

    fn full_schema() -> Schema {
        Schema::new()
            .with_section(
                "Personal",
                vec![
                    FieldDescriptor::new("name", "Name", FieldKind::Text, true),
                    FieldDescriptor::new("email", "Email", FieldKind::Email, true),
                    FieldDescriptor::new("phone", "Phone", FieldKind::Tel, true).with_rules(&RuleSet {
                        pattern: Some("[0-9]{8}".into()),
                        ..Default::default()
                    }),
                ],
            )
            .with_section(
                "Preferences",
                vec![
                    FieldDescriptor::new("shift", "Shift", FieldKind::Radio, true).with_options(["Day", "Night"]),
                    FieldDescriptor::new("city", "City", FieldKind::Select, false).with_options(["Oslo", "Bergen"]),
                    FieldDescriptor::new("relocate", "Relocate", FieldKind::Checkbox, false),
                    FieldDescriptor::new("notes", "Notes", FieldKind::Textarea, false),
                ],
            )
    }

    fn engine(schema: Schema, identity: Identity) -> FormEngine<RecordingPresenter> {
        FormEngine::initialize(schema, identity, RecordingPresenter::default(), EngineSettings::default()).unwrap()
    }

    fn ada() -> Identity {
        Identity::new("Ada Lovelace", "ada@example.com")
    }

    fn pdf() -> FieldValue {
        FieldValue::File(Some(FileAttachment::new("cv.pdf", "application/pdf", b"%PDF-1.7".to_vec())))
    }

    fn fill_valid(engine: &mut FormEngine<RecordingPresenter>) {
        engine.on_interaction("phone", Interaction::Input(FieldValue::Text("12345678".into()))).unwrap();
        engine.on_interaction("phone", Interaction::Blur).unwrap();
        engine.on_interaction("shift", Interaction::Commit(FieldValue::Choice(Some("Night".into())))).unwrap();
        engine.on_interaction("cv-resume", Interaction::Commit(pdf())).unwrap();
    }

    #[test]
    fn test_bio_scenario() {
        let mut e = engine(Schema::from_json(BASICS).unwrap(), Identity::new("", "x@example.com"));

        e.on_interaction("bio", Interaction::Input(FieldValue::Text("abcdefghijk".into()))).unwrap();
        let verdict = e.on_interaction("bio", Interaction::Blur).unwrap();
        assert_eq!(verdict, Some(ValidationVerdict::Invalid("Bio must not exceed 10 characters.".into())));
        assert_eq!(e.presenter().states["name"], FieldState::Invalid("Name is required.".into()));

        // name plus the appended CV field are required, neither complete
        let p = e.progress();
        assert_eq!((p.completed, p.percent), (0, 0));
        assert!(!e.tracker().is_complete("name"));
    }

    #[test]
    fn test_cv_section_appended() {
        let e = engine(Schema::from_json(BASICS).unwrap(), ada());
        let plan = e.presenter().rendered.as_ref().unwrap();
        let last = plan.sections.last().unwrap();
        assert_eq!(last.name, "CV / Resume Upload");
        assert_eq!(last.step, 2);
        let cv = &last.fields[0];
        assert_eq!(cv.name, "cv-resume");
        assert!(cv.required);
        assert!(matches!(cv.control, crate::plan::Control::FileUpload { .. }));
    }

    #[test]
    fn test_existing_cv_section_kept() {
        let schema = Schema::new().with_section(
            "CV / Resume Upload",
            vec![FieldDescriptor::new("resume", "Resume", FieldKind::File, true)],
        );
        let e = engine(schema, ada());
        assert_eq!(e.plan().sections.len(), 1);
        assert!(e.registry().find("cv-resume").is_none());
    }

    #[test]
    fn test_cv_field_in_other_section_kept() {
        let schema = Schema::new().with_section(
            "Documents",
            vec![FieldDescriptor::new("cv-resume", "CV", FieldKind::File, true)],
        );
        let e = engine(schema, ada());
        assert_eq!(e.plan().sections.len(), 1);
        assert_eq!(e.plan().sections[0].name, "Documents");
    }

    #[test]
    fn test_choices_must_be_declared_options() {
        let store = Arc::new(MemoryStore::new());
        let mut e = engine(full_schema(), ada());
        e.attach_drafts(store.clone()).unwrap();

        e.on_interaction("city", Interaction::Commit(FieldValue::Choice(Some("Oslo".into())))).unwrap();
        assert!(matches!(
            e.on_interaction("city", Interaction::Commit(FieldValue::Choice(Some("Paris".into())))),
            Err(FormsError::ValueMismatch(_))
        ));
        assert_eq!(e.value("city"), Some(&FieldValue::Choice(Some("Oslo".into()))));

        e.on_interaction("shift", Interaction::Commit(FieldValue::Choice(Some("  ".into())))).unwrap();
        assert_eq!(e.value("shift"), Some(&FieldValue::Choice(None)));
        e.flush_draft().unwrap();

        let mut again = engine(full_schema(), ada());
        again.attach_drafts(store).unwrap();
        assert_eq!(again.value("city"), e.value("city"));
        assert_eq!(again.value("shift"), e.value("shift"));
    }

    #[test]
    fn test_drafts_without_runtime_are_held_until_flush() {
        let store = Arc::new(CountingStore::default());
        let mut e = engine(full_schema(), ada());
        e.attach_drafts(store.clone()).unwrap();

        for text in ["N", "No", "Not", "Note", "Notes"] {
            e.on_interaction("notes", Interaction::Input(FieldValue::Text(text.into()))).unwrap();
        }
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert!(e.has_pending_save());

        e.flush_draft().unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert!(!e.has_pending_save());

        // a held write is not lost when the engine goes away
        e.on_interaction("notes", Interaction::Input(FieldValue::Text("Later".into()))).unwrap();
        drop(e);
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
        let saved = store.read("application-draft:ada@example.com").unwrap().unwrap();
        assert!(saved.contains("\"notes\":\"Later\""));
    }

    #[test]
    fn test_identity_prefilled_read_only() {
        let mut e = engine(full_schema(), ada());
        assert_eq!(e.value("name"), Some(&FieldValue::Text("Ada Lovelace".into())));
        assert_eq!(e.presenter().filled["email"], "ada@example.com");
        assert!(e.plan().find("email").unwrap().read_only);
        assert!(e.tracker().is_complete("name"));
        assert!(e.tracker().is_complete("email"));
        assert!(matches!(
            e.on_interaction("email", Interaction::Input(FieldValue::Text("x".into()))),
            Err(FormsError::ReadOnlyField(_))
        ));
    }

    #[test]
    fn test_missing_identity() {
        assert!(matches!(
            Identity::from_session(Some("Ada".into()), None),
            Err(FormsError::MissingIdentity("email"))
        ));
        assert!(Identity::from_session(Some(String::new()), Some(String::new())).is_ok());
    }

    #[test]
    fn test_input_is_cheap_commit_is_full() {
        let mut e = engine(full_schema(), ada());

        let r = e.on_interaction("phone", Interaction::Input(FieldValue::Text("12".into()))).unwrap();
        assert_eq!(r, None);
        assert_eq!(e.presenter().states["phone"], FieldState::Pending);

        let r = e.on_interaction("phone", Interaction::Blur).unwrap();
        assert_eq!(r, Some(ValidationVerdict::Invalid("Invalid phone format.".into())));

        e.on_interaction("phone", Interaction::Input(FieldValue::Text("12345678".into()))).unwrap();
        e.on_interaction("phone", Interaction::Blur).unwrap();
        assert!(e.tracker().is_complete("phone"));

        // emptying the field drops it from the completion set straight away
        e.on_interaction("phone", Interaction::Input(FieldValue::Text(String::new()))).unwrap();
        assert!(!e.tracker().is_complete("phone"));
    }

    #[test]
    fn test_progress_reflects_triggering_event() {
        let mut e = engine(full_schema(), ada());
        e.on_interaction("shift", Interaction::Commit(FieldValue::Choice(Some("Day".into())))).unwrap();
        let last = e.presenter().progress.last().unwrap();
        assert_eq!(last.completed, 3);
        assert_eq!(last.total, 5);
        assert_eq!(last.percent, 60);
    }

    #[test]
    fn test_rejects_bad_interactions() {
        let mut e = engine(full_schema(), ada());
        assert!(matches!(e.on_interaction("nope", Interaction::Blur), Err(FormsError::UnknownField(_))));
        assert!(matches!(
            e.on_interaction("relocate", Interaction::Commit(FieldValue::Text("yes".into()))),
            Err(FormsError::ValueMismatch(_))
        ));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let schema = Schema::new()
            .with_section("A", vec![FieldDescriptor::new("x", "X", FieldKind::Text, true)])
            .with_section("B", vec![FieldDescriptor::new("x", "X", FieldKind::Text, true)]);
        let result = FormEngine::initialize(schema, ada(), RecordingPresenter::default(), EngineSettings::default());
        assert!(matches!(result, Err(FormsError::DuplicateField { .. })));
    }

    #[test]
    fn test_invalid_submission_never_calls_service() {
        let mut e = engine(full_schema(), ada());
        e.on_interaction("shift", Interaction::Commit(FieldValue::Choice(Some("Day".into())))).unwrap();
        e.on_interaction("cv-resume", Interaction::Commit(pdf())).unwrap();

        let service = FakeSubmissions::default();
        match tokio_test::block_on(e.submit(&service)) {
            Err(FormsError::ValidationFailed { first_field, failures, .. }) => {
                assert_eq!(first_field, "phone");
                assert_eq!(failures, 1);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert!(service.calls.lock().is_empty());
        assert_eq!(e.presenter().focused, vec!["phone".to_string()]);
        assert!(e.presenter().submit_toggles.is_empty());
    }

    #[tokio::test]
    async fn test_submission_payload() {
        let store = Arc::new(MemoryStore::new());
        let mut e = engine(full_schema(), ada());
        e.attach_drafts(store.clone()).unwrap();
        fill_valid(&mut e);
        e.on_interaction("relocate", Interaction::Commit(FieldValue::Flag(true))).unwrap();

        let service = FakeSubmissions::default();
        let receipt = e.submit(&service).await.unwrap();
        assert_eq!(receipt.message.as_deref(), Some("Application submitted successfully."));

        let calls = service.calls.lock();
        assert_eq!(calls.len(), 1);
        let sent = &calls[0];
        assert_eq!(sent.get("name"), Some("Ada Lovelace"));
        assert_eq!(sent.get("shift"), Some("Night"));
        assert_eq!(sent.get("city"), Some(""));
        assert_eq!(sent.get("relocate"), Some("true"));
        assert_eq!(sent.file("cv-resume").unwrap().file_name, "cv.pdf");
        assert!(sent.get("cv-resume").is_none());

        assert_eq!(e.presenter().submit_toggles, vec![false, true]);
        assert_eq!(e.presenter().notices.last().unwrap().level, NoticeLevel::Success);
        assert!(!store.contains("application-draft:ada@example.com"));
        assert!(!e.has_pending_save());
    }

    #[tokio::test]
    async fn test_failed_submission_reenables() {
        let mut e = engine(full_schema(), ada());
        fill_valid(&mut e);
        let service = FakeSubmissions {
            fail_with: Some(SubmissionError::Rejected { status: 409, message: "already applied".into() }),
            ..Default::default()
        };
        let err = e.submit(&service).await.unwrap_err();
        assert!(matches!(err, FormsError::Submission(SubmissionError::Rejected { status: 409, .. })));
        assert_eq!(e.presenter().submit_toggles, vec![false, true]);
        let notice = e.presenter().notices.last().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "already applied");
        // answers survive a failed submission
        assert_eq!(e.value("shift"), Some(&FieldValue::Choice(Some("Night".into()))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drafts_are_debounced() {
        let store = Arc::new(MemoryStore::new());
        let mut e = engine(full_schema(), ada());
        e.attach_drafts(store.clone()).unwrap();

        for text in ["N", "No", "Not", "Note"] {
            e.on_interaction("notes", Interaction::Input(FieldValue::Text(text.into()))).unwrap();
        }
        assert!(e.has_pending_save());
        assert!(!store.contains("application-draft:ada@example.com"));

        tokio::time::sleep(std::time::Duration::from_millis(350)).await;
        tokio::task::yield_now().await;
        let saved = store.read("application-draft:ada@example.com").unwrap().unwrap();
        assert!(saved.contains("\"notes\":\"Note\""));
        assert!(!saved.contains("ada@example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_without_waiting() {
        let store = Arc::new(MemoryStore::new());
        let mut e = engine(full_schema(), ada());
        e.attach_drafts(store.clone()).unwrap();

        e.on_interaction("phone", Interaction::Input(FieldValue::Text("5550100".into()))).unwrap();
        e.flush_draft().unwrap();
        assert!(!e.has_pending_save());
        let saved = store.read("application-draft:ada@example.com").unwrap().unwrap();
        assert!(saved.contains("\"phone\":\"5550100\""));
    }

    #[test]
    fn test_restore_replays_events() {
        let store = Arc::new(MemoryStore::new());
        store
            .write(
                "application-draft:ada@example.com",
                r#"{"phone":"12345678","shift":"Night","city":"Paris","relocate":"on","name":"Mallory","cv-resume":"x.pdf"}"#,
            )
            .unwrap();

        let mut e = engine(full_schema(), ada());
        let restored = e.attach_drafts(store).unwrap();
        assert_eq!(restored, 4);
        assert_eq!(e.value("phone"), Some(&FieldValue::Text("12345678".into())));
        assert_eq!(e.value("shift"), Some(&FieldValue::Choice(Some("Night".into()))));
        assert_eq!(e.value("city"), Some(&FieldValue::Choice(None)));
        assert_eq!(e.value("relocate"), Some(&FieldValue::Flag(true)));
        assert_eq!(e.value("name"), Some(&FieldValue::Text("Ada Lovelace".into())));
        assert!(e.tracker().is_complete("phone"));
        assert!(e.tracker().is_complete("shift"));
        assert_eq!(e.presenter().states["phone"], FieldState::Valid);
        let notice = e.presenter().notices.last().unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert_eq!(notice.message, "Restored 4 answers from your saved draft.");
    }

    proptest! {
        #[test]
        fn draft_round_trip(
            phone in "[0-9a-z ]{0,12}",
            notes in "\\PC{0,40}",
            shift in proptest::option::of(prop_oneof![Just("Day".to_string()), Just("Night".to_string())]),
            city in proptest::option::of(prop_oneof![Just("Oslo".to_string()), Just("Bergen".to_string())]),
            relocate in any::<bool>(),
        ) {
            let store = Arc::new(MemoryStore::new());
            let mut first = engine(full_schema(), ada());
            first.attach_drafts(store.clone()).unwrap();
            first.on_interaction("phone", Interaction::Input(FieldValue::Text(phone.clone()))).unwrap();
            first.on_interaction("notes", Interaction::Input(FieldValue::Text(notes.clone()))).unwrap();
            first.on_interaction("shift", Interaction::Commit(FieldValue::Choice(shift.clone()))).unwrap();
            first.on_interaction("city", Interaction::Commit(FieldValue::Choice(city.clone()))).unwrap();
            first.on_interaction("relocate", Interaction::Commit(FieldValue::Flag(relocate))).unwrap();
            first.flush_draft().unwrap();

            let mut second = engine(full_schema(), ada());
            second.attach_drafts(store).unwrap();
            for name in ["phone", "notes", "shift", "city", "relocate"] {
                prop_assert_eq!(first.value(name), second.value(name));
            }
        }
    }
}
