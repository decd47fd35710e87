//! Recruitment Form Engine
//!
//! Schema-driven engine behind the job-application form: it turns a
//! server-supplied field schema into a render plan, validates answers,
//! tracks completion progress, keeps in-progress drafts and assembles the
//! final submission.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          FORM ENGINE                             │
//! │                                                                  │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐            │
//! │  │    Field     │  │  Validation  │  │  Completion  │            │
//! │  │   Registry   │─▶│    Rules     │─▶│   Tracker    │            │
//! │  └──────────────┘  └──────────────┘  └──────────────┘            │
//! │         │                                    │                   │
//! │  ┌──────▼───────┐                     ┌──────▼───────┐           │
//! │  │ Render Plan  │                     │   Progress   │           │
//! │  └──────────────┘                     └──────────────┘           │
//! │                                                                  │
//! │  ┌──────────────┐  ┌──────────────┐                              │
//! │  │ Persistence  │◀─│  Debouncer   │                              │
//! │  │   Adapter    │  │  (one task)  │                              │
//! │  └──────────────┘  └──────────────┘                              │
//! └──────────────────────────────────────────────────────────────────┘
//!          ▲                    ▲                    ▲
//!    ConfigService      SubmissionService        Presenter
//! ```
//!
//! The engine is single-owner and event driven: every interaction goes
//! through `&mut FormEngine`, so the completion set is never observed
//! mid-update.

#![warn(clippy::all)]

pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod plan;
pub mod presenter;
pub mod registry;
pub mod rules;
pub mod schema;
pub mod services;
pub mod tracker;
pub mod value;

pub use config::EngineSettings;
pub use debounce::Debouncer;
pub use engine::{FormEngine, Identity, Interaction};
pub use error::*;
pub use persistence::{FileStore, MemoryStore, PersistedSnapshot, PersistenceAdapter, SnapshotStore, SnapshotValue};
pub use plan::{Control, ControlPlan, RenderPlan, SectionPlan};
pub use presenter::{FieldState, Notice, NoticeLevel, Presenter};
pub use registry::{FieldRegistry, Section};
pub use rules::{CompiledRules, ValidationVerdict};
pub use schema::{FieldDescriptor, FieldKind, RuleSet, Schema};
pub use services::{ConfigService, Submission, SubmissionReceipt, SubmissionService};
pub use tracker::{CompletionTracker, Progress, SectionStatus, StepIndicator};
pub use value::{FieldValue, FileAttachment};

/// Identity-derived field holding the applicant's name
pub const NAME_FIELD: &str = "name";

/// Identity-derived field holding the applicant's email
pub const EMAIL_FIELD: &str = "email";
