//! Form commands

use super::Session;
use crate::answers;
use crate::presenter::TerminalPresenter;
use crate::FormCommands;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use recruit_forms::{ConfigService, FormEngine, Identity};
use std::path::Path;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct InvalidRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Problem")]
    message: String,
}

pub async fn handle(action: FormCommands, session: &Session) -> Result<()> {
    match action {
        FormCommands::Show => show(session).await,
        FormCommands::Apply { answers, cv, dry_run } => {
            apply(session, answers.as_deref(), cv.as_deref(), dry_run).await
        }
    }
}

async fn load_engine(session: &Session, identity: Identity, quiet: bool) -> Result<FormEngine<TerminalPresenter>> {
    let client = session.client()?;
    let schema = client
        .fetch_schema()
        .await
        .with_context(|| format!("loading form from {}", client.config_url()))?;
    let engine = FormEngine::initialize(
        schema,
        identity,
        TerminalPresenter::new(quiet),
        session.config.engine.clone(),
    )?;
    Ok(engine)
}

async fn show(session: &Session) -> Result<()> {
    // Layout does not depend on who is looking
    let identity = Identity::new(
        session.name.clone().unwrap_or_default(),
        session.email.clone().unwrap_or_default(),
    );
    let text = session.format.is_text();
    let engine = load_engine(session, identity, !text).await?;
    if text {
        println!();
        println!("{} fields in {} steps", engine.plan().field_count(), engine.plan().sections.len());
    } else {
        session.format.print(engine.plan());
    }
    Ok(())
}

async fn apply(session: &Session, answers_path: Option<&str>, cv_path: Option<&str>, dry_run: bool) -> Result<()> {
    let identity = session.identity()?;
    let mut engine = load_engine(session, identity, true).await?;

    engine.attach_drafts(session.store()?)?;

    let answers = match answers_path {
        Some(path) => answers::load(Path::new(path))?,
        None => Default::default(),
    };
    let cv = cv_path.map(|p| answers::load_cv(Path::new(p))).transpose()?;
    let ignored = answers::apply(&mut engine, &answers, cv, &session.config.engine.cv_field)?;
    for key in &ignored {
        eprintln!("{} ignoring answer for '{}': not an editable field or not an accepted value", "!".yellow(), key);
    }
    engine.flush_draft().context("saving draft")?;

    if dry_run {
        let names: Vec<String> = engine.registry().all_fields().map(|f| f.name.clone()).collect();
        for name in &names {
            engine.validate_field(name);
        }
        return report(session, &engine);
    }

    if session.format.is_text() {
        engine.presenter().print_progress();
    }
    let client = session.client()?;
    let receipt = engine.submit(&client).await.context("application not submitted")?;
    if !session.format.is_text() {
        session.format.print(&serde_json::json!({
            "submitted": true,
            "message": receipt.message,
        }));
    }
    Ok(())
}

fn report(session: &Session, engine: &FormEngine<TerminalPresenter>) -> Result<()> {
    let invalid = engine.presenter().invalid_fields();
    if !session.format.is_text() {
        session.format.print(&serde_json::json!({
            "progress": engine.progress(),
            "invalid": invalid,
        }));
    } else {
        engine.presenter().print_progress();
        if invalid.is_empty() {
            println!("{}", "All fields are valid. Run without --dry-run to submit.".green());
        } else {
            let rows: Vec<InvalidRow> = invalid
                .iter()
                .map(|(field, message)| InvalidRow { field: field.clone(), message: message.clone() })
                .collect();
            println!("{}", Table::new(rows));
        }
    }
    if !invalid.is_empty() {
        bail!("{} field(s) need attention", invalid.len());
    }
    Ok(())
}
