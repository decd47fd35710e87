//! CLI Commands

pub mod config;
pub mod draft;
pub mod form;

use crate::config::Config;
use crate::output::OutputFormat;
use anyhow::{Context, Result};
use recruit_client::{ClientSettings, HttpFormClient};
use recruit_forms::{FileStore, Identity, PersistenceAdapter, SnapshotStore};
use std::sync::Arc;

/// Everything a command needs from flags, environment and config file
pub struct Session {
    pub api_url: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub config: Config,
    pub format: OutputFormat,
}

impl Session {
    pub fn client(&self) -> Result<HttpFormClient> {
        let settings = match &self.api_url {
            Some(url) => ClientSettings::with_base_url(url.clone()),
            None => ClientSettings::default(),
        };
        HttpFormClient::new(settings).context("building HTTP client")
    }

    pub fn identity(&self) -> Result<Identity> {
        Identity::from_session(self.name.clone(), self.email.clone())
            .context("set --name and --email (or RECRUIT_NAME / RECRUIT_EMAIL) to apply")
    }

    pub fn store(&self) -> Result<Arc<dyn SnapshotStore>> {
        Ok(Arc::new(FileStore::new(self.config.draft_dir()?)))
    }

    /// Draft adapter for the session's applicant, without loading a form
    pub fn drafts(&self) -> Result<PersistenceAdapter> {
        Ok(PersistenceAdapter::new(
            self.store()?,
            &self.config.engine.draft_key_prefix,
            self.email.as_deref(),
        ))
    }
}
