//! Recruitment CLI
//!
//! Fill in and submit the job-application form from a terminal.
//!
//! # Usage
//!
//! ```bash
//! recruit form show --format yaml
//! recruit form apply --answers answers.toml --cv ~/cv.pdf
//! recruit form apply --answers answers.toml --cv ~/cv.pdf --dry-run
//! recruit draft show
//! recruit draft clear
//! recruit config set api_url https://jobs.example.com
//! ```

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod answers;
mod commands;
mod config;
mod output;
mod presenter;

#[derive(Parser)]
#[command(name = "recruit")]
#[command(version)]
#[command(about = "Recruitment application form", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "RECRUIT_API_URL")]
    api_url: Option<String>,

    /// Applicant name, as provided by the signed-in session
    #[arg(long, env = "RECRUIT_NAME")]
    name: Option<String>,

    /// Applicant email, as provided by the signed-in session
    #[arg(long, env = "RECRUIT_EMAIL")]
    email: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "text")]
    format: output::OutputFormat,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and submit the application form
    Form {
        #[command(subcommand)]
        action: FormCommands,
    },
    /// Manage the saved in-progress draft
    Draft {
        #[command(subcommand)]
        action: DraftCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub(crate) enum FormCommands {
    /// Show the form layout
    Show,
    /// Fill the form from an answers file and submit it
    Apply {
        /// TOML file of field name to answer
        #[arg(short, long)]
        answers: Option<String>,
        /// CV to upload (PDF)
        #[arg(long)]
        cv: Option<String>,
        /// Validate and report progress without submitting
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum DraftCommands {
    /// Print the saved draft
    Show,
    /// Delete the saved draft
    Clear,
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = config::Config::load(cli.profile.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config not readable, using defaults");
        config::Config::default()
    });
    let session = commands::Session {
        api_url: cli.api_url.or_else(|| config.api_url.clone()),
        name: cli.name.or_else(|| config.name.clone()),
        email: cli.email.or_else(|| config.email.clone()),
        config,
        format: cli.format,
    };

    let result = match cli.command {
        Commands::Form { action } => commands::form::handle(action, &session).await,
        Commands::Draft { action } => commands::draft::handle(action, &session),
        Commands::Config { action } => commands::config::handle(action, cli.profile.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
