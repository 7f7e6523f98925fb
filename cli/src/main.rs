//! Formdesk CLI
//!
//! Command-line front end for a Formdesk server.
//!
//! # Usage
//!
//! ```bash
//! formdesk schema push -f registration.yaml
//! formdesk fill user-registration
//! formdesk submit --schema user-registration --data '{"firstName": "Ada"}'
//! formdesk submissions list --per-page 50 --format json
//! formdesk analytics
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod dashboard;
mod output;

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "formdesk")]
#[command(version)]
#[command(about = "Formdesk Command Line Interface", long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(long, env = "FORMDESK_API_URL")]
    api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    format: Option<OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage form schemas
    Schema {
        #[command(subcommand)]
        action: SchemaCommands,
    },
    /// Check a record against a schema without storing it
    Validate {
        #[arg(long, short)]
        schema: Option<String>,
        #[command(flatten)]
        input: RecordInput,
    },
    /// Submit a record
    Submit {
        #[arg(long, short)]
        schema: Option<String>,
        #[command(flatten)]
        input: RecordInput,
    },
    /// Fill in a form interactively
    Fill { schema: Option<String> },
    /// Browse stored submissions
    Submissions {
        #[command(subcommand)]
        action: SubmissionCommands,
    },
    /// Show the analytics dashboard
    Analytics,
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(clap::Args)]
struct RecordInput {
    /// JSON or YAML file holding the record
    #[arg(long, short, conflicts_with = "data")]
    file: Option<String>,
    /// Inline JSON record
    #[arg(long, short)]
    data: Option<String>,
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Create or replace a schema from file
    Push {
        #[arg(short, long)]
        file: String,
    },
    /// Show a schema's fields
    Get { name: String },
    /// List all schemas
    List,
}

#[derive(Subcommand)]
enum SubmissionCommands {
    /// List submissions, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },
    /// Get submission details
    Get { id: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
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
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let profile = cli.profile.as_deref();
    let command = match cli.command {
        Commands::Config { action } => return commands::config::handle(action, profile),
        command => command,
    };

    let config = config::Config::load(profile)?;
    let api_url = cli
        .api_url
        .or_else(|| config.api_url.clone())
        .unwrap_or_else(|| config::DEFAULT_API_URL.to_string());
    let format = match (cli.format, config.default_format.as_deref()) {
        (Some(format), _) => format,
        (None, Some(name)) => OutputFormat::from_str(name, true)
            .map_err(|e| anyhow::anyhow!(e))
            .context("default_format in config")?,
        (None, None) => OutputFormat::Table,
    };
    let schema_or_default = |schema: Option<String>| schema.or_else(|| config.default_schema.clone());

    let client = commands::ApiClient::new(&api_url);
    tracing::debug!(api_url = %client.base_url, "using server");

    match command {
        Commands::Schema { action } => commands::schemas::handle(action, &client, format).await,
        Commands::Validate { schema, input } => {
            let schema = schema_or_default(schema).context("--schema is required (or set default_schema)")?;
            let record = commands::submissions::read_record(input.file.as_deref(), input.data.as_deref())?;
            commands::submissions::validate(&client, &schema, record).await
        }
        Commands::Submit { schema, input } => {
            let record = commands::submissions::read_record(input.file.as_deref(), input.data.as_deref())?;
            commands::submissions::submit(&client, schema_or_default(schema).as_deref(), record).await
        }
        Commands::Fill { schema } => {
            let schema = schema_or_default(schema).context("A schema name is required (or set default_schema)")?;
            commands::fill::handle(&client, &schema).await
        }
        Commands::Submissions { action } => commands::submissions::handle(action, &client, format).await,
        Commands::Analytics => commands::analytics::handle(&client, format).await,
        Commands::Config { .. } => Ok(()),
    }
}
