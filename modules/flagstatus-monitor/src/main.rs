use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flagstatus_common::{validate_json, BadgeSummary, Config, StatusRecord, Validation};
use flagstatus_monitor::{badge_for, build_run, sink::to_canonical_json};

#[derive(Parser)]
#[command(name = "flag-status", about = "Resolve and publish the national flag status")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the status and write it to every configured sink (default)
    Run,
    /// Resolve the status and print it without writing anything
    Resolve,
    /// Check an existing status document against the schema
    Validate {
        /// Path to the status JSON document
        path: PathBuf,
    },
    /// Export JSON Schemas for the status and badge documents
    Schema {
        /// Output directory
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run().await,
        Command::Resolve => resolve().await,
        Command::Validate { path } => validate(path),
        Command::Schema { out_dir } => schema_export(out_dir),
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("flagstatus_common=info".parse()?)
        .add_directive("flagstatus_sources=info".parse()?)
        .add_directive("flagstatus_monitor=info".parse()?)
        .add_directive("flag_status=info".parse()?);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

async fn run() -> Result<()> {
    info!("Flag status check starting...");

    let config = Config::from_env()?;
    config.log_redacted();

    let report = build_run(&config)?.run().await?;

    info!(
        status = %report.resolution.record.status,
        source = %report.resolution.record.source,
        resolution = %report.resolution.kind,
        "Flag status check complete"
    );
    Ok(())
}

async fn resolve() -> Result<()> {
    let config = Config::from_env()?;
    config.log_redacted();

    let status_run = build_run(&config)?;
    let resolution = status_run.resolver().resolve().await;
    let badge = badge_for(&resolution);

    print!("{}", to_canonical_json(&resolution.record)?);
    print!("{}", to_canonical_json(&badge)?);
    Ok(())
}

fn validate(path: PathBuf) -> Result<()> {
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match validate_json(&raw) {
        Validation::Valid(record) => {
            println!(
                "{}: valid ({} from {})",
                path.display(),
                record.status,
                record.source
            );
            Ok(())
        }
        Validation::Invalid(reason) => bail!("{}: invalid: {reason}", path.display()),
    }
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    let status_schema = schema_for!(StatusRecord);
    fs::write(
        out_dir.join("StatusRecord.schema.json"),
        serde_json::to_string_pretty(&status_schema)?,
    )?;

    let badge_schema = schema_for!(BadgeSummary);
    fs::write(
        out_dir.join("BadgeSummary.schema.json"),
        serde_json::to_string_pretty(&badge_schema)?,
    )?;

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}
