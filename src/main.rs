mod commands;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use commands::{Command, OutputFormat, Scope};
use gce_compute::config::Config;
use gce_compute::gcp::auth;
use gce_compute::{ComputeClient, ProviderError};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Google Compute Engine images, instances and operations from the command line
#[derive(Parser, Debug)]
#[command(name = "gce", version, about, long_about = None)]
struct Args {
    /// GCP project to use
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// GCP zone to use
    #[arg(short, long, global = true)]
    zone: Option<String>,

    /// Send requests to this base URL instead of compute.googleapis.com
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Do not attach credentials (emulators and stub servers)
    #[arg(long, global = true)]
    anonymous: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // RUST_LOG can narrow or widen individual targets on top of --log-level
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(tracing_level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gce started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gce").join("gce.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gce").join("gce.log");
    }
    PathBuf::from("gce.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let result = execute(args).await;

    if let Err(err) = &result {
        tracing::error!("Command failed: {:#}", err);
        if let Some(hint) = err.downcast_ref::<ProviderError>().and_then(ProviderError::hint) {
            eprintln!("{}", hint);
        }
    }

    result
}

async fn execute(args: Args) -> Result<()> {
    let config = Config::load();

    let project = config.effective_project(args.project.as_deref())?.context(
        "No GCP project configured. Set GOOGLE_CLOUD_PROJECT or use --project flag",
    )?;
    let zone = config.effective_zone(args.zone.as_deref());
    let endpoint = config.effective_endpoint(args.endpoint.as_deref());

    tracing::info!("Using project: {}, zone: {}", project, zone);

    let http = if args.anonymous {
        auth::anonymous_client()?
    } else {
        auth::authorized_client().await?
    };

    let client = match endpoint.as_deref() {
        Some(base_url) => ComputeClient::with_base_url(http, base_url)?,
        None => ComputeClient::new(http)?,
    };

    let scope = Scope { project, zone };
    let response = commands::run(&client, &scope, args.command).await?;

    println!("{}", commands::render(&response, args.output)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_flag_is_global() {
        let args = Args::try_parse_from(["gce", "image", "get", "debian-12", "--anonymous"]).unwrap();
        assert!(args.anonymous);

        let args = Args::try_parse_from(["gce", "--endpoint", "http://127.0.0.1:8080", "image", "get", "x"]).unwrap();
        assert!(!args.anonymous);
        assert_eq!(args.endpoint.as_deref(), Some("http://127.0.0.1:8080"));
    }
}
