//! Command handlers
//!
//! Each subcommand maps onto one facade call, except `--wait` and
//! `operation wait`, which poll the zone operation until the provider reports
//! it finished.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use gce_compute::{ComputeService, Instance, Operation};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up boot images
    #[command(subcommand)]
    Image(ImageCommand),
    /// Inspect, create and delete VM instances
    #[command(subcommand)]
    Instance(InstanceCommand),
    /// Inspect and wait for zonal operations
    #[command(subcommand)]
    Operation(OperationCommand),
}

#[derive(Subcommand, Debug)]
pub enum ImageCommand {
    /// Get an image by name
    Get { name: String },
    /// Get the newest image in a family
    Family { family: String },
}

#[derive(Subcommand, Debug)]
pub enum InstanceCommand {
    /// Get an instance
    Get { name: String },
    /// Delete an instance
    Delete {
        name: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Create an instance from a JSON or YAML document
    Create {
        /// Instance document (`.json`, `.yaml` or `.yml`)
        #[arg(short, long)]
        file: PathBuf,
        #[command(flatten)]
        wait: WaitArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum OperationCommand {
    /// Get the current state of an operation
    Get { name: String },
    /// Poll an operation until it is done
    Wait {
        name: String,
        #[command(flatten)]
        poll: PollArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Wait for the operation to finish
    #[arg(long)]
    pub wait: bool,
    #[command(flatten)]
    pub poll: PollArgs,
}

/// Upper bound for poll interval and timeout flags (one day)
const MAX_POLL_SECS: u64 = 86_400;

#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Seconds between operation polls
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..=MAX_POLL_SECS))]
    pub interval_secs: u64,
    /// Give up after this many seconds
    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u64).range(1..=MAX_POLL_SECS))]
    pub timeout_secs: u64,
}

impl PollArgs {
    fn options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_secs(self.interval_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Output format for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Project and zone every call is scoped to
#[derive(Debug, Clone)]
pub struct Scope {
    pub project: String,
    pub zone: String,
}

/// How to poll an operation
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Run one command and return the provider's response as JSON
pub async fn run(service: &dyn ComputeService, scope: &Scope, command: Command) -> Result<Value> {
    let Scope { project, zone } = scope;

    match command {
        Command::Image(ImageCommand::Get { name }) => {
            to_value(service.images_get(project, &name).await?)
        }
        Command::Image(ImageCommand::Family { family }) => {
            to_value(service.images_get_from_family(project, &family).await?)
        }
        Command::Instance(InstanceCommand::Get { name }) => {
            to_value(service.instances_get(project, zone, &name).await?)
        }
        Command::Instance(InstanceCommand::Delete { name, wait }) => {
            tracing::info!("Deleting instance {} in {}/{}", name, project, zone);
            let op = service.instances_delete(project, zone, &name).await?;
            finish(service, scope, op, &wait).await
        }
        Command::Instance(InstanceCommand::Create { file, wait }) => {
            let instance = load_instance_document(&file)?;
            tracing::info!(
                "Creating instance {} in {}/{}",
                instance.name.as_deref().unwrap_or("-"),
                project,
                zone
            );
            let op = service.instances_insert(project, zone, &instance).await?;
            finish(service, scope, op, &wait).await
        }
        Command::Operation(OperationCommand::Get { name }) => {
            to_value(service.zone_operations_get(project, zone, &name).await?)
        }
        Command::Operation(OperationCommand::Wait { name, poll }) => {
            to_value(wait_for_operation(service, scope, &name, poll.options()).await?)
        }
    }
}

async fn finish(service: &dyn ComputeService, scope: &Scope, op: Operation, wait: &WaitArgs) -> Result<Value> {
    if !wait.wait {
        return to_value(op);
    }

    let Some(name) = op.name.clone() else {
        bail!("Provider returned an operation without a name; cannot wait for it");
    };

    to_value(wait_for_operation(service, scope, &name, wait.poll.options()).await?)
}

/// Poll `name` until it is done
///
/// Fails if the finished operation carries errors or `timeout` elapses first.
pub async fn wait_for_operation(
    service: &dyn ComputeService,
    scope: &Scope,
    name: &str,
    options: PollOptions,
) -> Result<Operation> {
    // None: the timeout is too large to represent, so there is no deadline
    let deadline = Instant::now().checked_add(options.timeout);

    loop {
        let op = service
            .zone_operations_get(&scope.project, &scope.zone, name)
            .await?;

        if op.is_done() {
            if op.succeeded() {
                tracing::info!("Operation {} finished", name);
                return Ok(op);
            }

            let reasons = op
                .errors()
                .iter()
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.code.as_deref().unwrap_or("UNKNOWN"),
                        e.message.as_deref().unwrap_or("-")
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            bail!("Operation {} failed: {}", name, reasons);
        }

        if let Some(deadline) = deadline {
            let next_poll = Instant::now().checked_add(options.interval);
            if next_poll.map_or(true, |next| next > deadline) {
                bail!("Timed out after {:?} waiting for operation {}", options.timeout, name);
            }
        }

        tracing::debug!(
            "Operation {} is {:?} ({}%)",
            name,
            op.status,
            op.progress.unwrap_or(0)
        );
        tokio::time::sleep(options.interval).await;
    }
}

/// Read an instance document; `.json` files are parsed as JSON, anything else as YAML
pub fn load_instance_document(path: &Path) -> Result<Instance> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).with_context(|| format!("Invalid instance JSON in {}", path.display()))
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid instance YAML in {}", path.display()))
    }
}

/// Render a response for the terminal
pub fn render(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("Failed to render JSON"),
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to render YAML"),
    }
}

fn to_value<T: serde::Serialize>(resource: T) -> Result<Value> {
    serde_json::to_value(resource).context("Failed to encode response")
}
