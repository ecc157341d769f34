//! WS-Management command line for Intel AMT devices.
//!
//! Run with: `wsman-amt --config config.yaml get environment-detection`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wsman_amt::resources::{
    EnvironmentDetectionSettingData, GeneralSettings, KvmRedirectionSap, KvmRequestedState,
};
use wsman_amt::{HttpTransport, Resource, Session, WsmanConfig};

/// Query and configure an Intel AMT device over WS-Management.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Device password; overrides the config file
    #[arg(long, env = "AMT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the single instance of a resource
    Get { resource: ResourceKind },
    /// List every instance of a resource
    Enumerate { resource: ResourceKind },
    /// Change the KVM redirection state
    Kvm { state: KvmState },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ResourceKind {
    EnvironmentDetection,
    GeneralSettings,
    Kvm,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KvmState {
    Enable,
    Disable,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --log-level; logs go to stderr so stdout stays parseable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wsman_amt={}", args.log_level)));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let mut config = if args.config.exists() {
        WsmanConfig::from_yaml_file(&args.config).context("Failed to load config file")?
    } else {
        info!("Config file not found, using defaults");
        WsmanConfig::default()
    };
    if args.password.is_some() {
        config.endpoint.password = args.password.clone();
    }

    info!(
        endpoint = %config.endpoint.url(),
        max_elements = config.enumeration.max_elements,
        max_pulls = config.enumeration.max_pulls,
        "Configuration loaded"
    );

    let transport = Arc::new(HttpTransport::new(&config.endpoint));
    let session = Session::from_config(&config, transport).context("Invalid configuration")?;

    match args.command {
        Command::Get { resource } => match resource {
            ResourceKind::EnvironmentDetection => {
                get::<EnvironmentDetectionSettingData>(&session, args.format)
            }
            ResourceKind::GeneralSettings => get::<GeneralSettings>(&session, args.format),
            ResourceKind::Kvm => get::<KvmRedirectionSap>(&session, args.format),
        },
        Command::Enumerate { resource } => match resource {
            ResourceKind::EnvironmentDetection => {
                enumerate::<EnvironmentDetectionSettingData>(&session, args.format)
            }
            ResourceKind::GeneralSettings => enumerate::<GeneralSettings>(&session, args.format),
            ResourceKind::Kvm => enumerate::<KvmRedirectionSap>(&session, args.format),
        },
        Command::Kvm { state } => {
            let requested = match state {
                KvmState::Enable => KvmRequestedState::Enabled,
                KvmState::Disable => KvmRequestedState::Disabled,
            };
            let client = session.client::<KvmRedirectionSap>()?;
            let output = client
                .request_state_change(requested)
                .context("RequestStateChange failed")?;
            let labels = KvmRedirectionSap::return_value_labels()?;
            info!(return_value = output.return_value, "KVM state change sent");
            if !output.is_success() {
                anyhow::bail!(
                    "device refused KVM state change: {}",
                    labels.describe(output.return_value)
                );
            }
            print(&output, args.format)
        }
    }
}

fn get<T: Resource + Serialize>(session: &Session, format: Format) -> Result<()> {
    let client = session.client::<T>()?;
    let value = client
        .get(&[])
        .with_context(|| format!("Get {} failed", client.identity()))?;
    print(&value, format)
}

fn enumerate<T: Resource + Serialize>(session: &Session, format: Format) -> Result<()> {
    let client = session.client::<T>()?;
    let items = client
        .pull_all()
        .with_context(|| format!("Enumerate {} failed", client.identity()))?;
    info!(count = items.len(), "Enumeration complete");
    print(&items, format)
}

fn print<V: Serialize + ?Sized>(value: &V, format: Format) -> Result<()> {
    let rendered = match format {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered);
    Ok(())
}
