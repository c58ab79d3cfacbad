//! OCI instance alarm provisioner
//!
//! Creates a CPU, a memory and an availability alarm for every running
//! compute instance in a compartment, skipping alarms that already exist.

mod client;
mod commands;
mod config;
mod output;
mod prompt;
mod signer;

use std::path::PathBuf;

use alarm_lib::{ConfigOverrides, FailurePolicy, MatchPolicy, ProvisionerConfig, RunOptions};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// OCI instance alarm provisioner
#[derive(Parser)]
#[command(name = "oci-alarms")]
#[command(author, version, about = "Create CPU, memory and availability alarms for OCI compute instances", long_about = None)]
pub struct Cli {
    /// Path to the OCI config file (defaults to ~/.oci/config)
    #[arg(long, env = "CONFIG_PATH")]
    pub config_path: Option<PathBuf>,

    /// Profile inside the OCI config file
    #[arg(long, env = "OCI_PROFILE")]
    pub profile: Option<String>,

    /// Notification topic OCID every alarm notifies
    #[arg(long, env = "NOTIFICATION_OCID")]
    pub notification_channel: Option<String>,

    /// Compartment name (or part of it); prompts when omitted
    #[arg(long, short)]
    pub compartment: Option<String>,

    /// How to settle a name that matches several compartments
    #[arg(long, value_enum, default_value = "strict")]
    pub match_policy: MatchPolicyArg,

    /// Keep creating alarms after a failed create
    #[arg(long)]
    pub continue_on_error: bool,

    /// Show which alarms would be created without creating them
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MatchPolicyArg {
    /// Exact name wins; several partial matches is an error
    Strict,
    /// The last matching name wins
    LastMatch,
}

impl From<MatchPolicyArg> for MatchPolicy {
    fn from(arg: MatchPolicyArg) -> Self {
        match arg {
            MatchPolicyArg::Strict => MatchPolicy::Strict,
            MatchPolicyArg::LastMatch => MatchPolicy::LastMatch,
        }
    }
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            credentials_path: self.config_path.clone(),
            profile: self.profile.clone(),
            notification_channel_id: self.notification_channel.clone(),
        }
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            match_policy: self.match_policy.into(),
            failure_policy: if self.continue_on_error {
                FailurePolicy::Continue
            } else {
                FailurePolicy::FailFast
            },
            dry_run: self.dry_run,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let json = std::env::var("LOG_FORMAT").map_or(false, |format| format == "json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Seed the environment from .env before clap reads it
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if matches!(cli.format, output::OutputFormat::Table) {
        println!("This tool creates CPU, memory and availability alarms for each running instance in a compartment.");
    }

    let config = ProvisionerConfig::load(&cli.overrides()).context("Failed to load configuration")?;
    let options = cli.run_options();

    commands::provision::provision(config, options, cli.compartment, cli.format).await
}
