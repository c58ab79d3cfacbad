//! The provisioning run: resolve, inventory, reconcile

use std::io;
use std::sync::Arc;

use alarm_lib::{ProvisionerConfig, Reconciler, RunOptions};
use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::client::OciClient;
use crate::config::OciProfile;
use crate::output::{print_info, print_report, print_warning, ConsoleProgress, OutputFormat};
use crate::prompt::prompt_compartment;

/// Provision the missing alarms for every running instance in one compartment
pub async fn provision(
    config: ProvisionerConfig,
    options: RunOptions,
    compartment: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let profile = OciProfile::load(config.credentials_path.as_deref(), &config.profile)
        .context("Failed to load OCI profile")?;
    tracing::info!(profile = %config.profile, region = %profile.region, "Loaded OCI profile");

    let client = Arc::new(OciClient::from_profile(&profile).context("Failed to create OCI client")?);
    let mut reconciler = Reconciler::new(config, client.clone(), client.clone(), client)
        .with_options(options)
        .with_progress(Arc::new(ConsoleProgress::new(format)));

    let compartments = reconciler
        .list_compartments(&profile.tenancy)
        .await
        .context("Failed to list compartments")?;
    if compartments.is_empty() {
        bail!("No compartments found under tenancy {}", profile.tenancy);
    }

    let input = match compartment {
        Some(input) => input,
        None => prompt_compartment(&compartments, io::stdin().lock(), io::stdout())?,
    };
    let compartment_id = reconciler.resolve(&compartments, &input)?;
    let compartment_name = compartments
        .iter()
        .find(|(_, id)| **id == compartment_id)
        .map(|(name, _)| name.as_str())
        .unwrap_or_default();

    if matches!(format, OutputFormat::Table) {
        print_info(&format!(
            "Working in compartment {}",
            compartment_name.cyan()
        ));
        if options.dry_run {
            print_warning("Dry run: no alarms will be created");
        }
    }

    let report = reconciler
        .reconcile(&compartment_id)
        .await
        .with_context(|| format!("Failed to reconcile alarms in {compartment_name}"))?;

    print_report(&report, format)?;

    if report.failed() > 0 {
        bail!("{} alarms failed to create", report.failed());
    }
    Ok(())
}
