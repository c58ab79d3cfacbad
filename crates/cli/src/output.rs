//! Output formatting utilities

use alarm_lib::{AlarmKind, AlarmOutcome, AlarmRecord, ProgressSink, ReconcileReport};
use clap::ValueEnum;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for the run report
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row of the per-kind summary table
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Created")]
    created: usize,
    #[tabled(rename = "Existing")]
    existing: usize,
    #[tabled(rename = "Planned")]
    planned: usize,
    #[tabled(rename = "Rejected")]
    rejected: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
}

impl SummaryRow {
    fn for_kind(report: &ReconcileReport, kind: AlarmKind) -> Self {
        let mut row = Self {
            kind: kind.to_string(),
            created: 0,
            existing: 0,
            planned: 0,
            rejected: 0,
            failed: 0,
        };
        for record in report.for_kind(kind) {
            match record.outcome {
                AlarmOutcome::Created { .. } => row.created += 1,
                AlarmOutcome::Exists => row.existing += 1,
                AlarmOutcome::Planned => row.planned += 1,
                AlarmOutcome::Rejected { .. } => row.rejected += 1,
                AlarmOutcome::Failed { .. } => row.failed += 1,
            }
        }
        row
    }
}

/// Status word and detail of one record
fn status_detail(record: &AlarmRecord) -> (&'static str, &str) {
    match &record.outcome {
        AlarmOutcome::Created { alarm_id } => ("created", alarm_id.as_str()),
        AlarmOutcome::Exists => ("exists", ""),
        AlarmOutcome::Planned => ("planned", ""),
        AlarmOutcome::Rejected { reason } => ("rejected", reason.as_str()),
        AlarmOutcome::Failed { error } => ("failed", error.as_str()),
    }
}

/// One line per applied alarm
pub fn progress_line(record: &AlarmRecord) -> String {
    let (status, detail) = status_detail(record);
    if detail.is_empty() {
        format!("{} {}", color_status(status), record.display_name)
    } else {
        format!("{} {} ({})", color_status(status), record.display_name, detail)
    }
}

/// Prints a run's progress while it happens
///
/// Table output goes to stdout; with JSON output each record is written to
/// stderr as one JSON line so stdout stays a single report document.
pub struct ConsoleProgress {
    format: OutputFormat,
}

impl ConsoleProgress {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl ProgressSink for ConsoleProgress {
    fn inventory_loaded(&self, instances: &[String], existing_alarms: usize) {
        if matches!(self.format, OutputFormat::Json) {
            return;
        }
        println!();
        println!("{} ({})", "Running instances".bold(), instances.len());
        for instance in instances {
            println!("  - {}", instance);
        }
        println!("Existing alarms: {}", existing_alarms);
        println!();
    }

    fn alarm_applied(&self, record: &AlarmRecord) {
        match self.format {
            OutputFormat::Table => println!("{}", progress_line(record)),
            OutputFormat::Json => match serde_json::to_string(record) {
                Ok(line) => eprintln!("{}", line),
                Err(err) => tracing::warn!(error = %err, "Failed to serialize alarm record"),
            },
        }
    }
}

/// Print the outcome of a reconciliation
pub fn print_report(report: &ReconcileReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Table => {
            println!();
            println!("{}", "Alarm Reconciliation".bold());
            println!("{}", "=".repeat(50));
            println!("Compartment:            {}", report.compartment_id.cyan());
            println!("Running instances:      {}", report.instances.len());
            println!("Existing alarms:        {}", report.existing_alarms);
            println!();

            if !report.records.is_empty() {
                let rows: Vec<SummaryRow> = AlarmKind::ALL
                    .into_iter()
                    .map(|kind| SummaryRow::for_kind(report, kind))
                    .collect();
                let table = Table::new(rows).with(Style::rounded()).to_string();
                println!("{}", table);
                println!();
            }

            if report.records.is_empty() {
                print_warning("No running instances found");
            } else if report.dry_run {
                print_info(&format!(
                    "Dry run: {} alarms would be created, {} already exist",
                    report.planned(),
                    report.skipped()
                ));
            } else {
                print_success(&format!(
                    "{} alarms created, {} already existed",
                    report.created(),
                    report.skipped()
                ));
            }
            if report.rejected() > 0 {
                print_warning(&format!(
                    "{} alarms skipped for instance names that cannot be queried",
                    report.rejected()
                ));
            }
            if report.failed() > 0 {
                print_error(&format!("{} alarms failed to create", report.failed()));
            }
        }
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status {
        "created" => status.green().to_string(),
        "exists" => status.dimmed().to_string(),
        "planned" => status.blue().to_string(),
        "rejected" => status.yellow().to_string(),
        "failed" => status.red().to_string(),
        _ => status.to_string(),
    }
}
