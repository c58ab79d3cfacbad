//! Alarm reconciliation
//!
//! Drives a run through its phases:
//! `ResolvingCompartment -> InventoryingInstances -> InventoryingAlarms ->
//! Reconciling(kind) x3 -> Done`. Nothing is rolled back on failure; alarms
//! created before an error stay created, and re-running converges the rest
//! because every alarm is keyed by its canonical display name.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProvisionerConfig;
use crate::error::Result;
use crate::inventory::{
    list_active_alarm_names, list_compartments, list_running_instances, resolve_compartment,
    MatchPolicy,
};
use crate::models::{AlarmSpec, CompartmentMap, ExistingAlarms};
use crate::observability::RunLogger;
use crate::services::{ComputeService, IdentityService, MonitoringService};
use crate::template::AlarmKind;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ResolvingCompartment,
    InventoryingInstances,
    InventoryingAlarms,
    Reconciling(AlarmKind),
    Done,
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::ResolvingCompartment => write!(f, "resolving_compartment"),
            Phase::InventoryingInstances => write!(f, "inventorying_instances"),
            Phase::InventoryingAlarms => write!(f, "inventorying_alarms"),
            Phase::Reconciling(kind) => write!(f, "reconciling_{kind}"),
            Phase::Done => write!(f, "done"),
            Phase::Failed => write!(f, "failed"),
        }
    }
}

/// What to do when a create call fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the run on the first failed create
    #[default]
    FailFast,
    /// Record the failure and carry on with the remaining alarms
    Continue,
}

/// Knobs for a single run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub match_policy: MatchPolicy,
    pub failure_policy: FailurePolicy,
    /// Plan only; issue no create calls
    pub dry_run: bool,
}

/// One step of a reconciliation plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    /// The alarm already exists under its canonical name
    Exists {
        kind: AlarmKind,
        instance: String,
        display_name: String,
    },
    /// The alarm is missing and will be created
    Create {
        kind: AlarmKind,
        instance: String,
        spec: AlarmSpec,
    },
    /// The instance name cannot be templated into a query
    Reject {
        kind: AlarmKind,
        instance: String,
        display_name: String,
        reason: String,
    },
}

impl PlanStep {
    pub fn kind(&self) -> AlarmKind {
        match self {
            PlanStep::Exists { kind, .. }
            | PlanStep::Create { kind, .. }
            | PlanStep::Reject { kind, .. } => *kind,
        }
    }
}

/// How a single alarm ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlarmOutcome {
    Created { alarm_id: String },
    Exists,
    Planned,
    Rejected { reason: String },
    Failed { error: String },
}

/// Per-alarm line of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRecord {
    pub kind: AlarmKind,
    pub instance: String,
    pub display_name: String,
    #[serde(flatten)]
    pub outcome: AlarmOutcome,
}

/// Result of reconciling one compartment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub compartment_id: String,
    pub dry_run: bool,
    pub instances: Vec<String>,
    pub existing_alarms: usize,
    pub records: Vec<AlarmRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ReconcileReport {
    fn count(&self, pred: impl Fn(&AlarmOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, AlarmOutcome::Created { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, AlarmOutcome::Exists))
    }

    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, AlarmOutcome::Planned))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, AlarmOutcome::Rejected { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, AlarmOutcome::Failed { .. }))
    }

    /// Records for one alarm kind
    pub fn for_kind(&self, kind: AlarmKind) -> impl Iterator<Item = &AlarmRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }
}

/// Receives a run's progress as it happens
///
/// Records arrive in creation order, including the failed record that ends a
/// fail-fast run, so a caller can show what was done even when `reconcile`
/// returns an error.
pub trait ProgressSink: Send + Sync {
    fn inventory_loaded(&self, _instances: &[String], _existing_alarms: usize) {}

    fn alarm_applied(&self, _record: &AlarmRecord) {}
}

/// Converges a compartment to "three alarms per running instance"
pub struct Reconciler {
    config: ProvisionerConfig,
    options: RunOptions,
    identity: Arc<dyn IdentityService>,
    compute: Arc<dyn ComputeService>,
    monitoring: Arc<dyn MonitoringService>,
    progress: Option<Arc<dyn ProgressSink>>,
    phase: Phase,
}

impl Reconciler {
    pub fn new(
        config: ProvisionerConfig,
        identity: Arc<dyn IdentityService>,
        compute: Arc<dyn ComputeService>,
        monitoring: Arc<dyn MonitoringService>,
    ) -> Self {
        Self {
            config,
            options: RunOptions::default(),
            identity,
            compute,
            monitoring,
            progress: None,
            phase: Phase::Idle,
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(phase = %phase, "Entering phase");
        self.phase = phase;
    }

    fn fail<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.phase = Phase::Failed;
        }
        result
    }

    /// List the compartments an operator can choose from
    pub async fn list_compartments(&mut self, tenancy_id: &str) -> Result<CompartmentMap> {
        self.enter(Phase::ResolvingCompartment);
        let result = list_compartments(self.identity.as_ref(), tenancy_id).await;
        self.fail(result)
    }

    /// Resolve an operator's name fragment against a compartment listing
    pub fn resolve(&mut self, compartments: &CompartmentMap, input: &str) -> Result<String> {
        self.enter(Phase::ResolvingCompartment);
        let result = resolve_compartment(compartments, input, self.options.match_policy);
        self.fail(result)
    }

    /// List, resolve and reconcile in one go
    pub async fn run(&mut self, tenancy_id: &str, input: &str) -> Result<ReconcileReport> {
        let compartments = self.list_compartments(tenancy_id).await?;
        let compartment_id = self.resolve(&compartments, input)?;
        self.reconcile(&compartment_id).await
    }

    /// Compute the steps needed to converge `instances` against `existing`
    ///
    /// Pure: issues no calls. Kinds are visited in [`AlarmKind::ALL`] order
    /// and instances in inventory order. Instances sharing a display name
    /// share one alarm per kind; only the first occurrence is created and the
    /// rest are reported as existing.
    pub fn plan(
        &self,
        compartment_id: &str,
        instances: &[String],
        existing: &ExistingAlarms,
    ) -> Vec<PlanStep> {
        let mut planned = HashSet::new();
        let mut steps = Vec::with_capacity(AlarmKind::ALL.len() * instances.len());
        for kind in AlarmKind::ALL {
            for instance in instances {
                steps.push(self.plan_one(kind, compartment_id, instance, existing, &mut planned));
            }
        }
        steps
    }

    fn plan_one(
        &self,
        kind: AlarmKind,
        compartment_id: &str,
        instance: &str,
        existing: &ExistingAlarms,
        planned: &mut HashSet<String>,
    ) -> PlanStep {
        let display_name = kind.display_name(instance);
        if existing.contains(&display_name) || planned.contains(&display_name) {
            return PlanStep::Exists {
                kind,
                instance: instance.to_string(),
                display_name,
            };
        }

        match kind.spec(
            compartment_id,
            instance,
            &self.config.notification_channel_id,
        ) {
            Ok(spec) => {
                planned.insert(display_name);
                PlanStep::Create {
                    kind,
                    instance: instance.to_string(),
                    spec,
                }
            }
            Err(err) => PlanStep::Reject {
                kind,
                instance: instance.to_string(),
                display_name,
                reason: err.to_string(),
            },
        }
    }

    /// Inventory a compartment and create every missing alarm
    pub async fn reconcile(&mut self, compartment_id: &str) -> Result<ReconcileReport> {
        let result = self.reconcile_inner(compartment_id).await;
        self.fail(result)
    }

    async fn reconcile_inner(&mut self, compartment_id: &str) -> Result<ReconcileReport> {
        let started_at = Utc::now();
        let logger = RunLogger::new(compartment_id);
        logger.log_run_started(self.options.dry_run);

        self.enter(Phase::InventoryingInstances);
        logger.log_phase(&self.phase.to_string());
        let instances = list_running_instances(self.compute.as_ref(), compartment_id).await?;

        self.enter(Phase::InventoryingAlarms);
        logger.log_phase(&self.phase.to_string());
        let existing = list_active_alarm_names(self.monitoring.as_ref(), compartment_id).await?;
        logger.log_inventory(instances.len(), existing.len());
        if let Some(progress) = &self.progress {
            progress.inventory_loaded(&instances, existing.len());
        }

        let steps = self.plan(compartment_id, &instances, &existing);
        let mut records = Vec::with_capacity(steps.len());

        for step in steps {
            let kind = step.kind();
            if self.phase != Phase::Reconciling(kind) {
                self.enter(Phase::Reconciling(kind));
                logger.log_phase(&self.phase.to_string());
            }
            records.push(self.apply(step, &logger).await?);
        }

        self.enter(Phase::Done);

        let report = ReconcileReport {
            compartment_id: compartment_id.to_string(),
            dry_run: self.options.dry_run,
            instances,
            existing_alarms: existing.len(),
            records,
            started_at,
            finished_at: Utc::now(),
        };
        logger.log_run_finished(report.created(), report.skipped(), report.failed());
        Ok(report)
    }

    async fn apply(&self, step: PlanStep, logger: &RunLogger) -> Result<AlarmRecord> {
        let record = match step {
            PlanStep::Exists {
                kind,
                instance,
                display_name,
            } => {
                logger.log_alarm_skipped(kind, &display_name);
                AlarmRecord {
                    kind,
                    instance,
                    display_name,
                    outcome: AlarmOutcome::Exists,
                }
            }
            PlanStep::Reject {
                kind,
                instance,
                display_name,
                reason,
            } => {
                logger.log_instance_rejected(kind, &instance);
                AlarmRecord {
                    kind,
                    instance,
                    display_name,
                    outcome: AlarmOutcome::Rejected { reason },
                }
            }
            PlanStep::Create {
                kind,
                instance,
                spec,
            } if self.options.dry_run => {
                logger.log_alarm_planned(kind, &spec.display_name);
                AlarmRecord {
                    kind,
                    instance,
                    display_name: spec.display_name,
                    outcome: AlarmOutcome::Planned,
                }
            }
            PlanStep::Create {
                kind,
                instance,
                spec,
            } => match self.monitoring.create_alarm(&spec).await {
                Ok(created) => {
                    logger.log_alarm_created(kind, &spec.display_name, &created.id);
                    AlarmRecord {
                        kind,
                        instance,
                        display_name: spec.display_name,
                        outcome: AlarmOutcome::Created {
                            alarm_id: created.id,
                        },
                    }
                }
                Err(err) => {
                    logger.log_alarm_failed(kind, &spec.display_name, &err.to_string());
                    let record = AlarmRecord {
                        kind,
                        instance,
                        display_name: spec.display_name,
                        outcome: AlarmOutcome::Failed {
                            error: err.to_string(),
                        },
                    };
                    if self.options.failure_policy == FailurePolicy::FailFast {
                        self.notify(&record);
                        return Err(err);
                    }
                    record
                }
            },
        };
        self.notify(&record);
        Ok(record)
    }

    fn notify(&self, record: &AlarmRecord) {
        if let Some(progress) = &self.progress {
            progress.alarm_applied(record);
        }
    }
}
