//! Structured run logging
//!
//! Every record carries an `event` field and the compartment being
//! provisioned, so a JSON subscriber yields one machine-readable line per
//! step of the run.

use crate::template::AlarmKind;
use tracing::{debug, info, warn};

/// Structured logger for reconciliation events
#[derive(Debug, Clone)]
pub struct RunLogger {
    compartment_id: String,
}

impl RunLogger {
    pub fn new(compartment_id: &str) -> Self {
        Self {
            compartment_id: compartment_id.to_string(),
        }
    }

    /// Log the start of a reconciliation
    pub fn log_run_started(&self, dry_run: bool) {
        info!(
            event = "run_started",
            compartment_id = %self.compartment_id,
            dry_run = dry_run,
            "Reconciling instance alarms"
        );
    }

    /// Log a phase transition
    pub fn log_phase(&self, phase: &str) {
        debug!(
            event = "phase_entered",
            compartment_id = %self.compartment_id,
            phase = %phase,
            "Entered phase"
        );
    }

    /// Log the inventory the reconciliation works from
    pub fn log_inventory(&self, instances: usize, existing_alarms: usize) {
        info!(
            event = "inventory_loaded",
            compartment_id = %self.compartment_id,
            instances = instances,
            existing_alarms = existing_alarms,
            "Loaded instance and alarm inventory"
        );
    }

    /// Log an alarm that already exists
    pub fn log_alarm_skipped(&self, kind: AlarmKind, display_name: &str) {
        debug!(
            event = "alarm_exists",
            compartment_id = %self.compartment_id,
            kind = %kind,
            display_name = %display_name,
            "Alarm already exists"
        );
    }

    /// Log an instance whose name cannot be used in a query
    pub fn log_instance_rejected(&self, kind: AlarmKind, instance: &str) {
        warn!(
            event = "instance_rejected",
            compartment_id = %self.compartment_id,
            kind = %kind,
            instance = %instance,
            "Instance name cannot be used in a monitoring query, skipping"
        );
    }

    /// Log an alarm that would be created in a dry run
    pub fn log_alarm_planned(&self, kind: AlarmKind, display_name: &str) {
        info!(
            event = "alarm_planned",
            compartment_id = %self.compartment_id,
            kind = %kind,
            display_name = %display_name,
            "Dry run, alarm not created"
        );
    }

    /// Log the outcome of a create call
    pub fn log_alarm_created(&self, kind: AlarmKind, display_name: &str, alarm_id: &str) {
        info!(
            event = "alarm_created",
            compartment_id = %self.compartment_id,
            kind = %kind,
            display_name = %display_name,
            alarm_id = %alarm_id,
            "Created alarm"
        );
    }

    /// Log a failed create call
    pub fn log_alarm_failed(&self, kind: AlarmKind, display_name: &str, error: &str) {
        warn!(
            event = "alarm_create_failed",
            compartment_id = %self.compartment_id,
            kind = %kind,
            display_name = %display_name,
            error = %error,
            "Failed to create alarm"
        );
    }

    /// Log the end of a reconciliation
    pub fn log_run_finished(&self, created: usize, skipped: usize, failed: usize) {
        if failed == 0 {
            info!(
                event = "run_finished",
                compartment_id = %self.compartment_id,
                created = created,
                skipped = skipped,
                "Reconciliation complete"
            );
        } else {
            warn!(
                event = "run_finished",
                compartment_id = %self.compartment_id,
                created = created,
                skipped = skipped,
                failed = failed,
                "Reconciliation finished with failures"
            );
        }
    }
}
