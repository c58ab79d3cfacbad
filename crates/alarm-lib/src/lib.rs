//! Alarm provisioning library for compute instances
//!
//! This crate provides the core functionality for:
//! - Resolving an operator-chosen compartment under a tenancy
//! - Inventorying running instances and active alarms
//! - Templating the CPU, memory and availability alarms per instance
//! - Reconciling the two so that repeated runs never duplicate an alarm

pub mod config;
pub mod error;
pub mod inventory;
pub mod models;
pub mod observability;
pub mod reconciler;
pub mod services;
pub mod template;

#[cfg(test)]
mod fake;

pub use crate::config::{ConfigOverrides, ProvisionerConfig};
pub use error::{ProvisionError, Result};
pub use inventory::MatchPolicy;
pub use models::*;
pub use observability::RunLogger;
pub use reconciler::{
    AlarmOutcome, AlarmRecord, FailurePolicy, Phase, PlanStep, ProgressSink, ReconcileReport,
    Reconciler, RunOptions,
};
pub use services::{ComputeService, IdentityService, MonitoringService};
pub use template::AlarmKind;
