//! Core data models for alarm provisioning

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Lifecycle state an instance must be in to receive alarms
pub const INSTANCE_RUNNING: &str = "RUNNING";

/// Lifecycle state of alarms that count as existing
pub const ALARM_ACTIVE: &str = "ACTIVE";

/// Lifecycle state of compartments an operator can pick
pub const COMPARTMENT_ACTIVE: &str = "ACTIVE";

/// Compartment names mapped to their identifiers, ordered by name
pub type CompartmentMap = BTreeMap<String, String>;

/// Display names of the alarms already active in a compartment
pub type ExistingAlarms = HashSet<String>;

/// A compartment under the tenancy root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compartment {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_state: Option<String>,
}

impl Compartment {
    /// Compartments listed without a state are taken as active
    pub fn is_active(&self) -> bool {
        self.lifecycle_state
            .as_deref()
            .map_or(true, |state| state.eq_ignore_ascii_case(COMPARTMENT_ACTIVE))
    }
}

/// A compute instance as returned by the instance listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub display_name: String,
    pub lifecycle_state: String,
}

impl Instance {
    pub fn is_running(&self) -> bool {
        self.lifecycle_state.eq_ignore_ascii_case(INSTANCE_RUNNING)
    }
}

/// An alarm as returned by the alarm listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSummary {
    #[serde(default)]
    pub id: String,
    pub display_name: String,
    pub lifecycle_state: String,
}

impl AlarmSummary {
    pub fn is_active(&self) -> bool {
        self.lifecycle_state.eq_ignore_ascii_case(ALARM_ACTIVE)
    }
}

/// Alarm severity as understood by the monitoring service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// Format of the notification message sent when an alarm fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageFormat {
    Raw,
    PrettyJson,
    OnsOptimized,
}

/// Desired state of one alarm, in the shape the create call expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSpec {
    pub display_name: String,
    pub compartment_id: String,
    pub metric_compartment_id: String,
    pub namespace: String,
    pub query: String,
    pub body: String,
    pub severity: Severity,
    pub is_enabled: bool,
    pub destinations: Vec<String>,
    pub message_format: MessageFormat,
}

/// The monitoring service's answer to a successful create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAlarm {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub lifecycle_state: String,
}

/// One page of a listing, with the token for the next page if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page: Option<String>) -> Self {
        Self { items, next_page }
    }

    /// A page with no successor
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}
