//! Alarm templates
//!
//! Every alarm kind fixes its namespace, query, body and severity; only the
//! instance name varies. The display name doubles as the idempotence key, so
//! it must stay a pure function of the instance name.

use crate::error::{ProvisionError, Result};
use crate::models::{AlarmSpec, MessageFormat, Severity};
use serde::{Deserialize, Serialize};

const COMPUTE_AGENT_NAMESPACE: &str = "oci_computeagent";
const INFRASTRUCTURE_HEALTH_NAMESPACE: &str = "oci_compute_infrastructure_health";

/// The alarms provisioned for every running instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    CpuHigh,
    MemoryHigh,
    Unavailable,
}

impl AlarmKind {
    /// All kinds, in the order they are reconciled
    pub const ALL: [AlarmKind; 3] = [
        AlarmKind::CpuHigh,
        AlarmKind::Unavailable,
        AlarmKind::MemoryHigh,
    ];

    /// Canonical display name of this alarm for `instance`
    pub fn display_name(&self, instance: &str) -> String {
        match self {
            AlarmKind::CpuHigh => format!("CPU-Above-90%-{instance}"),
            AlarmKind::MemoryHigh => format!("Memory-Utilization-Above-90%-{instance}"),
            AlarmKind::Unavailable => format!("Instance-{instance} Is not available"),
        }
    }

    /// Monitoring query for `instance`
    ///
    /// The name is interpolated as-is; callers go through [`AlarmKind::spec`],
    /// which rejects names that would break out of the quoted selector.
    pub fn query(&self, instance: &str) -> String {
        match self {
            AlarmKind::CpuHigh => format!(
                "CpuUtilization[1m]{{resourceDisplayName = \"{instance}\"}}.mean() > 90"
            ),
            AlarmKind::MemoryHigh => format!(
                "MemoryUtilization[1m]{{resourceDisplayName = \"{instance}\"}}.mean() > 90"
            ),
            AlarmKind::Unavailable => format!(
                "instance_status[5m]{{resourceDisplayName = \"{instance}\"}}.count() < 1"
            ),
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            AlarmKind::CpuHigh | AlarmKind::MemoryHigh => COMPUTE_AGENT_NAMESPACE,
            AlarmKind::Unavailable => INFRASTRUCTURE_HEALTH_NAMESPACE,
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            AlarmKind::CpuHigh => "The instance CPU has gone above 90%",
            AlarmKind::MemoryHigh => "The instance MEMORY has gone above 90%",
            AlarmKind::Unavailable => "Instance Down for at least 5 minutes.",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Critical
    }

    /// Full create request for this alarm on `instance`
    pub fn spec(
        &self,
        compartment_id: &str,
        instance: &str,
        notification_channel_id: &str,
    ) -> Result<AlarmSpec> {
        validate_instance_name(instance)?;

        Ok(AlarmSpec {
            display_name: self.display_name(instance),
            compartment_id: compartment_id.to_string(),
            metric_compartment_id: compartment_id.to_string(),
            namespace: self.namespace().to_string(),
            query: self.query(instance),
            body: self.body().to_string(),
            severity: self.severity(),
            is_enabled: true,
            destinations: vec![notification_channel_id.to_string()],
            message_format: MessageFormat::PrettyJson,
        })
    }
}

impl std::fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlarmKind::CpuHigh => write!(f, "cpu-high"),
            AlarmKind::MemoryHigh => write!(f, "memory-high"),
            AlarmKind::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Reject names that cannot sit inside a double-quoted query selector
pub fn validate_instance_name(instance: &str) -> Result<()> {
    let unsafe_char = instance
        .chars()
        .any(|c| c == '"' || c == '\\' || c.is_control());

    if instance.is_empty() || unsafe_char {
        return Err(ProvisionError::UnsafeInstanceName(instance.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPARTMENT: &str = "ocid1.compartment.oc1..prod";
    const TOPIC: &str = "ocid1.onstopic.oc1..alerts";

    #[test]
    fn test_cpu_spec_fields() {
        let spec = AlarmKind::CpuHigh.spec(COMPARTMENT, "web-01", TOPIC).unwrap();

        assert_eq!(spec.display_name, "CPU-Above-90%-web-01");
        assert_eq!(
            spec.query,
            r#"CpuUtilization[1m]{resourceDisplayName = "web-01"}.mean() > 90"#
        );
        assert_eq!(spec.namespace, "oci_computeagent");
        assert_eq!(spec.body, "The instance CPU has gone above 90%");
        assert_eq!(spec.severity, Severity::Critical);
        assert_eq!(spec.compartment_id, COMPARTMENT);
        assert_eq!(spec.metric_compartment_id, COMPARTMENT);
        assert!(spec.is_enabled);
        assert_eq!(spec.destinations, vec![TOPIC.to_string()]);
        assert_eq!(spec.message_format, MessageFormat::PrettyJson);
    }

    #[test]
    fn test_memory_spec_fields() {
        let spec = AlarmKind::MemoryHigh
            .spec(COMPARTMENT, "db-02", TOPIC)
            .unwrap();

        assert_eq!(spec.display_name, "Memory-Utilization-Above-90%-db-02");
        assert_eq!(
            spec.query,
            r#"MemoryUtilization[1m]{resourceDisplayName = "db-02"}.mean() > 90"#
        );
        assert_eq!(spec.namespace, "oci_computeagent");
        assert_eq!(spec.body, "The instance MEMORY has gone above 90%");
    }

    #[test]
    fn test_unavailable_spec_fields() {
        let spec = AlarmKind::Unavailable
            .spec(COMPARTMENT, "bastion", TOPIC)
            .unwrap();

        assert_eq!(spec.display_name, "Instance-bastion Is not available");
        assert_eq!(
            spec.query,
            r#"instance_status[5m]{resourceDisplayName = "bastion"}.count() < 1"#
        );
        assert_eq!(spec.namespace, "oci_compute_infrastructure_health");
        assert_eq!(spec.body, "Instance Down for at least 5 minutes.");
        assert_eq!(spec.severity, Severity::Critical);
    }

    #[test]
    fn test_display_names_are_stable() {
        for kind in AlarmKind::ALL {
            assert_eq!(kind.display_name("app"), kind.display_name("app"));
            assert_ne!(kind.display_name("app"), kind.display_name("app2"));
        }
    }

    #[test]
    fn test_unsafe_names_rejected() {
        for name in ["evil\"} or x", "back\\slash", "line\nbreak", ""] {
            let result = AlarmKind::CpuHigh.spec(COMPARTMENT, name, TOPIC);
            assert!(
                matches!(result, Err(ProvisionError::UnsafeInstanceName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_names_with_spaces_and_symbols_allowed() {
        let spec = AlarmKind::Unavailable
            .spec(COMPARTMENT, "web server #1 (eu)", TOPIC)
            .unwrap();
        assert_eq!(spec.display_name, "Instance-web server #1 (eu) Is not available");
    }
}
