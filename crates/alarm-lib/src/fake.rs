//! In-memory cloud used by the unit tests

use crate::error::{ProvisionError, Result};
use crate::models::{AlarmSpec, AlarmSummary, Compartment, CreatedAlarm, Instance, Page};
use crate::services::{
    async_trait, AlarmQuery, ComputeService, IdentityService, InstanceQuery, MonitoringService,
};
use std::sync::Mutex;

/// Serves compartments, instances and alarms in pages of `page_size`
pub struct FakeCloud {
    pub compartments: Vec<Compartment>,
    pub instances: Vec<Instance>,
    pub alarms: Mutex<Vec<AlarmSummary>>,
    pub created: Mutex<Vec<AlarmSpec>>,
    pub alarm_list_calls: Mutex<Vec<(Option<String>, u32)>>,
    pub page_size: usize,
    /// Display names whose create call fails
    pub fail_on: Vec<String>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            compartments: Vec::new(),
            instances: Vec::new(),
            alarms: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            alarm_list_calls: Mutex::new(Vec::new()),
            page_size: 100,
            fail_on: Vec::new(),
        }
    }

    pub fn with_compartments(self, compartments: &[(&str, &str)]) -> Self {
        let states: Vec<_> = compartments
            .iter()
            .map(|(name, id)| (*name, *id, "ACTIVE"))
            .collect();
        self.with_compartment_states(&states)
    }

    pub fn with_compartment_states(mut self, compartments: &[(&str, &str, &str)]) -> Self {
        self.compartments = compartments
            .iter()
            .map(|(name, id, state)| Compartment {
                id: id.to_string(),
                name: name.to_string(),
                lifecycle_state: Some(state.to_string()),
            })
            .collect();
        self
    }

    pub fn with_instances(mut self, instances: &[(&str, &str)]) -> Self {
        self.instances = instances
            .iter()
            .map(|(name, state)| Instance {
                display_name: name.to_string(),
                lifecycle_state: state.to_string(),
            })
            .collect();
        self
    }

    pub fn with_running(self, names: &[&str]) -> Self {
        let pairs: Vec<(&str, &str)> = names.iter().map(|n| (*n, "RUNNING")).collect();
        self.with_instances(&pairs)
    }

    pub fn with_alarms(self, alarms: &[(&str, &str)]) -> Self {
        *self.alarms.lock().unwrap() = alarms
            .iter()
            .enumerate()
            .map(|(i, (name, state))| AlarmSummary {
                id: format!("ocid1.alarm.oc1..{i}"),
                display_name: name.to_string(),
                lifecycle_state: state.to_string(),
            })
            .collect();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn failing_on(mut self, display_name: &str) -> Self {
        self.fail_on.push(display_name.to_string());
        self
    }

    pub fn created_names(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|spec| spec.display_name.clone())
            .collect()
    }
}

fn paginate<T: Clone>(items: &[T], page: Option<String>, page_size: usize) -> Page<T> {
    let start: usize = page.map(|p| p.parse().unwrap()).unwrap_or(0);
    let end = (start + page_size).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    Page::new(items[start..end].to_vec(), next)
}

#[async_trait]
impl IdentityService for FakeCloud {
    async fn list_compartments(
        &self,
        _parent_id: &str,
        page: Option<String>,
    ) -> Result<Page<Compartment>> {
        Ok(paginate(&self.compartments, page, self.page_size))
    }
}

#[async_trait]
impl ComputeService for FakeCloud {
    async fn list_instances(
        &self,
        _compartment_id: &str,
        _query: &InstanceQuery,
        page: Option<String>,
    ) -> Result<Page<Instance>> {
        Ok(paginate(&self.instances, page, self.page_size))
    }
}

#[async_trait]
impl MonitoringService for FakeCloud {
    async fn list_alarms(
        &self,
        _compartment_id: &str,
        query: &AlarmQuery,
        page: Option<String>,
    ) -> Result<Page<AlarmSummary>> {
        self.alarm_list_calls
            .lock()
            .unwrap()
            .push((page.clone(), query.limit));
        let alarms = self.alarms.lock().unwrap();
        Ok(paginate(alarms.as_slice(), page, self.page_size))
    }

    async fn create_alarm(&self, spec: &AlarmSpec) -> Result<CreatedAlarm> {
        if self.fail_on.contains(&spec.display_name) {
            return Err(ProvisionError::Upstream {
                service: "monitoring",
                status: 400,
                code: "InvalidParameter".to_string(),
                message: format!("rejected {}", spec.display_name),
            });
        }

        let mut alarms = self.alarms.lock().unwrap();
        let id = format!("ocid1.alarm.oc1..new{}", alarms.len());
        alarms.push(AlarmSummary {
            id: id.clone(),
            display_name: spec.display_name.clone(),
            lifecycle_state: "ACTIVE".to_string(),
        });
        self.created.lock().unwrap().push(spec.clone());

        Ok(CreatedAlarm {
            id,
            display_name: spec.display_name.clone(),
            lifecycle_state: "ACTIVE".to_string(),
        })
    }
}
