//! Ports to the cloud services the provisioner consumes
//!
//! The identity, compute and monitoring services are black boxes. The
//! library only talks to them through these traits, one page at a time;
//! [`collect_pages`] turns a paged listing into a complete one.

use crate::error::{ProvisionError, Result};
use crate::models::{AlarmSpec, AlarmSummary, Compartment, CreatedAlarm, Instance, Page};
use std::collections::HashSet;
use std::future::Future;

pub use async_trait::async_trait;

/// Page size requested from the alarm listing
pub const ALARM_PAGE_LIMIT: u32 = 800;

/// Sort direction for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filters for the instance listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceQuery {
    pub lifecycle_state: String,
    pub sort_order: SortOrder,
}

impl InstanceQuery {
    pub fn running() -> Self {
        Self {
            lifecycle_state: crate::models::INSTANCE_RUNNING.to_string(),
            sort_order: SortOrder::Desc,
        }
    }
}

/// Filters for the alarm listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmQuery {
    pub limit: u32,
    pub lifecycle_state: String,
    pub sort_by: String,
    pub sort_order: SortOrder,
}

impl AlarmQuery {
    pub fn active() -> Self {
        Self {
            limit: ALARM_PAGE_LIMIT,
            lifecycle_state: crate::models::ALARM_ACTIVE.to_string(),
            sort_by: "displayName".to_string(),
            sort_order: SortOrder::Asc,
        }
    }
}

/// Compartment listing
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// List one page of the compartments directly under `parent_id`, sorted by name
    async fn list_compartments(
        &self,
        parent_id: &str,
        page: Option<String>,
    ) -> Result<Page<Compartment>>;
}

/// Compute instance listing
#[async_trait]
pub trait ComputeService: Send + Sync {
    async fn list_instances(
        &self,
        compartment_id: &str,
        query: &InstanceQuery,
        page: Option<String>,
    ) -> Result<Page<Instance>>;
}

/// Alarm listing and creation
#[async_trait]
pub trait MonitoringService: Send + Sync {
    async fn list_alarms(
        &self,
        compartment_id: &str,
        query: &AlarmQuery,
        page: Option<String>,
    ) -> Result<Page<AlarmSummary>>;

    async fn create_alarm(&self, spec: &AlarmSpec) -> Result<CreatedAlarm>;
}

/// Fetch every page of a listing, starting from the first
///
/// Stops when a page carries no next-page token. A token that was already
/// followed means the listing cycles, which is a decode failure.
pub async fn collect_pages<T, F, Fut>(service: &'static str, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    let mut followed: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        let page = fetch(token.clone()).await?;
        pages += 1;
        items.extend(page.items);

        match page.next_page {
            Some(next) if followed.contains(&next) => {
                return Err(ProvisionError::Decode {
                    service,
                    message: format!("next page token {next:?} repeated"),
                });
            }
            Some(next) => {
                followed.insert(next.clone());
                token = Some(next);
            }
            None => break,
        }
    }

    tracing::debug!(service, pages, items = items.len(), "Listing complete");
    Ok(items)
}
