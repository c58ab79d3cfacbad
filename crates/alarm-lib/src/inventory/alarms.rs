use crate::error::Result;
use crate::models::ExistingAlarms;
use crate::services::{collect_pages, AlarmQuery, MonitoringService};

/// Display names of every active alarm in a compartment
///
/// All pages are drained: a short count here turns into duplicate alarms.
pub async fn list_active_alarm_names(
    monitoring: &dyn MonitoringService,
    compartment_id: &str,
) -> Result<ExistingAlarms> {
    let query = AlarmQuery::active();
    let alarms = collect_pages("monitoring", |page| {
        monitoring.list_alarms(compartment_id, &query, page)
    })
    .await?;

    let names: ExistingAlarms = alarms
        .into_iter()
        .filter(|alarm| alarm.is_active())
        .map(|alarm| alarm.display_name)
        .collect();

    tracing::debug!(compartment_id, count = names.len(), "Listed active alarms");
    Ok(names)
}
