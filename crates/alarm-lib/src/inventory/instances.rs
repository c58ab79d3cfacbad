use crate::error::Result;
use crate::services::{collect_pages, ComputeService, InstanceQuery};

/// Display names of the running instances in a compartment, in listing order
pub async fn list_running_instances(
    compute: &dyn ComputeService,
    compartment_id: &str,
) -> Result<Vec<String>> {
    let query = InstanceQuery::running();
    let instances = collect_pages("compute", |page| {
        compute.list_instances(compartment_id, &query, page)
    })
    .await?;

    let names: Vec<String> = instances
        .into_iter()
        .filter(|instance| instance.is_running())
        .map(|instance| instance.display_name)
        .collect();

    tracing::debug!(compartment_id, count = names.len(), "Listed running instances");
    Ok(names)
}
