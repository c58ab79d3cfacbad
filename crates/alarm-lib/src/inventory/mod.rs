//! Read-only views of the tenancy
//!
//! Each inventory drains every page of its listing and filters to the
//! lifecycle state that matters for provisioning:
//! - Compartments under the tenancy root, resolved from an operator's input
//! - Running instances in a compartment
//! - Active alarm names in a compartment

mod alarms;
mod compartments;
mod instances;

pub use alarms::list_active_alarm_names;
pub use compartments::{list_compartments, resolve_compartment, MatchPolicy};
pub use instances::list_running_instances;
