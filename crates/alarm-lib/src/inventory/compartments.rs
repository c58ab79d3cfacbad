//! Compartment listing and name resolution

use crate::error::{ProvisionError, Result};
use crate::models::CompartmentMap;
use crate::services::{collect_pages, IdentityService};
use serde::{Deserialize, Serialize};

/// How to settle an input that matches several compartment names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Exact (case-insensitive) name wins, otherwise several matches is an error
    #[default]
    Strict,
    /// The last matching name in name order wins
    LastMatch,
}

/// List the active compartments directly under the tenancy root, keyed by name
pub async fn list_compartments(
    identity: &dyn IdentityService,
    tenancy_id: &str,
) -> Result<CompartmentMap> {
    let compartments = collect_pages("identity", |page| {
        identity.list_compartments(tenancy_id, page)
    })
    .await?;

    let map: CompartmentMap = compartments
        .into_iter()
        .filter(|compartment| compartment.is_active())
        .map(|compartment| (compartment.name, compartment.id))
        .collect();

    tracing::debug!(count = map.len(), "Listed compartments");
    Ok(map)
}

/// Resolve an operator's name fragment to a compartment id
///
/// Matching is a case-insensitive substring test of `input` against each
/// compartment name.
pub fn resolve_compartment(
    compartments: &CompartmentMap,
    input: &str,
    policy: MatchPolicy,
) -> Result<String> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Err(ProvisionError::NotFound {
            input: input.to_string(),
        });
    }

    let matches: Vec<(&String, &String)> = compartments
        .iter()
        .filter(|(name, _)| name.to_lowercase().contains(&needle))
        .collect();

    let chosen = match (policy, matches.as_slice()) {
        (_, []) => None,
        (MatchPolicy::LastMatch, [.., last]) => Some(*last),
        (MatchPolicy::Strict, [only]) => Some(*only),
        (MatchPolicy::Strict, many) => {
            let exact = many
                .iter()
                .find(|(name, _)| name.to_lowercase() == needle)
                .copied();
            if exact.is_none() {
                return Err(ProvisionError::AmbiguousMatch {
                    input: input.to_string(),
                    candidates: many.iter().map(|(name, _)| name.to_string()).collect(),
                });
            }
            exact
        }
    };

    match chosen {
        Some((name, id)) => {
            tracing::info!(compartment = %name, compartment_id = %id, "Resolved compartment");
            Ok(id.clone())
        }
        None => Err(ProvisionError::NotFound {
            input: input.to_string(),
        }),
    }
}
