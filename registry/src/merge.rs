//! Registry merge: signature-gated admission, stake filter, merge by
//! recency.

use std::collections::HashMap;

use koru_crypto::{owner_to_address, verify_signature};
use koru_types::{Address, NodeRegistration};

/// Merge `incoming` registrations into `existing`.
///
/// Incoming entries are admitted only if well-formed and their signature
/// validates over `data` for the claimed owner. The stake filter applies
/// to *every* entry, existing ones included, so owners that unstaked are
/// purged on each merge rather than lingering. Within an owner the entry
/// with the greatest `data.timestamp` wins; on a tie the first-seen entry
/// (existing before incoming) is kept, which makes the merge idempotent
/// and commutative on registration sets.
pub fn merge(
    existing: &[NodeRegistration],
    incoming: &[NodeRegistration],
    stakes: &HashMap<Address, u64>,
) -> Vec<NodeRegistration> {
    let verified_incoming = incoming.iter().filter(|reg| {
        if !reg.is_well_formed() {
            tracing::debug!(owner = %reg.owner, "dropping malformed registration");
            return false;
        }
        if !verify_signature(&reg.owner, &reg.data, &reg.signature) {
            tracing::debug!(owner = %reg.owner, "dropping registration with bad signature");
            return false;
        }
        true
    });

    let mut latest: HashMap<&str, &NodeRegistration> = HashMap::new();
    for reg in existing.iter().chain(verified_incoming) {
        if !reg.is_well_formed() {
            continue;
        }
        let Ok(address) = owner_to_address(&reg.owner) else {
            continue;
        };
        if !stakes.get(&address).is_some_and(|s| *s > 0) {
            continue;
        }

        match latest.get(reg.owner.as_str()) {
            Some(current) if current.data.timestamp >= reg.data.timestamp => {}
            _ => {
                latest.insert(&reg.owner, reg);
            }
        }
    }

    let mut merged: Vec<NodeRegistration> = latest.into_values().cloned().collect();
    // Deterministic output order; set semantics are what matter.
    merged.sort_by(|a, b| a.owner.cmp(&b.owner));
    merged
}
