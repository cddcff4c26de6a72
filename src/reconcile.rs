//! # Reconciliation Module
//!
//! The decision core of the crate: compare the live fleet against the
//! configured load-balancer targets and decide what, if anything, to write
//! back. Pure computation with no I/O and no clock, so every rule here is
//! exhaustively testable without fakes.
//!
//! ## Decision Rules
//! - The live set and configured set are compared by set difference in both
//!   directions; ordering never matters.
//! - Any difference triggers an update, as does a fleet of exactly one
//!   instance (a single instance is addressed directly, bypassing the
//!   balancer).
//! - The replacement is the live set when two or more instances are running,
//!   otherwise the empty set.
//! - A replacement equal to what is already configured is reported as
//!   [`ReconcileDecision::Unchanged`], so repeated passes over a stable fleet
//!   reach a fixed point and produce no writes.

use crate::core::types::{AddressSet, InstanceUrl, ReconcileDecision};

/// Decide whether the configured target set must be replaced
///
/// `live` is the fleet snapshot, `configured` the currently persisted target
/// set. `exclude_self` removes the caller's own address from the live set
/// before any comparison; a draining instance uses this to take itself out
/// of rotation. An excluded address that the fleet does not list has no
/// effect.
pub fn reconcile(
    live: &AddressSet,
    configured: &AddressSet,
    exclude_self: Option<&InstanceUrl>,
) -> ReconcileDecision {
    let drained;
    let live = match exclude_self {
        Some(own) if live.contains(own) => {
            drained = live
                .iter()
                .filter(|addr| *addr != own)
                .cloned()
                .collect::<AddressSet>();
            &drained
        }
        _ => live,
    };

    let appeared = live.difference(configured).count();
    let departed = configured.difference(live).count();

    // A lone instance is special: traffic goes to it directly, so the
    // balancer target list is emptied even when the sets match.
    let update_needed = appeared > 0 || departed > 0 || live.len() == 1;
    if !update_needed {
        return ReconcileDecision::Unchanged;
    }

    let candidate = if live.len() > 1 {
        live.clone()
    } else {
        AddressSet::new()
    };

    if &candidate == configured {
        ReconcileDecision::Unchanged
    } else {
        ReconcileDecision::Replace(candidate)
    }
}
