//! Overwrite resolution
//!
//! Recasting an effect into a slot that is already occupied replaces what is
//! there: the newer instance wins the rest of the overlap. After this pass every
//! [`SlotKey`] holds time-ordered, pairwise non-overlapping instances.
//!
//! Instances in different stack groups never compete here; they coexist and
//! are summed by the stat aggregator.

use super::instance::{by_start_then_id, canonical_order, EffectInstance, SlotKey};
use std::collections::BTreeMap;

/// Enforce the one-live-instance-per-slot rule
///
/// The result does not depend on input order: each slot is sorted by start
/// time and then by instance id before the sweep, and the output is returned
/// in canonical order. Running this on its own output returns it unchanged.
pub fn resolve_overwrites(instances: Vec<EffectInstance>) -> Vec<EffectInstance> {
    let total = instances.len();
    let mut slots: BTreeMap<SlotKey, Vec<EffectInstance>> = BTreeMap::new();

    for instance in instances {
        if !instance.is_valid() {
            log::trace!("Discarding empty instance {}", instance.id);
            continue;
        }
        slots.entry(instance.slot_key()).or_default().push(instance);
    }

    let slot_count = slots.len();
    let mut resolved = Vec::with_capacity(total);
    for (_, group) in slots {
        resolved.extend(sweep_slot(group));
    }
    resolved.sort_by(canonical_order);

    log::debug!(
        "Overwrite resolution: {} instances in {} slots -> {} resolved",
        total,
        slot_count,
        resolved.len()
    );

    resolved
}

/// Sweep one slot left to right, trimming each accepted instance at the start
/// of the next one
fn sweep_slot(mut group: Vec<EffectInstance>) -> Vec<EffectInstance> {
    group.sort_by(by_start_then_id);

    let mut accepted: Vec<EffectInstance> = Vec::with_capacity(group.len());
    for next in group {
        if let Some(prev) = accepted.last_mut() {
            if next.start < prev.end {
                log::trace!("{} overwrites {} at {}", next.id, prev.id, next.start);
                prev.end = next.start;
                if prev.end <= prev.start {
                    accepted.pop();
                }
            }
        }
        accepted.push(next);
    }

    accepted.retain(|i| i.end > i.start);
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::instance::test_instance;

    fn intervals(instances: &[EffectInstance]) -> Vec<(&str, f64, f64)> {
        instances
            .iter()
            .map(|i| (i.event_id(), i.start, i.end))
            .collect()
    }

    #[test]
    fn test_later_start_truncates_earlier() {
        let resolved = resolve_overwrites(vec![
            test_instance("e1", "a1", "field", 0.0, 10.0),
            test_instance("e2", "a1", "field", 4.0, 14.0),
        ]);

        assert_eq!(intervals(&resolved), vec![("e1", 0.0, 4.0), ("e2", 4.0, 14.0)]);
    }

    #[test]
    fn test_nested_instance_cuts_off_remainder() {
        let resolved = resolve_overwrites(vec![
            test_instance("e1", "a1", "field", 0.0, 20.0),
            test_instance("e2", "a1", "field", 5.0, 8.0),
        ]);

        // The newer instance wins; the older one does not resume afterwards
        assert_eq!(intervals(&resolved), vec![("e1", 0.0, 5.0), ("e2", 5.0, 8.0)]);
    }

    #[test]
    fn test_same_start_keeps_highest_id() {
        let resolved = resolve_overwrites(vec![
            test_instance("e2", "a1", "field", 3.0, 6.0),
            test_instance("e1", "a1", "field", 3.0, 9.0),
        ]);

        assert_eq!(intervals(&resolved), vec![("e2", 3.0, 6.0)]);
    }

    #[test]
    fn test_different_slots_coexist() {
        let resolved = resolve_overwrites(vec![
            test_instance("e1", "a1", "field", 0.0, 10.0),
            test_instance("e2", "a1", "ns", 2.0, 12.0),
            test_instance("e3", "a2", "field", 2.0, 12.0),
        ]);

        assert_eq!(resolved.len(), 3);
        assert!(resolved.iter().all(|i| i.duration() == 10.0));
    }

    #[test]
    fn test_touching_instances_untouched() {
        let input = vec![
            test_instance("e1", "a1", "field", 0.0, 5.0),
            test_instance("e2", "a1", "field", 5.0, 10.0),
        ];
        let resolved = resolve_overwrites(input.clone());
        assert_eq!(resolved, input);
    }

    #[test]
    fn test_invalid_instances_discarded() {
        let resolved = resolve_overwrites(vec![
            test_instance("e1", "a1", "field", 5.0, 5.0),
            test_instance("e2", "a1", "field", 6.0, 2.0),
            test_instance("e3", "a1", "field", 1.0, 2.0),
        ]);
        assert_eq!(intervals(&resolved), vec![("e3", 1.0, 2.0)]);
    }

    #[test]
    fn test_input_order_and_idempotence() {
        let input = vec![
            test_instance("e1", "a1", "field", 0.0, 10.0),
            test_instance("e2", "a1", "field", 2.0, 6.0),
            test_instance("e3", "a1", "field", 2.0, 4.0),
            test_instance("e4", "a1", "field", 5.0, 9.0),
        ];
        let mut reversed = input.clone();
        reversed.reverse();

        let forward = resolve_overwrites(input);
        let backward = resolve_overwrites(reversed);
        assert_eq!(forward, backward);
        assert_eq!(resolve_overwrites(forward.clone()), forward);

        assert_eq!(
            intervals(&forward),
            vec![("e1", 0.0, 2.0), ("e3", 2.0, 4.0), ("e4", 5.0, 9.0)]
        );
    }
}
