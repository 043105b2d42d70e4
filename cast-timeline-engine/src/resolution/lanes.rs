//! Display lane assignment
//!
//! Greedy interval partitioning: instances sorted by start go into the first
//! lane that is free at their start time. Taking the lowest free lane keeps the
//! layout stable between recomputations. Lanes only affect rendering.

use super::instance::{by_start_then_id, EffectInstance, InstanceId};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Lanes for the instances of one target
#[derive(Debug, Clone, PartialEq)]
pub struct LaneAssignment {
    lanes: BTreeMap<InstanceId, usize>,
    lane_count: usize,
}

impl LaneAssignment {
    /// Lane of an instance, if it was part of the assignment
    pub fn lane_of(&self, id: &InstanceId) -> Option<usize> {
        self.lanes.get(id).copied()
    }

    /// Number of lanes to reserve; at least 1 even with no instances
    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstanceId, usize)> {
        self.lanes.iter().map(|(id, lane)| (id, *lane))
    }
}

impl Default for LaneAssignment {
    fn default() -> Self {
        Self {
            lanes: BTreeMap::new(),
            lane_count: 1,
        }
    }
}

/// Assign lanes to the instances of a single target
pub fn assign_lanes<'a, I>(instances: I) -> LaneAssignment
where
    I: IntoIterator<Item = &'a EffectInstance>,
{
    let mut sorted: Vec<&EffectInstance> = instances.into_iter().collect();
    sorted.sort_by(|a, b| by_start_then_id(a, b));

    let mut lane_ends: Vec<f64> = Vec::new();
    let mut lanes = BTreeMap::new();

    for instance in sorted {
        let lane = match lane_ends.iter().position(|end| *end <= instance.start) {
            Some(free) => free,
            None => {
                lane_ends.push(instance.start);
                lane_ends.len() - 1
            }
        };
        lane_ends[lane] = instance.end;
        lanes.insert(instance.id.clone(), lane);
    }

    LaneAssignment {
        lanes,
        lane_count: lane_ends.len().max(1),
    }
}

/// Assign lanes independently for every target
pub fn assign_lanes_by_target(instances: &[EffectInstance]) -> BTreeMap<String, LaneAssignment> {
    let mut by_target: BTreeMap<&str, Vec<&EffectInstance>> = BTreeMap::new();
    for instance in instances {
        by_target.entry(instance.target_id()).or_default().push(instance);
    }

    by_target
        .into_iter()
        .map(|(target, group)| (target.to_string(), assign_lanes(group)))
        .collect()
}

/// Largest number of instances active at the same instant
///
/// Intervals are closed-open, so one ending exactly when another starts does
/// not count as overlapping.
pub fn peak_concurrency<'a, I>(instances: I) -> usize
where
    I: IntoIterator<Item = &'a EffectInstance>,
{
    // (time, delta): ends sort before starts at the same time
    let mut edges: Vec<(f64, i32)> = Vec::new();
    for instance in instances {
        edges.push((instance.start, 1));
        edges.push((instance.end, -1));
    }
    edges.sort_by(|a, b| match a.0.total_cmp(&b.0) {
        Ordering::Equal => a.1.cmp(&b.1),
        other => other,
    });

    let mut active = 0i32;
    let mut peak = 0i32;
    for (_, delta) in edges {
        active += delta;
        peak = peak.max(active);
    }
    peak as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::instance::test_instance;

    #[test]
    fn test_empty_reserves_one_lane() {
        let assignment = assign_lanes(std::iter::empty());
        assert_eq!(assignment.lane_count(), 1);
        assert!(assignment.is_empty());
        assert_eq!(LaneAssignment::default().lane_count(), 1);
    }

    #[test]
    fn test_first_fit_reuses_lowest_lane() {
        let instances = vec![
            test_instance("e1", "a1", "g1", 0.0, 4.0),
            test_instance("e2", "a1", "g2", 1.0, 6.0),
            test_instance("e3", "a1", "g3", 2.0, 3.0),
            test_instance("e4", "a1", "g4", 4.0, 5.0),
            test_instance("e5", "a1", "g5", 6.0, 7.0),
        ];

        let assignment = assign_lanes(&instances);
        let lane = |event: &str| assignment.lane_of(&InstanceId::new(event, "fx", "a1"));

        assert_eq!(lane("e1"), Some(0));
        assert_eq!(lane("e2"), Some(1));
        assert_eq!(lane("e3"), Some(2));
        // Lane 0 frees at 4.0 exactly
        assert_eq!(lane("e4"), Some(0));
        assert_eq!(lane("e5"), Some(0));
        assert_eq!(assignment.lane_count(), 3);
        assert_eq!(assignment.lane_count(), peak_concurrency(&instances));
    }

    #[test]
    fn test_assignment_per_target() {
        let instances = vec![
            test_instance("e1", "a1", "g1", 0.0, 4.0),
            test_instance("e2", "a1", "g2", 1.0, 6.0),
            test_instance("e1", "a2", "g1", 0.0, 4.0),
        ];

        let lanes = assign_lanes_by_target(&instances);
        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes["a1"].lane_count(), 2);
        assert_eq!(lanes["a2"].lane_count(), 1);
    }

    #[test]
    fn test_peak_concurrency_closed_open() {
        let instances = vec![
            test_instance("e1", "a1", "g1", 0.0, 2.0),
            test_instance("e2", "a1", "g2", 2.0, 4.0),
            test_instance("e3", "a1", "g3", 2.0, 4.0),
        ];
        assert_eq!(peak_concurrency(&instances), 2);
        assert_eq!(peak_concurrency(std::iter::empty()), 0);
    }
}
