//! Main engine API
//!
//! [`resolve`] is the entry point: it runs expansion, overwrite resolution and
//! lane assignment over a [`TimelineState`] and returns a [`Resolution`] that
//! answers rendering and point-in-time stat queries.

use crate::resolution::{
    aggregate_stats, assign_lanes_by_target, expand, resolve_overwrites, EffectInstance,
    InstanceId, LaneAssignment, StatSnapshot,
};
use crate::state::TimelineState;
use crate::types::BaseStats;
use std::collections::BTreeMap;

/// Derived output of one resolution pass
///
/// Owns everything it needs; it does not borrow the state it came from, so
/// the editor can keep mutating its state while a resolution is displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    instances: Vec<EffectInstance>,
    lanes: BTreeMap<String, LaneAssignment>,
    bases: BTreeMap<String, BaseStats>,
    stats: ResolutionStats,
}

/// Counters describing one resolution pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolutionStats {
    /// Cast events considered
    pub num_events: usize,
    /// Events skipped because their actor or skill is missing
    pub num_skipped_events: usize,
    /// Instances produced by expansion
    pub num_raw_instances: usize,
    /// Instances left after overwrite resolution
    pub num_resolved_instances: usize,
    /// Distinct targets with at least one resolved instance
    pub num_targets: usize,
}

/// Resolve a timeline state
///
/// Pure and deterministic: the same state always produces the same resolution.
pub fn resolve(state: &TimelineState) -> Resolution {
    let roster = state.roster();
    let expansion = expand(&roster, state.events(), state.config());
    let num_raw_instances = expansion.instances.len();

    let instances = resolve_overwrites(expansion.instances);
    let lanes = assign_lanes_by_target(&instances);

    let stats = ResolutionStats {
        num_events: state.events().len(),
        num_skipped_events: expansion.skipped_events,
        num_raw_instances,
        num_resolved_instances: instances.len(),
        num_targets: lanes.len(),
    };
    log::debug!(
        "Resolved {} events into {} instances across {} targets",
        stats.num_events,
        stats.num_resolved_instances,
        stats.num_targets
    );

    let bases = roster.into_iter().map(|a| (a.id, a.base)).collect();

    Resolution {
        instances,
        lanes,
        bases,
        stats,
    }
}

impl Resolution {
    /// All resolved instances, ordered by target, start and id
    pub fn instances(&self) -> &[EffectInstance] {
        &self.instances
    }

    /// Resolved instances landing on one target
    pub fn instances_for<'a>(&'a self, target_id: &'a str) -> impl Iterator<Item = &'a EffectInstance> + 'a {
        self.instances.iter().filter(move |i| i.target_id() == target_id)
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&EffectInstance> {
        self.instances.iter().find(|i| &i.id == id)
    }

    /// Lane layout for one target; targets without instances get one empty lane
    pub fn lanes_for(&self, target_id: &str) -> LaneAssignment {
        self.lanes.get(target_id).cloned().unwrap_or_default()
    }

    /// Lane layouts of every target that has instances
    pub fn lanes(&self) -> &BTreeMap<String, LaneAssignment> {
        &self.lanes
    }

    /// Computed stats of an actor at time `t`, or `None` for an unknown actor
    pub fn stats_at(&self, actor_id: &str, t: f64) -> Option<StatSnapshot> {
        let base = self.bases.get(actor_id)?;
        Some(aggregate_stats(actor_id, base, &self.instances, t))
    }

    pub fn stats(&self) -> ResolutionStats {
        self.stats
    }
}
