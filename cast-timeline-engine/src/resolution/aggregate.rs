//! Point-in-time stat aggregation
//!
//! Modifiers on the same stat add up linearly and are then applied to the base
//! value as one multiplier: `computed = base × (1 + total)`.

use super::instance::{AggregateKey, EffectInstance};
use crate::types::{BaseStats, Stat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Net fractional modifier per stat
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatModifiers {
    pub atk: f64,
    pub crit: f64,
    #[serde(rename = "critDmg")]
    pub crit_dmg: f64,
}

impl StatModifiers {
    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Atk => self.atk,
            Stat::Crit => self.crit,
            Stat::CritDmg => self.crit_dmg,
        }
    }

    pub fn add(&mut self, stat: Stat, fraction: f64) {
        match stat {
            Stat::Atk => self.atk += fraction,
            Stat::Crit => self.crit += fraction,
            Stat::CritDmg => self.crit_dmg += fraction,
        }
    }

    /// Apply the modifiers to a base stat vector
    pub fn apply_to(&self, base: &BaseStats) -> BaseStats {
        let mut computed = *base;
        for stat in Stat::ALL {
            *computed.get_mut(stat) = base.get(stat) * (1.0 + self.get(stat));
        }
        computed
    }
}

/// Result of a stat query for one actor at one time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub actor_id: String,
    pub time: f64,
    /// Every instance targeting the actor that is active at `time`
    pub active: Vec<EffectInstance>,
    /// The active instances that survived per-group selection
    pub applied: Vec<EffectInstance>,
    pub modifiers: StatModifiers,
    pub computed: BaseStats,
}

/// Compute an actor's stats at time `t`
///
/// Active instances are grouped by (stat, stack group, kind) regardless of
/// which actor cast them; only the latest-starting instance of each group
/// counts. Overwrite resolution already keeps slots free of overlaps, so this
/// only matters when upstream data still overlaps.
pub fn aggregate_stats(
    actor_id: &str,
    base: &BaseStats,
    instances: &[EffectInstance],
    t: f64,
) -> StatSnapshot {
    let active: Vec<EffectInstance> = instances
        .iter()
        .filter(|i| i.target_id() == actor_id && i.is_active_at(t))
        .cloned()
        .collect();

    let mut latest: BTreeMap<AggregateKey, &EffectInstance> = BTreeMap::new();
    for instance in &active {
        latest
            .entry(instance.aggregate_key())
            .and_modify(|current| {
                if supersedes(instance, current) {
                    *current = instance;
                }
            })
            .or_insert(instance);
    }

    let mut modifiers = StatModifiers::default();
    for instance in latest.values() {
        modifiers.add(instance.stat, instance.kind.contribution(instance.magnitude));
    }

    let applied: Vec<EffectInstance> = latest.into_values().cloned().collect();

    StatSnapshot {
        actor_id: actor_id.to_string(),
        time: t,
        computed: modifiers.apply_to(base),
        active,
        applied,
        modifiers,
    }
}

/// Later start wins; equal starts fall back to the larger id
fn supersedes(candidate: &EffectInstance, current: &EffectInstance) -> bool {
    match candidate.start.total_cmp(&current.start) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => candidate.id > current.id,
    }
}
