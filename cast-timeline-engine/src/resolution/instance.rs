//! Effect instances and the composite keys used to group them

use crate::types::{EffectKind, Stat};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Deterministic identity of an effect instance
///
/// Derived from the cast event, the effect definition and the target, so the
/// same inputs always produce the same id and a rendered instance can be
/// traced back to the event and effect that produced it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId {
    pub event_id: String,
    pub effect_id: String,
    pub target_id: String,
}

impl InstanceId {
    pub fn new(
        event_id: impl Into<String>,
        effect_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            effect_id: effect_id.into(),
            target_id: target_id.into(),
        }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.event_id, self.effect_id, self.target_id)
    }
}

/// One effect definition applied from one cast event to one target over `[start, end)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectInstance {
    pub id: InstanceId,
    /// Actor that cast the owning event
    pub source_id: String,
    pub kind: EffectKind,
    pub stat: Stat,
    pub magnitude: f64,
    pub stack_group: String,
    /// Start time in seconds (inclusive)
    pub start: f64,
    /// End time in seconds (exclusive)
    pub end: f64,
}

impl EffectInstance {
    pub fn target_id(&self) -> &str {
        &self.id.target_id
    }

    pub fn event_id(&self) -> &str {
        &self.id.event_id
    }

    pub fn effect_id(&self) -> &str {
        &self.id.effect_id
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Closed-open activity test: active at `start`, inactive at `end`
    pub fn is_active_at(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// True if the interval is non-empty and finite
    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.end > self.start
    }

    pub fn overlaps(&self, other: &EffectInstance) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Conflict key for overwrite resolution
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            target_id: self.id.target_id.clone(),
            stat: self.stat,
            stack_group: self.stack_group.clone(),
            kind: self.kind,
        }
    }

    /// Grouping key used by the stat aggregator
    pub fn aggregate_key(&self) -> AggregateKey {
        AggregateKey {
            stat: self.stat,
            stack_group: self.stack_group.clone(),
            kind: self.kind,
        }
    }
}

/// Modifier slot: at most one instance per key is live at any instant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub target_id: String,
    pub stat: Stat,
    pub stack_group: String,
    pub kind: EffectKind,
}

/// Aggregator grouping: a slot key without the target
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregateKey {
    pub stat: Stat,
    pub stack_group: String,
    pub kind: EffectKind,
}

/// Order by start time, then by id
pub fn by_start_then_id(a: &EffectInstance, b: &EffectInstance) -> Ordering {
    a.start.total_cmp(&b.start).then_with(|| a.id.cmp(&b.id))
}

/// Canonical output order: target, then start, then id
pub fn canonical_order(a: &EffectInstance, b: &EffectInstance) -> Ordering {
    a.id
        .target_id
        .cmp(&b.id.target_id)
        .then_with(|| by_start_then_id(a, b))
}

#[cfg(test)]
pub(crate) fn test_instance(
    event_id: &str,
    target_id: &str,
    group: &str,
    start: f64,
    end: f64,
) -> EffectInstance {
    EffectInstance {
        id: InstanceId::new(event_id, "fx", target_id),
        source_id: "a1".to_string(),
        kind: EffectKind::Buff,
        stat: Stat::Atk,
        magnitude: 0.1,
        stack_group: group.to_string(),
        start,
        end,
    }
}
