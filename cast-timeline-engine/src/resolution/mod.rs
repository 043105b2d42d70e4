//! Effect resolution pipeline
//!
//! Expansion, overwrite resolution, lane assignment and stat aggregation. Each
//! stage is a pure function over explicit inputs so it can be run and tested
//! on its own.

pub mod aggregate;
pub mod expander;
pub mod instance;
pub mod lanes;
pub mod overwrite;
pub mod targeting;

// Re-export key types for convenience
pub use aggregate::{aggregate_stats, StatModifiers, StatSnapshot};
pub use expander::{effect_duration, expand, Expansion};
pub use instance::{AggregateKey, EffectInstance, InstanceId, SlotKey};
pub use lanes::{assign_lanes, assign_lanes_by_target, peak_concurrency, LaneAssignment};
pub use overwrite::resolve_overwrites;
pub use targeting::{resolve_targets, TargetRequest, TargetUniverse};
