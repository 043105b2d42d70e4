//! Cast Timeline Engine
//!
//! A pure, deterministic engine that turns timed skill casts into the stat
//! modifiers they produce over time.
//!
//! # Architecture
//!
//! The pipeline runs in four stages over an immutable [`TimelineState`]:
//! - **Expansion**: every cast event × effect definition × resolved target
//!   becomes a time-bounded [`EffectInstance`]
//! - **Overwrite resolution**: instances competing for the same modifier slot
//!   (target, stat, stack group, kind) are trimmed so the newest one wins
//! - **Lane assignment**: per target, instances are packed into the fewest
//!   non-overlapping display rows
//! - **Aggregation**: point-in-time queries sum the live modifiers into an
//!   actor's computed stats
//!
//! The library does NOT:
//! - Simulate damage or combat outcomes
//! - Trigger skills automatically
//! - Perform any I/O
//!
//! Editing, rendering and persistence live in the application layer
//! (cast-timeline-cli); the whole state travels as a snapshot token.
//!
//! # Example Usage
//!
//! ```
//! use cast_timeline_engine::{
//!     resolve, Actor, BaseStats, CastEvent, EffectDefinition, Skill, SkillKind, Stat,
//!     TimelineConfig, TimelineState,
//! };
//!
//! let mut state = TimelineState::new(TimelineConfig::new().with_length(60.0));
//! state
//!     .add_actor(
//!         Actor::new("a1", "Striker", BaseStats::new(1000.0, 0.2, 1.5)).with_skill(
//!             Skill::new("burst", "Burst", SkillKind::Instant)
//!                 .with_effect(EffectDefinition::buff("atk_up", Stat::Atk, 0.3, 10.0)),
//!         ),
//!     )
//!     .unwrap();
//! state.place_event(CastEvent::instant("e1", "a1", "burst", 5.0)).unwrap();
//!
//! let resolution = resolve(&state);
//! let stats = resolution.stats_at("a1", 6.0).unwrap();
//! assert!((stats.computed.atk - 1300.0).abs() < 1e-9);
//! ```

// Public modules
pub mod config;
pub mod definitions;
pub mod engine;
pub mod resolution;
pub mod snapshot;
pub mod state;
pub mod types;

// Re-export main types for convenience
pub use config::TimelineConfig;
pub use definitions::{Actor, CastEvent, EffectDefinition, Skill, SkillRef};
pub use engine::{resolve, Resolution, ResolutionStats};
pub use resolution::{EffectInstance, InstanceId, LaneAssignment, StatModifiers, StatSnapshot};
pub use snapshot::Snapshot;
pub use state::{DefinitionIssue, DefinitionWarning, TimelineState};
pub use types::{
    BaseStats, EffectKind, EngineError, Result, SkillKind, Stat, TargetMode, TargetSpec, ENEMY_ID,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
