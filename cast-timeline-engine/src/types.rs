//! Core types for the cast timeline engine
//!
//! This module defines the small value types shared by every stage of the
//! resolution pipeline: stats, effect kinds, target selection and errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Id of the fixed enemy actor
pub const ENEMY_ID: &str = "enemy";

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while editing or loading timeline state
///
/// The resolution passes themselves never fail: degenerate input is dropped
/// or clamped instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown actor: {0}")]
    UnknownActor(String),

    #[error("Unknown skill '{skill}' for actor '{actor}'")]
    UnknownSkill { actor: String, skill: String },

    #[error("Unknown cast event: {0}")]
    UnknownEvent(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Actor id '{0}' is reserved for the enemy")]
    ReservedActorId(String),

    #[error("The enemy actor cannot own cast events")]
    EnemyCaster,

    #[error("Actor '{0}' has more than one normal-state skill")]
    DuplicatePersistentSkill(String),

    #[error("Non-finite value in {0}")]
    NonFiniteValue(String),

    #[error("Invalid snapshot token: {0}")]
    InvalidToken(String),

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(#[from] serde_json::Error),

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
}

/// The stats an effect can modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stat {
    #[serde(rename = "atk")]
    Atk,
    #[serde(rename = "crit")]
    Crit,
    #[serde(rename = "critDmg", alias = "crit_dmg")]
    CritDmg,
}

impl Stat {
    /// All stats, in display order
    pub const ALL: [Stat; 3] = [Stat::Atk, Stat::Crit, Stat::CritDmg];
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stat::Atk => f.pad("atk"),
            Stat::Crit => f.pad("crit"),
            Stat::CritDmg => f.pad("critDmg"),
        }
    }
}

/// What an effect does to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    /// Adds its magnitude to the stat's modifier total
    Buff,
    /// Subtracts its magnitude from the stat's modifier total
    Debuff,
    /// Damage pulse; never contributes to stat totals
    Attack,
}

impl EffectKind {
    /// Signed contribution of an effect with this kind to a stat total
    pub fn contribution(&self, magnitude: f64) -> f64 {
        match self {
            EffectKind::Buff => magnitude,
            EffectKind::Debuff => -magnitude,
            EffectKind::Attack => 0.0,
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectKind::Buff => f.pad("buff"),
            EffectKind::Debuff => f.pad("debuff"),
            EffectKind::Attack => f.pad("attack"),
        }
    }
}

/// How the targets of an effect are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetMode {
    /// The casting actor only
    #[default]
    #[serde(rename = "self")]
    Owner,
    /// The enemy actor only, regardless of any id list
    #[serde(rename = "enemy")]
    Enemy,
    /// Every actor except the enemy
    #[serde(rename = "all")]
    AllStudents,
    /// An explicit list of actors
    #[serde(rename = "student")]
    Students,
}

impl fmt::Display for TargetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetMode::Owner => f.pad("self"),
            TargetMode::Enemy => f.pad("enemy"),
            TargetMode::AllStudents => f.pad("all"),
            TargetMode::Students => f.pad("student"),
        }
    }
}

/// A target mode together with the ids it may refer to
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetSpec {
    pub mode: TargetMode,
    /// Explicit target ids (only consulted in `student` mode)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
}

impl TargetSpec {
    pub fn new(mode: TargetMode) -> Self {
        Self { mode, ids: Vec::new() }
    }

    /// Student mode with an explicit id list
    pub fn students<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: TargetMode::Students,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Skill kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    /// "ex" skill: placed any number of times, each placement independent
    #[serde(rename = "ex")]
    Instant,
    /// "ns" skill: one per actor, placements share a stack group
    #[serde(rename = "ns")]
    Persistent,
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillKind::Instant => f.pad("ex"),
            SkillKind::Persistent => f.pad("ns"),
        }
    }
}

/// Base (or computed) stat vector of an actor
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BaseStats {
    pub atk: f64,
    pub crit: f64,
    #[serde(rename = "critDmg", alias = "crit_dmg")]
    pub crit_dmg: f64,
}

impl BaseStats {
    pub fn new(atk: f64, crit: f64, crit_dmg: f64) -> Self {
        Self { atk, crit, crit_dmg }
    }

    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Atk => self.atk,
            Stat::Crit => self.crit,
            Stat::CritDmg => self.crit_dmg,
        }
    }

    pub fn is_finite(&self) -> bool {
        Stat::ALL.iter().all(|s| self.get(*s).is_finite())
    }

    pub fn get_mut(&mut self, stat: Stat) -> &mut f64 {
        match stat {
            Stat::Atk => &mut self.atk,
            Stat::Crit => &mut self.crit,
            Stat::CritDmg => &mut self.crit_dmg,
        }
    }
}
