//! Actor, skill, effect and cast event definitions
//!
//! These are the inputs of the resolution pipeline. They are plain data: the
//! engine never mutates them while resolving.

use crate::types::{BaseStats, EffectKind, SkillKind, Stat, TargetSpec, ENEMY_ID};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stack group given to Persistent skill effects that don't name one
pub const PERSISTENT_STACK_GROUP: &str = "ns";

/// A student character or the enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Unique actor id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Base stat vector
    #[serde(default, alias = "baseStats")]
    pub base: BaseStats,
    /// Skills owned by this actor (always empty for the enemy)
    #[serde(default)]
    pub skills: Vec<Skill>,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, base: BaseStats) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base,
            skills: Vec::new(),
        }
    }

    /// The fixed enemy actor
    pub fn enemy(base: BaseStats) -> Self {
        Self::new(ENEMY_ID, "Enemy", base)
    }

    /// Builder method: add a skill
    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn is_enemy(&self) -> bool {
        self.id == ENEMY_ID
    }

    /// Find a skill by id
    pub fn skill(&self, skill_id: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == skill_id)
    }

    /// The actor's normal-state skill, if it has one
    pub fn persistent_skill(&self) -> Option<&Skill> {
        self.skills.iter().find(|s| s.kind == SkillKind::Persistent)
    }

    /// Find an Instant skill by id
    pub fn instant_skill(&self, skill_id: &str) -> Option<&Skill> {
        self.skills
            .iter()
            .find(|s| s.kind == SkillKind::Instant && s.id == skill_id)
    }
}

/// A named ability owned by one actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub kind: SkillKind,
    /// Effects applied by each placement, in declaration order
    #[serde(default)]
    pub effects: Vec<EffectDefinition>,
}

impl Skill {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: SkillKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            effects: Vec::new(),
        }
    }

    /// Builder method: add an effect definition
    pub fn with_effect(mut self, effect: EffectDefinition) -> Self {
        self.effects.push(effect);
        self
    }

    /// Find an effect definition by id
    pub fn effect(&self, effect_id: &str) -> Option<&EffectDefinition> {
        self.effects.iter().find(|e| e.id == effect_id)
    }

    /// Stack group an effect of this skill competes in
    ///
    /// Blank groups default to the skill id for Instant skills and to the shared
    /// normal-state group for Persistent skills.
    pub fn stack_group_of<'a>(&'a self, effect: &'a EffectDefinition) -> &'a str {
        let group = effect.stack_group.trim();
        if !group.is_empty() {
            return group;
        }
        match self.kind {
            SkillKind::Instant => &self.id,
            SkillKind::Persistent => PERSISTENT_STACK_GROUP,
        }
    }
}

/// A single stat modifier or attack pulse declared on a skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    pub id: String,
    pub kind: EffectKind,
    /// Affected stat (ignored for attacks)
    #[serde(default = "default_stat")]
    pub stat: Stat,
    /// Fractional modifier, e.g. 0.3 for +30%
    #[serde(default)]
    pub magnitude: f64,
    /// Nominal duration in seconds
    #[serde(default)]
    pub duration: f64,
    /// Effects in the same group overwrite each other, different groups add up
    #[serde(default, alias = "stackGroup")]
    pub stack_group: String,
    /// Default target, overriding the cast event's own target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetSpec>,
}

fn default_stat() -> Stat {
    Stat::Atk
}

impl EffectDefinition {
    pub fn new(
        id: impl Into<String>,
        kind: EffectKind,
        stat: Stat,
        magnitude: f64,
        duration: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            stat,
            magnitude,
            duration,
            stack_group: String::new(),
            target: None,
        }
    }

    pub fn buff(id: impl Into<String>, stat: Stat, magnitude: f64, duration: f64) -> Self {
        Self::new(id, EffectKind::Buff, stat, magnitude, duration)
    }

    pub fn debuff(id: impl Into<String>, stat: Stat, magnitude: f64, duration: f64) -> Self {
        Self::new(id, EffectKind::Debuff, stat, magnitude, duration)
    }

    pub fn attack(id: impl Into<String>, duration: f64) -> Self {
        Self::new(id, EffectKind::Attack, Stat::Atk, 0.0, duration)
    }

    /// Builder method: set the stack group
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.stack_group = group.into();
        self
    }

    /// Builder method: set the default target
    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.target = Some(target);
        self
    }
}

/// Which skill a cast event places
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SkillRef {
    /// An Instant skill, by id
    #[serde(rename = "ex")]
    Instant { skill_id: String },
    /// The owner's single Persistent skill
    #[serde(rename = "ns")]
    Persistent,
}

impl SkillRef {
    pub fn instant(skill_id: impl Into<String>) -> Self {
        SkillRef::Instant {
            skill_id: skill_id.into(),
        }
    }

    pub fn kind(&self) -> SkillKind {
        match self {
            SkillRef::Instant { .. } => SkillKind::Instant,
            SkillRef::Persistent => SkillKind::Persistent,
        }
    }

    /// Look up the referenced skill on its owner
    pub fn resolve<'a>(&self, owner: &'a Actor) -> Option<&'a Skill> {
        match self {
            SkillRef::Instant { skill_id } => owner.instant_skill(skill_id),
            SkillRef::Persistent => owner.persistent_skill(),
        }
    }

    /// True if this reference points at the given skill of its owner
    pub fn refers_to(&self, owner: &Actor, skill_id: &str) -> bool {
        self.resolve(owner).is_some_and(|s| s.id == skill_id)
    }
}

/// A timed placement of one skill on the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastEvent {
    pub id: String,
    /// Owning (casting) actor
    pub actor_id: String,
    pub skill: SkillRef,
    /// Start time in seconds
    pub start: f64,
    /// Overall duration in seconds; buffs and debuffs last this long when set
    #[serde(default)]
    pub duration: Option<f64>,
    /// Event-level target selection
    #[serde(default)]
    pub target: TargetSpec,
    /// Per-effect target overrides, keyed by effect definition id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub effect_targets: BTreeMap<String, TargetSpec>,
}

impl CastEvent {
    pub fn new(id: impl Into<String>, actor_id: impl Into<String>, skill: SkillRef, start: f64) -> Self {
        Self {
            id: id.into(),
            actor_id: actor_id.into(),
            skill,
            start,
            duration: None,
            target: TargetSpec::default(),
            effect_targets: BTreeMap::new(),
        }
    }

    /// Place an Instant skill
    pub fn instant(
        id: impl Into<String>,
        actor_id: impl Into<String>,
        skill_id: impl Into<String>,
        start: f64,
    ) -> Self {
        Self::new(id, actor_id, SkillRef::instant(skill_id), start)
    }

    /// Place the owner's Persistent skill
    pub fn persistent(id: impl Into<String>, actor_id: impl Into<String>, start: f64) -> Self {
        Self::new(id, actor_id, SkillRef::Persistent, start)
    }

    /// Builder method: set the overall duration
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Builder method: set the event-level target
    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.target = target;
        self
    }

    /// Builder method: override the target of one effect
    pub fn with_effect_target(mut self, effect_id: impl Into<String>, target: TargetSpec) -> Self {
        self.effect_targets.insert(effect_id.into(), target);
        self
    }

    /// End of the placement on the timeline (start if no duration is set)
    pub fn end(&self) -> f64 {
        self.start + self.duration.unwrap_or(0.0)
    }
}
