//! Shareable snapshots
//!
//! A snapshot is the whole timeline state as one opaque, URL-safe string:
//! JSON encoded with unpadded URL-safe base64. Decoding is tolerant of older
//! shapes (events without a skill-kind tag, camelCase field names) but fails
//! closed on anything it cannot make sense of.

use crate::config::TimelineConfig;
use crate::definitions::{Actor, CastEvent, SkillRef};
use crate::state::{check_timing, validate_actor, TimelineState};
use crate::types::{BaseStats, EngineError, Result, SkillKind, TargetMode, TargetSpec, ENEMY_ID};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

fn current_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Serialized form of a [`TimelineState`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "current_version", alias = "v")]
    pub version: u32,

    #[serde(default, alias = "config")]
    pub timeline: TimelineConfig,

    #[serde(default)]
    pub enemy: Option<EnemySnapshot>,

    pub actors: Vec<Actor>,

    #[serde(default)]
    pub events: Vec<SnapshotEvent>,
}

/// Enemy settings carried by a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "baseStats")]
    pub base: BaseStats,
}

/// Serialized cast event
///
/// `kind` may be missing in older snapshots; it is inferred when the event is
/// turned back into a [`CastEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEvent {
    pub id: String,

    #[serde(alias = "actorId")]
    pub actor_id: String,

    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SkillKind>,

    #[serde(default, alias = "skillId", skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<String>,

    pub start: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(default, alias = "targetMode")]
    pub target_mode: Option<TargetMode>,

    #[serde(default, alias = "targetIds", skip_serializing_if = "Vec::is_empty")]
    pub target_ids: Vec<String>,

    #[serde(default, alias = "effectTargets", skip_serializing_if = "BTreeMap::is_empty")]
    pub effect_targets: BTreeMap<String, TargetSpec>,
}

impl SnapshotEvent {
    fn from_event(event: &CastEvent) -> Self {
        let (kind, skill_id) = match &event.skill {
            SkillRef::Instant { skill_id } => (SkillKind::Instant, Some(skill_id.clone())),
            SkillRef::Persistent => (SkillKind::Persistent, None),
        };
        Self {
            id: event.id.clone(),
            actor_id: event.actor_id.clone(),
            kind: Some(kind),
            skill_id,
            start: event.start,
            duration: event.duration,
            target_mode: Some(event.target.mode),
            target_ids: event.target.ids.clone(),
            effect_targets: event.effect_targets.clone(),
        }
    }

    fn into_event(self, owner: Option<&Actor>) -> CastEvent {
        let skill = match (self.kind, self.skill_id) {
            (Some(SkillKind::Persistent), _) => SkillRef::Persistent,
            (Some(SkillKind::Instant), Some(skill_id)) => SkillRef::Instant { skill_id },
            (Some(SkillKind::Instant), None) => {
                log::warn!("Event '{}' is tagged ex but names no skill", self.id);
                SkillRef::instant("")
            }
            (None, skill_id) => infer_skill_ref(owner, skill_id),
        };

        CastEvent {
            id: self.id,
            actor_id: self.actor_id,
            skill,
            start: self.start,
            duration: self.duration,
            target: TargetSpec {
                mode: self.target_mode.unwrap_or_default(),
                ids: self.target_ids,
            },
            effect_targets: self.effect_targets,
        }
    }
}

/// Best-effort skill reference for an event without a kind tag
///
/// No skill id, or the id of the owner's normal-state skill, means the
/// normal-state skill. Anything else is taken as an Instant skill id, even if
/// the owner has no such skill (expansion then skips the event).
fn infer_skill_ref(owner: Option<&Actor>, skill_id: Option<String>) -> SkillRef {
    match skill_id {
        None => SkillRef::Persistent,
        Some(id) => {
            let is_persistent = owner
                .and_then(Actor::persistent_skill)
                .is_some_and(|s| s.id == id);
            if is_persistent {
                SkillRef::Persistent
            } else {
                SkillRef::Instant { skill_id: id }
            }
        }
    }
}

impl Snapshot {
    /// Capture a state
    pub fn from_state(state: &TimelineState) -> Self {
        let enemy = state.enemy();
        Self {
            version: SNAPSHOT_VERSION,
            timeline: *state.config(),
            enemy: Some(EnemySnapshot {
                name: enemy.name.clone(),
                base: enemy.base,
            }),
            actors: state.actors().to_vec(),
            events: state.events().iter().map(SnapshotEvent::from_event).collect(),
        }
    }

    /// Rebuild a state, normalizing legacy event shapes
    ///
    /// Rejects reserved or duplicate actor ids and duplicate event ids. Events
    /// pointing at missing actors or skills are kept; resolution skips them.
    pub fn into_state(self) -> Result<TimelineState> {
        if self.version > SNAPSHOT_VERSION {
            return Err(EngineError::UnsupportedVersion(self.version));
        }

        let mut actor_ids = HashSet::new();
        for actor in &self.actors {
            validate_actor(actor)?;
            if !actor_ids.insert(actor.id.as_str()) {
                return Err(EngineError::DuplicateId(actor.id.clone()));
            }
        }

        let mut event_ids = HashSet::new();
        let mut events = Vec::with_capacity(self.events.len());
        for raw in self.events {
            if !event_ids.insert(raw.id.clone()) {
                return Err(EngineError::DuplicateId(raw.id));
            }
            check_timing(&raw.id, raw.start, raw.duration)?;
            let owner = self.actors.iter().find(|a| a.id == raw.actor_id);
            events.push(raw.into_event(owner));
        }

        let mut enemy = Actor::enemy(BaseStats::default());
        if let Some(config) = self.enemy {
            if !config.base.is_finite() {
                return Err(EngineError::NonFiniteValue(format!("{} base stats", ENEMY_ID)));
            }
            if !config.name.is_empty() {
                enemy.name = config.name;
            }
            enemy.base = config.base;
        }

        Ok(TimelineState::from_parts(self.timeline, enemy, self.actors, events))
    }

    /// Encode as a URL-safe token
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(base64::encode_config(json, base64::URL_SAFE_NO_PAD))
    }

    /// Decode a token produced by [`Snapshot::encode`]
    pub fn decode(token: &str) -> Result<Self> {
        let bytes = base64::decode_config(token.trim(), base64::URL_SAFE_NO_PAD)
            .map_err(|e| EngineError::InvalidToken(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl TimelineState {
    /// Encode the whole state as a snapshot token
    pub fn to_token(&self) -> Result<String> {
        Snapshot::from_state(self).encode()
    }

    /// Build a state from a snapshot token
    pub fn from_token(token: &str) -> Result<Self> {
        Snapshot::decode(token)?.into_state()
    }

    /// Replace this state with the one in `token`
    ///
    /// On error the current state is left exactly as it was.
    pub fn load_token(&mut self, token: &str) -> Result<()> {
        let loaded = Self::from_token(token)?;
        log::info!(
            "Loaded snapshot: {} actors, {} events",
            loaded.actors().len(),
            loaded.events().len()
        );
        *self = loaded;
        Ok(())
    }
}
