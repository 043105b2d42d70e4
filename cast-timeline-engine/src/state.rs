//! Timeline state and editing operations
//!
//! `TimelineState` is everything the engine resolves: the roster, the enemy,
//! the placed cast events and the timeline configuration. The editor drives it
//! through the operations here, which keep the lifecycle rules intact
//! (removing an actor or skill removes its events, events stay inside the
//! timeline). Resolution itself only ever reads it.

use crate::config::TimelineConfig;
use crate::definitions::{Actor, CastEvent, EffectDefinition, Skill, SkillRef};
use crate::resolution::InstanceId;
use crate::types::{BaseStats, EngineError, Result, SkillKind, ENEMY_ID};
use std::collections::HashSet;
use std::fmt;

/// Complete input of one resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineState {
    config: TimelineConfig,
    enemy: Actor,
    actors: Vec<Actor>,
    events: Vec<CastEvent>,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

impl TimelineState {
    /// Create an empty state; the configuration is clamped
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            config: config.clamped(),
            enemy: Actor::enemy(BaseStats::default()),
            actors: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn enemy(&self) -> &Actor {
        &self.enemy
    }

    /// Student actors, in roster order
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn events(&self) -> &[CastEvent] {
        &self.events
    }

    /// Students followed by the enemy
    pub fn roster(&self) -> Vec<Actor> {
        let mut roster = self.actors.clone();
        roster.push(self.enemy.clone());
        roster
    }

    /// Find any actor, including the enemy
    pub fn actor(&self, id: &str) -> Option<&Actor> {
        if id == ENEMY_ID {
            return Some(&self.enemy);
        }
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn event(&self, id: &str) -> Option<&CastEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Set the enemy's display name and base stats
    pub fn set_enemy(&mut self, name: impl Into<String>, base: BaseStats) -> Result<()> {
        if !base.is_finite() {
            return Err(EngineError::NonFiniteValue(format!("{} base stats", ENEMY_ID)));
        }
        self.enemy.name = name.into();
        self.enemy.base = base;
        Ok(())
    }

    /// Replace the configuration and pull every event back inside the timeline
    pub fn set_config(&mut self, config: TimelineConfig) {
        self.config = config.clamped();
        let config = self.config;
        for event in &mut self.events {
            clamp_placement(&config, event);
        }
        log::debug!(
            "Timeline config set to {}s @ {}s resolution",
            config.timeline_length,
            config.time_resolution
        );
    }

    /// Add a student actor
    pub fn add_actor(&mut self, actor: Actor) -> Result<()> {
        validate_actor(&actor)?;
        if self.actors.iter().any(|a| a.id == actor.id) {
            return Err(EngineError::DuplicateId(actor.id));
        }
        log::debug!("Adding actor '{}' with {} skills", actor.id, actor.skills.len());
        self.actors.push(actor);
        Ok(())
    }

    /// Replace an existing actor, dropping events whose skill no longer exists
    pub fn update_actor(&mut self, actor: Actor) -> Result<()> {
        validate_actor(&actor)?;
        let slot = self
            .actors
            .iter_mut()
            .find(|a| a.id == actor.id)
            .ok_or_else(|| EngineError::UnknownActor(actor.id.clone()))?;
        *slot = actor;

        let owner = slot.clone();
        let before = self.events.len();
        self.events
            .retain(|e| e.actor_id != owner.id || e.skill.resolve(&owner).is_some());
        log::debug!(
            "Updated actor '{}', removed {} stale events",
            owner.id,
            before - self.events.len()
        );
        Ok(())
    }

    /// Remove an actor and every event it owns
    pub fn remove_actor(&mut self, id: &str) -> Result<Actor> {
        let index = self
            .actors
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| EngineError::UnknownActor(id.to_string()))?;
        let actor = self.actors.remove(index);

        let before = self.events.len();
        self.events.retain(|e| e.actor_id != id);
        log::debug!(
            "Removed actor '{}' and {} of its events",
            id,
            before - self.events.len()
        );
        Ok(actor)
    }

    /// Remove one skill from an actor and every event that places it
    pub fn remove_skill(&mut self, actor_id: &str, skill_id: &str) -> Result<Skill> {
        let actor = self
            .actors
            .iter()
            .find(|a| a.id == actor_id)
            .ok_or_else(|| EngineError::UnknownActor(actor_id.to_string()))?;
        if actor.skill(skill_id).is_none() {
            return Err(EngineError::UnknownSkill {
                actor: actor_id.to_string(),
                skill: skill_id.to_string(),
            });
        }

        let doomed: HashSet<String> = self
            .events
            .iter()
            .filter(|e| e.actor_id == actor_id && e.skill.refers_to(actor, skill_id))
            .map(|e| e.id.clone())
            .collect();
        self.events.retain(|e| !doomed.contains(&e.id));

        let actor = self
            .actors
            .iter_mut()
            .find(|a| a.id == actor_id)
            .ok_or_else(|| EngineError::UnknownActor(actor_id.to_string()))?;
        let index = actor
            .skills
            .iter()
            .position(|s| s.id == skill_id)
            .ok_or_else(|| EngineError::UnknownSkill {
                actor: actor_id.to_string(),
                skill: skill_id.to_string(),
            })?;

        log::debug!(
            "Removed skill '{}' from '{}' and {} events",
            skill_id,
            actor_id,
            doomed.len()
        );
        Ok(actor.skills.remove(index))
    }

    /// Place a cast event, snapping and clamping it onto the timeline
    pub fn place_event(&mut self, mut event: CastEvent) -> Result<()> {
        if event.actor_id == ENEMY_ID {
            return Err(EngineError::EnemyCaster);
        }
        let owner = self
            .actors
            .iter()
            .find(|a| a.id == event.actor_id)
            .ok_or_else(|| EngineError::UnknownActor(event.actor_id.clone()))?;
        if event.skill.resolve(owner).is_none() {
            let skill = match &event.skill {
                SkillRef::Instant { skill_id } => skill_id.clone(),
                SkillRef::Persistent => SkillKind::Persistent.to_string(),
            };
            return Err(EngineError::UnknownSkill {
                actor: event.actor_id.clone(),
                skill,
            });
        }
        if self.event(&event.id).is_some() {
            return Err(EngineError::DuplicateId(event.id));
        }
        check_timing(&event.id, event.start, event.duration)?;

        clamp_placement(&self.config, &mut event);
        log::trace!(
            "Placed event '{}' for '{}' at {}s",
            event.id,
            event.actor_id,
            event.start
        );
        self.events.push(event);
        Ok(())
    }

    /// Move an event to a new start time
    pub fn move_event(&mut self, id: &str, start: f64) -> Result<()> {
        let config = self.config;
        let event = self.event_mut(id)?;
        check_timing(id, start, None)?;
        event.start = start;
        clamp_placement(&config, event);
        Ok(())
    }

    /// Change an event's overall duration
    pub fn resize_event(&mut self, id: &str, duration: f64) -> Result<()> {
        let config = self.config;
        let event = self.event_mut(id)?;
        check_timing(id, event.start, Some(duration))?;
        event.duration = Some(duration);
        clamp_placement(&config, event);
        Ok(())
    }

    pub fn remove_event(&mut self, id: &str) -> Result<CastEvent> {
        let index = self
            .events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EngineError::UnknownEvent(id.to_string()))?;
        Ok(self.events.remove(index))
    }

    fn event_mut(&mut self, id: &str) -> Result<&mut CastEvent> {
        self.events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| EngineError::UnknownEvent(id.to_string()))
    }

    /// Effect definitions the editor should flag
    ///
    /// Non-positive values are accepted and clamped during expansion; this only
    /// reports them.
    pub fn warnings(&self) -> Vec<DefinitionWarning> {
        let mut warnings = Vec::new();
        for actor in &self.actors {
            for skill in &actor.skills {
                for effect in &skill.effects {
                    let mut push = |issue| {
                        warnings.push(DefinitionWarning {
                            actor_id: actor.id.clone(),
                            skill_id: skill.id.clone(),
                            effect_id: effect.id.clone(),
                            issue,
                        })
                    };
                    if !(effect.magnitude > 0.0) {
                        push(DefinitionIssue::NonPositiveMagnitude(effect.magnitude));
                    }
                    if !(effect.duration > 0.0) {
                        push(DefinitionIssue::NonPositiveDuration(effect.duration));
                    }
                }
            }
        }
        warnings
    }

    /// Find the cast event, skill and effect definition an instance came from
    pub fn source_of(&self, id: &InstanceId) -> Option<(&CastEvent, &Skill, &EffectDefinition)> {
        let event = self.event(&id.event_id)?;
        let owner = self.actors.iter().find(|a| a.id == event.actor_id)?;
        let skill = event.skill.resolve(owner)?;
        let effect = skill.effect(&id.effect_id)?;
        Some((event, skill, effect))
    }

    /// Assemble a state from already-validated parts
    pub(crate) fn from_parts(
        config: TimelineConfig,
        enemy: Actor,
        actors: Vec<Actor>,
        events: Vec<CastEvent>,
    ) -> Self {
        Self {
            config: config.clamped(),
            enemy,
            actors,
            events,
        }
    }
}

/// Check the per-actor rules that don't depend on the rest of the roster
pub(crate) fn validate_actor(actor: &Actor) -> Result<()> {
    if actor.id == ENEMY_ID {
        return Err(EngineError::ReservedActorId(actor.id.clone()));
    }
    if !actor.base.is_finite() {
        return Err(EngineError::NonFiniteValue(format!("{} base stats", actor.id)));
    }
    for skill in &actor.skills {
        for effect in &skill.effects {
            if !effect.magnitude.is_finite() || !effect.duration.is_finite() {
                return Err(EngineError::NonFiniteValue(format!(
                    "{}/{}/{}",
                    actor.id, skill.id, effect.id
                )));
            }
        }
    }
    let persistent = actor
        .skills
        .iter()
        .filter(|s| s.kind == SkillKind::Persistent)
        .count();
    if persistent > 1 {
        return Err(EngineError::DuplicatePersistentSkill(actor.id.clone()));
    }
    let mut seen = HashSet::new();
    for skill in &actor.skills {
        if !seen.insert(skill.id.as_str()) {
            return Err(EngineError::DuplicateId(format!("{}/{}", actor.id, skill.id)));
        }
    }
    Ok(())
}

/// Reject event times that can't be placed or serialized
pub(crate) fn check_timing(event_id: &str, start: f64, duration: Option<f64>) -> Result<()> {
    if !start.is_finite() || duration.is_some_and(|d| !d.is_finite()) {
        return Err(EngineError::NonFiniteValue(format!("event {}", event_id)));
    }
    Ok(())
}

/// Allowed slack when comparing grid-snapped times
const GRID_EPSILON: f64 = 1e-9;

/// Snap an event to the time grid and keep it inside the timeline
///
/// Afterwards `0 ≤ start`, `duration ≥ resolution` and
/// `start + duration ≤ timeline_length` hold.
fn clamp_placement(config: &TimelineConfig, event: &mut CastEvent) {
    let tick = config.time_resolution;
    let length = config.timeline_length;

    let duration = event
        .duration
        .filter(|d| d.is_finite())
        .map(|d| config.snap(d).clamp(tick, length));
    let span = duration.unwrap_or(tick);

    let start = if event.start.is_finite() {
        config.snap(event.start)
    } else {
        0.0
    };
    let mut latest_start = config.snap(length - span);
    if latest_start + span > length + GRID_EPSILON {
        latest_start = config.snap(latest_start - tick);
    }
    event.start = start.min(latest_start).max(0.0);
    event.duration = duration;
}

/// A questionable effect definition
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionWarning {
    pub actor_id: String,
    pub skill_id: String,
    pub effect_id: String,
    pub issue: DefinitionIssue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefinitionIssue {
    NonPositiveMagnitude(f64),
    NonPositiveDuration(f64),
}

impl fmt::Display for DefinitionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.issue {
            DefinitionIssue::NonPositiveMagnitude(v) => format!("magnitude {} is not positive", v),
            DefinitionIssue::NonPositiveDuration(v) => format!("duration {} is not positive", v),
        };
        write!(f, "{}/{}/{}: {}", self.actor_id, self.skill_id, self.effect_id, what)
    }
}
