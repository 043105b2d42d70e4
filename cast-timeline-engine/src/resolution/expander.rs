//! Instance expansion
//!
//! Turns every (cast event × effect definition × target) triple into a
//! concrete, time-bounded [`EffectInstance`]. Events whose actor or skill no
//! longer exists are skipped, and instances whose clipped interval is empty
//! are never emitted.

use super::instance::{EffectInstance, InstanceId};
use super::targeting::{resolve_targets, TargetRequest, TargetUniverse};
use crate::config::TimelineConfig;
use crate::definitions::{Actor, CastEvent, EffectDefinition, Skill};
use crate::types::EffectKind;
use std::collections::HashMap;

/// Output of one expansion pass
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// Raw instances, in event then effect then target order
    pub instances: Vec<EffectInstance>,
    /// Events skipped because their actor or skill is missing
    pub skipped_events: usize,
    /// Instances dropped because their clipped interval was empty
    pub dropped_instances: usize,
}

/// Expand cast events into raw effect instances
///
/// `actors` is the full roster including the enemy; the enemy never owns
/// events, so an event naming it is treated like a missing actor.
pub fn expand(actors: &[Actor], events: &[CastEvent], config: &TimelineConfig) -> Expansion {
    let casters: HashMap<&str, &Actor> = actors
        .iter()
        .filter(|a| !a.is_enemy())
        .map(|a| (a.id.as_str(), a))
        .collect();
    let universe = TargetUniverse::new(actors);

    let mut expansion = Expansion::default();

    for event in events {
        let Some(owner) = casters.get(event.actor_id.as_str()) else {
            log::warn!("Skipping event '{}': unknown actor '{}'", event.id, event.actor_id);
            expansion.skipped_events += 1;
            continue;
        };
        let Some(skill) = event.skill.resolve(owner) else {
            log::warn!(
                "Skipping event '{}': actor '{}' has no matching {} skill",
                event.id,
                owner.id,
                event.skill.kind()
            );
            expansion.skipped_events += 1;
            continue;
        };
        if !event.start.is_finite() {
            log::warn!("Skipping event '{}': start time is not finite", event.id);
            expansion.skipped_events += 1;
            continue;
        }

        for effect in &skill.effects {
            expand_effect(event, skill, effect, &universe, config, &mut expansion);
        }
    }

    log::debug!(
        "Expanded {} events into {} instances ({} events skipped, {} empty instances dropped)",
        events.len(),
        expansion.instances.len(),
        expansion.skipped_events,
        expansion.dropped_instances
    );

    expansion
}

fn expand_effect(
    event: &CastEvent,
    skill: &Skill,
    effect: &EffectDefinition,
    universe: &TargetUniverse<'_>,
    config: &TimelineConfig,
    expansion: &mut Expansion,
) {
    let request = TargetRequest {
        owner: &event.actor_id,
        event: &event.target,
        effect_default: effect.target.as_ref(),
        effect_override: event.effect_targets.get(&effect.id),
    };
    let targets = resolve_targets(&request, universe);

    if effect.kind != EffectKind::Attack && event.duration.is_none() && !(effect.duration > 0.0) {
        log::warn!(
            "Effect '{}' of event '{}' has duration {}, using one tick",
            effect.id,
            event.id,
            effect.duration
        );
    }

    // Clip both ends; an event starting before zero loses its head
    let duration = effect_duration(event, effect, config.time_resolution);
    let end = (event.start + duration).min(config.timeline_length);
    let start = event.start.max(0.0);

    if end <= start {
        log::trace!(
            "Dropping effect '{}' of event '{}': empty interval [{}, {})",
            effect.id,
            event.id,
            start,
            end
        );
        expansion.dropped_instances += targets.len();
        return;
    }

    let magnitude = if effect.magnitude.is_finite() {
        effect.magnitude
    } else {
        0.0
    };
    let stack_group = skill.stack_group_of(effect);

    for target_id in targets {
        expansion.instances.push(EffectInstance {
            id: InstanceId::new(&event.id, &effect.id, target_id),
            source_id: event.actor_id.clone(),
            kind: effect.kind,
            stat: effect.stat,
            magnitude,
            stack_group: stack_group.to_string(),
            start,
            end,
        });
    }
}

/// Duration of one effect of one event, never shorter than one tick
///
/// Attacks are pulses of their own nominal length. Buffs and debuffs last as
/// long as the cast event when it has a duration, otherwise their nominal
/// length.
pub fn effect_duration(event: &CastEvent, effect: &EffectDefinition, tick: f64) -> f64 {
    let duration = match effect.kind {
        EffectKind::Attack => positive(effect.duration).unwrap_or(tick),
        EffectKind::Buff | EffectKind::Debuff => event
            .duration
            .and_then(positive)
            .or_else(|| positive(effect.duration))
            .unwrap_or(tick),
    };
    duration.max(tick)
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}
