//! Target resolution
//!
//! Decides which actors one effect of one cast event lands on. Three target
//! selections can apply to an effect; the most specific one wins:
//!
//! 1. the cast event's override for this effect
//! 2. the effect definition's default target
//! 3. the cast event's own target
//!
//! In `student` mode an empty id list falls through the id lists of those same
//! three selections, in that order, and finally to the caster. Whatever comes
//! out is filtered against the known actors; an empty result means the caster.

use crate::definitions::Actor;
use crate::types::{TargetMode, TargetSpec, ENEMY_ID};
use std::collections::HashSet;

/// Every id an effect may target
#[derive(Debug, Clone)]
pub struct TargetUniverse<'a> {
    /// Non-enemy actors, in roster order
    students: Vec<&'a str>,
    /// Students plus the enemy
    valid: HashSet<&'a str>,
}

impl<'a> TargetUniverse<'a> {
    /// Build the universe from the roster. The enemy is always a valid target.
    pub fn new<I>(actors: I) -> Self
    where
        I: IntoIterator<Item = &'a Actor>,
    {
        let students: Vec<&'a str> = actors
            .into_iter()
            .filter(|a| !a.is_enemy())
            .map(|a| a.id.as_str())
            .collect();

        let mut valid: HashSet<&'a str> = students.iter().copied().collect();
        valid.insert(ENEMY_ID);

        Self { students, valid }
    }

    pub fn students(&self) -> &[&'a str] {
        &self.students
    }

    pub fn contains(&self, id: &str) -> bool {
        self.valid.contains(id)
    }
}

/// The target selections that apply to one effect of one cast event
#[derive(Debug, Clone, Copy)]
pub struct TargetRequest<'a> {
    /// Casting actor
    pub owner: &'a str,
    /// Cast-event-level target
    pub event: &'a TargetSpec,
    /// Effect definition default
    pub effect_default: Option<&'a TargetSpec>,
    /// Per-event per-effect override
    pub effect_override: Option<&'a TargetSpec>,
}

impl<'a> TargetRequest<'a> {
    /// The selection whose mode decides the targets
    pub fn selected(&self) -> &'a TargetSpec {
        self.effect_override
            .or(self.effect_default)
            .unwrap_or(self.event)
    }

    /// First non-empty id list, starting from the selected one
    fn explicit_ids(&self) -> Option<&'a [String]> {
        let chain = [
            Some(self.selected()),
            self.effect_override,
            self.effect_default,
            Some(self.event),
        ];
        chain
            .into_iter()
            .flatten()
            .map(|spec| spec.ids.as_slice())
            .find(|ids| !ids.is_empty())
    }
}

/// Resolve the final, deduplicated target list for one effect
///
/// Never returns an empty list: the owner is the last resort.
pub fn resolve_targets(request: &TargetRequest<'_>, universe: &TargetUniverse<'_>) -> Vec<String> {
    let selected = request.selected();

    let candidates: Vec<&str> = match selected.mode {
        TargetMode::Owner => vec![request.owner],
        TargetMode::Enemy => vec![ENEMY_ID],
        TargetMode::AllStudents => universe.students().to_vec(),
        TargetMode::Students => match request.explicit_ids() {
            Some(ids) => ids.iter().map(String::as_str).collect(),
            None => vec![request.owner],
        },
    };

    let mut seen = HashSet::new();
    let targets: Vec<String> = candidates
        .into_iter()
        .filter(|id| universe.contains(id))
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect();

    if targets.is_empty() {
        log::trace!(
            "No valid targets for {} cast by '{}', falling back to owner",
            selected.mode,
            request.owner
        );
        return vec![request.owner.to_string()];
    }

    targets
}
