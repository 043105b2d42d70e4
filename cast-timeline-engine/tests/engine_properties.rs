// End-to-end properties of the resolution pipeline
use cast_timeline_engine::resolution::{lanes::peak_concurrency, resolve_overwrites, SlotKey};
use cast_timeline_engine::{
    resolve, Actor, BaseStats, CastEvent, EffectDefinition, EffectKind, Skill, SkillKind, Stat,
    TargetMode, TargetSpec, TimelineConfig, TimelineState, ENEMY_ID,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

const LENGTH: f64 = 60.0;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn roster() -> Vec<Actor> {
    let striker = Actor::new("a1", "Striker", BaseStats::new(1000.0, 0.2, 1.5))
        .with_skill(
            Skill::new("burst", "Burst", SkillKind::Instant)
                .with_effect(EffectDefinition::buff("atk_up", Stat::Atk, 0.3, 8.0).in_group("field"))
                .with_effect(EffectDefinition::attack("hit", 0.0).with_target(TargetSpec::new(TargetMode::Enemy))),
        )
        .with_skill(
            Skill::new("aura", "Aura", SkillKind::Persistent)
                .with_effect(EffectDefinition::buff("crit_up", Stat::Crit, 0.15, 20.0)),
        );
    let support = Actor::new("a2", "Support", BaseStats::new(800.0, 0.1, 1.4))
        .with_skill(
            Skill::new("anthem", "Anthem", SkillKind::Instant)
                .with_effect(EffectDefinition::buff("party_atk", Stat::Atk, 0.2, 6.0).in_group("field"))
                .with_effect(
                    EffectDefinition::debuff("shred", Stat::CritDmg, 0.1, 4.0)
                        .with_target(TargetSpec::new(TargetMode::Enemy)),
                ),
        );
    let tank = Actor::new("a3", "Tank", BaseStats::new(600.0, 0.05, 1.2)).with_skill(
        Skill::new("rally", "Rally", SkillKind::Instant)
            .with_effect(EffectDefinition::buff("guard", Stat::Atk, 0.1, 12.0).in_group("ns")),
    );
    vec![striker, support, tank]
}

fn generated_events(seed: u64, count: usize) -> Vec<CastEvent> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut events = Vec::with_capacity(count);
    for n in 0..count {
        let start = rng.gen_range(0..110) as f64 * 0.5;
        let id = format!("e{:03}", n);
        let event = match rng.gen_range(0..4) {
            0 => CastEvent::instant(id, "a1", "burst", start),
            1 => CastEvent::persistent(id, "a1", start).with_duration(rng.gen_range(1..=20) as f64),
            2 => CastEvent::instant(id, "a2", "anthem", start)
                .with_target(TargetSpec::new(TargetMode::AllStudents)),
            _ => CastEvent::instant(id, "a3", "rally", start)
                .with_target(TargetSpec::students(["a1", "a2", "ghost"])),
        };
        events.push(event);
    }
    events
}

fn build_state(events: Vec<CastEvent>) -> TimelineState {
    let mut state = TimelineState::new(TimelineConfig::new().with_length(LENGTH).with_resolution(0.5));
    state.set_enemy("Boss", BaseStats::new(2000.0, 0.0, 1.0)).unwrap();
    for actor in roster() {
        state.add_actor(actor).unwrap();
    }
    for event in events {
        state.place_event(event).unwrap();
    }
    state
}

#[test]
fn resolved_slots_never_overlap_for_any_input_order() {
    init();
    let events = generated_events(7, 80);

    let forward = resolve(&build_state(events.clone()));

    let mut reversed = events.clone();
    reversed.reverse();
    let mut rotated = events.clone();
    rotated.rotate_left(31);

    for permuted in [reversed, rotated] {
        let other = resolve(&build_state(permuted));
        assert_eq!(other.instances(), forward.instances());
    }

    let mut slots: BTreeMap<SlotKey, Vec<(f64, f64)>> = BTreeMap::new();
    for instance in forward.instances() {
        slots
            .entry(instance.slot_key())
            .or_default()
            .push((instance.start, instance.end));
    }
    assert!(slots.len() > 3);
    for (key, intervals) in slots {
        for pair in intervals.windows(2) {
            assert!(
                pair[0].1 <= pair[1].0,
                "overlap in slot {:?}: {:?} then {:?}",
                key,
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn instances_stay_inside_the_timeline() {
    init();
    let resolution = resolve(&build_state(generated_events(11, 60)));

    assert!(!resolution.instances().is_empty());
    for instance in resolution.instances() {
        assert!(instance.end <= LENGTH, "{} ends at {}", instance.id, instance.end);
        assert!(instance.end > instance.start, "{} is empty", instance.id);
        assert!(instance.start >= 0.0);
    }
}

#[test]
fn overwrite_resolution_is_a_fixed_point() {
    init();
    let resolution = resolve(&build_state(generated_events(23, 70)));
    let again = resolve_overwrites(resolution.instances().to_vec());
    assert_eq!(again, resolution.instances());
}

#[test]
fn lane_count_matches_peak_concurrency() {
    init();
    let state = build_state(generated_events(5, 90));
    let resolution = resolve(&state);

    for actor in state.roster() {
        let lanes = resolution.lanes_for(&actor.id);
        let peak = peak_concurrency(resolution.instances_for(&actor.id));
        assert_eq!(lanes.lane_count(), peak.max(1), "target {}", actor.id);

        // No two instances in one lane overlap
        let mut by_lane: BTreeMap<usize, Vec<(f64, f64)>> = BTreeMap::new();
        for instance in resolution.instances_for(&actor.id) {
            let lane = lanes.lane_of(&instance.id).unwrap();
            by_lane.entry(lane).or_default().push((instance.start, instance.end));
        }
        for intervals in by_lane.values() {
            for pair in intervals.windows(2) {
                assert!(pair[0].1 <= pair[1].0);
            }
        }
    }
}

fn field_scenario() -> TimelineState {
    let mut state = TimelineState::new(TimelineConfig::new().with_length(LENGTH).with_resolution(0.5));
    state
        .add_actor(
            Actor::new("a1", "Striker", BaseStats::new(1000.0, 0.2, 1.5))
                .with_skill(
                    Skill::new("big_field", "Big Field", SkillKind::Instant)
                        .with_effect(EffectDefinition::buff("f30", Stat::Atk, 0.30, 10.0).in_group("field")),
                )
                .with_skill(
                    Skill::new("small_field", "Small Field", SkillKind::Instant)
                        .with_effect(EffectDefinition::buff("f20", Stat::Atk, 0.20, 10.0).in_group("field")),
                )
                .with_skill(
                    Skill::new("aura", "Aura", SkillKind::Persistent)
                        .with_effect(EffectDefinition::buff("ns15", Stat::Atk, 0.15, 30.0)),
                ),
        )
        .unwrap();
    state
}

#[test]
fn later_buff_in_same_group_replaces_earlier() {
    init();
    let mut state = field_scenario();
    state.place_event(CastEvent::instant("e1", "a1", "big_field", 0.0)).unwrap();
    state.place_event(CastEvent::instant("e2", "a1", "small_field", 3.0)).unwrap();

    let stats = resolve(&state).stats_at("a1", 5.0).unwrap();
    assert_eq!(stats.active.len(), 1);
    assert!((stats.modifiers.atk - 0.20).abs() < 1e-9);
    assert!((stats.computed.atk - 1200.0).abs() < 1e-9);
}

#[test]
fn different_stack_groups_coexist() {
    init();
    let mut state = field_scenario();
    state.place_event(CastEvent::instant("e1", "a1", "big_field", 0.0)).unwrap();
    state.place_event(CastEvent::persistent("e2", "a1", 2.0)).unwrap();

    let stats = resolve(&state).stats_at("a1", 5.0).unwrap();
    assert_eq!(stats.applied.len(), 2);
    assert!((stats.computed.atk - 1000.0 * 1.45).abs() < 1e-9);
}

#[test]
fn enemy_targeting_ignores_student_list() {
    init();
    let mut state = TimelineState::new(TimelineConfig::new().with_length(LENGTH));
    state
        .add_actor(Actor::new("a1", "Striker", BaseStats::default()).with_skill(
            Skill::new("mark", "Mark", SkillKind::Instant).with_effect(
                EffectDefinition::debuff("mark", Stat::Crit, 0.1, 5.0)
                    .with_target(TargetSpec::new(TargetMode::Enemy)),
            ),
        ))
        .unwrap();
    state.add_actor(Actor::new("a2", "Support", BaseStats::default())).unwrap();
    state
        .place_event(CastEvent::instant("e1", "a1", "mark", 1.0).with_target(TargetSpec::students(["a1", "a2"])))
        .unwrap();

    let resolution = resolve(&state);
    let targets: Vec<&str> = resolution.instances().iter().map(|i| i.target_id()).collect();
    assert_eq!(targets, vec![ENEMY_ID]);
    assert_eq!(resolution.instances()[0].kind, EffectKind::Debuff);
}

#[test]
fn snapshot_round_trip_preserves_engine_output() {
    init();
    let original = build_state(generated_events(42, 50));
    let token = original.to_token().unwrap();
    let restored = TimelineState::from_token(&token).unwrap();

    let before = resolve(&original);
    let after = resolve(&restored);
    assert_eq!(before.instances(), after.instances());

    for t in [0.0, 0.5, 7.5, 12.0, 30.0, 44.5, 59.5] {
        for actor in original.roster() {
            assert_eq!(
                before.stats_at(&actor.id, t),
                after.stats_at(&actor.id, t),
                "{} at {}",
                actor.id,
                t
            );
        }
    }
}

#[test]
fn removing_an_actor_removes_its_instances() {
    init();
    let mut state = build_state(generated_events(3, 40));
    state.remove_actor("a2").unwrap();

    let resolution = resolve(&state);
    assert!(resolution.instances().iter().all(|i| i.source_id != "a2"));
    assert!(resolution.instances().iter().all(|i| i.target_id() != "a2"));
    assert_eq!(resolution.stats().num_skipped_events, 0);
}

#[test]
fn non_positive_definitions_still_resolve() {
    init();
    let mut state = TimelineState::new(TimelineConfig::new().with_length(LENGTH).with_resolution(0.5));
    state
        .add_actor(Actor::new("a1", "Striker", BaseStats::new(1000.0, 0.2, 1.5)).with_skill(
            Skill::new("odd", "Odd", SkillKind::Instant)
                .with_effect(EffectDefinition::buff("zero", Stat::Atk, 0.0, 10.0))
                .with_effect(EffectDefinition::buff("neg", Stat::Crit, -0.1, -2.0)),
        ))
        .unwrap();
    state.place_event(CastEvent::instant("e1", "a1", "odd", 4.0)).unwrap();

    assert_eq!(state.warnings().len(), 3);

    let resolution = resolve(&state);
    assert_eq!(resolution.instances().len(), 2);
    let neg = resolution
        .instances()
        .iter()
        .find(|i| i.effect_id() == "neg")
        .unwrap();
    // Negative duration becomes one tick
    assert_eq!((neg.start, neg.end), (4.0, 4.5));

    let stats = resolution.stats_at("a1", 4.0).unwrap();
    assert_eq!(stats.applied.len(), 2);
    assert_eq!(stats.computed.atk, 1000.0);
    assert!((stats.computed.crit - 0.2 * 0.9).abs() < 1e-12);

    let later = resolution.stats_at("a1", 4.5).unwrap();
    assert_eq!(later.computed.crit, 0.2);
}

#[test]
fn legacy_snapshot_resolves_like_tagged_state() {
    init();
    let legacy = r#"{
        "timeline": {"timelineLength": 60, "timeResolution": 0.5},
        "actors": [{
            "id": "a1",
            "name": "Striker",
            "baseStats": {"atk": 1000, "crit": 0.2, "critDmg": 1.5},
            "skills": [
                {"id": "burst", "kind": "ex", "effects": [
                    {"id": "atk_up", "kind": "buff", "stat": "atk", "magnitude": 0.3, "duration": 8}
                ]},
                {"id": "aura", "kind": "ns", "effects": [
                    {"id": "crit_up", "kind": "buff", "stat": "crit", "magnitude": 0.15, "duration": 20}
                ]}
            ]
        }],
        "events": [
            {"id": "e1", "actorId": "a1", "skillId": "burst", "start": 1},
            {"id": "e2", "actorId": "a1", "skillId": "aura", "start": 2},
            {"id": "e3", "actorId": "a1", "start": 10}
        ]
    }"#;
    let token = base64::encode_config(legacy, base64::URL_SAFE_NO_PAD);
    let loaded = TimelineState::from_token(&token).unwrap();

    let mut tagged = TimelineState::new(TimelineConfig::new().with_length(60.0).with_resolution(0.5));
    tagged
        .add_actor(
            Actor::new("a1", "Striker", BaseStats::new(1000.0, 0.2, 1.5))
                .with_skill(
                    Skill::new("burst", "", SkillKind::Instant)
                        .with_effect(EffectDefinition::buff("atk_up", Stat::Atk, 0.3, 8.0)),
                )
                .with_skill(
                    Skill::new("aura", "", SkillKind::Persistent)
                        .with_effect(EffectDefinition::buff("crit_up", Stat::Crit, 0.15, 20.0)),
                ),
        )
        .unwrap();
    tagged.place_event(CastEvent::instant("e1", "a1", "burst", 1.0)).unwrap();
    tagged.place_event(CastEvent::persistent("e2", "a1", 2.0)).unwrap();
    tagged.place_event(CastEvent::persistent("e3", "a1", 10.0)).unwrap();

    let from_legacy = resolve(&loaded);
    assert_eq!(from_legacy.instances(), resolve(&tagged).instances());
    assert_eq!(from_legacy.stats().num_skipped_events, 0);

    // Re-encoding the normalized state keeps the same output
    let again = TimelineState::from_token(&loaded.to_token().unwrap()).unwrap();
    assert_eq!(again, loaded);
    assert_eq!(resolve(&again).instances(), from_legacy.instances());

    // e3 overwrites e2 in the shared normal-state group
    let stats = from_legacy.stats_at("a1", 12.0).unwrap();
    assert_eq!(stats.applied.len(), 1);
    assert_eq!(stats.applied[0].event_id(), "e3");
}

#[test]
fn student_list_of_unknown_ids_falls_back_to_caster() {
    init();
    let mut state = TimelineState::new(TimelineConfig::new().with_length(LENGTH));
    state
        .add_actor(Actor::new("a1", "Support", BaseStats::new(800.0, 0.1, 1.4)).with_skill(
            Skill::new("anthem", "Anthem", SkillKind::Instant)
                .with_effect(EffectDefinition::buff("party_atk", Stat::Atk, 0.2, 6.0)),
        ))
        .unwrap();
    state.add_actor(Actor::new("a2", "Striker", BaseStats::default())).unwrap();
    state
        .place_event(
            CastEvent::instant("e1", "a1", "anthem", 0.0)
                .with_target(TargetSpec::students(["ghost", "removed"])),
        )
        .unwrap();

    let resolution = resolve(&state);
    let targets: Vec<&str> = resolution.instances().iter().map(|i| i.target_id()).collect();
    assert_eq!(targets, vec!["a1"]);
    assert!((resolution.stats_at("a1", 1.0).unwrap().computed.atk - 960.0).abs() < 1e-9);
}
