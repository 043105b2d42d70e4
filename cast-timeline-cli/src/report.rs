//! Report generation
//!
//! Renders a resolution as a plain-text report: pass statistics, the resolved
//! instances of each target, and computed stats at the requested times.

use cast_timeline_engine::{Resolution, Stat, StatSnapshot, TimelineState};
use std::fmt::{self, Write};

/// What to put in the report
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub sample_times: Vec<f64>,
    pub focus_actor: Option<String>,
    pub show_lanes: bool,
}

/// Build the text report
pub fn render_txt(
    state: &TimelineState,
    resolution: &Resolution,
    options: &ReportOptions,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, state, resolution, options)?;
    Ok(out)
}

fn write_report(
    out: &mut String,
    state: &TimelineState,
    resolution: &Resolution,
    options: &ReportOptions,
) -> fmt::Result {
    let config = state.config();
    let stats = resolution.stats();

    writeln!(out, "═══════════════════════════════════════════════")?;
    writeln!(out, "  Cast Timeline Report")?;
    writeln!(out, "═══════════════════════════════════════════════\n")?;
    writeln!(
        out,
        "Timeline: {}s @ {}s resolution ({} ticks)",
        config.timeline_length,
        config.time_resolution,
        config.tick_count()
    )?;
    writeln!(out, "Actors:   {} (+ enemy)", state.actors().len())?;
    writeln!(out, "Events:   {} ({} skipped)", stats.num_events, stats.num_skipped_events)?;
    writeln!(
        out,
        "Instances: {} raw, {} resolved, {} targets",
        stats.num_raw_instances, stats.num_resolved_instances, stats.num_targets
    )?;

    let warnings = state.warnings();
    if !warnings.is_empty() {
        writeln!(out, "\nWarnings:")?;
        for warning in &warnings {
            writeln!(out, "  ! {}", warning)?;
        }
    }

    for (target, lanes) in resolution.lanes() {
        let name = state.actor(target).map(|a| a.name.as_str()).unwrap_or(target);
        writeln!(out, "\n── {} ({}) ── {} lane(s)", name, target, lanes.lane_count())?;
        for instance in resolution.instances_for(target) {
            write!(
                out,
                "  {:<28} {:<6} {:<7} {:>+7.2} {:<10} [{:>6.2}, {:>6.2})",
                instance.id.to_string(),
                instance.kind,
                instance.stat,
                instance.kind.contribution(instance.magnitude),
                instance.stack_group,
                instance.start,
                instance.end
            )?;
            if options.show_lanes {
                if let Some(lane) = lanes.lane_of(&instance.id) {
                    write!(out, "  lane {}", lane)?;
                }
            }
            writeln!(out)?;
        }
    }

    if options.sample_times.is_empty() {
        return Ok(());
    }

    writeln!(out, "\nStats:")?;
    let actor_ids: Vec<&str> = match &options.focus_actor {
        Some(id) => vec![id.as_str()],
        None => state.actors().iter().map(|a| a.id.as_str()).collect(),
    };
    for t in &options.sample_times {
        for actor_id in &actor_ids {
            match resolution.stats_at(actor_id, *t) {
                Some(snapshot) => write_stats(out, &snapshot)?,
                None => writeln!(out, "  t={:>6.2}  {:<10} unknown actor", t, actor_id)?,
            }
        }
    }

    Ok(())
}

fn write_stats(out: &mut String, snapshot: &StatSnapshot) -> fmt::Result {
    write!(out, "  t={:>6.2}  {:<10}", snapshot.time, snapshot.actor_id)?;
    for stat in Stat::ALL {
        write!(
            out,
            " {}={:.3} ({:+.2})",
            stat,
            snapshot.computed.get(stat),
            snapshot.modifiers.get(stat)
        )?;
    }
    writeln!(out, "  [{} active]", snapshot.active.len())
}
