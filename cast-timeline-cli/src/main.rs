//! Cast Timeline CLI Application
//!
//! Command-line front end for the cast-timeline-engine library.
//! It adds:
//! - Scenario files (TOML) describing actors, skills and cast events
//! - Loading and emitting snapshot tokens
//! - Text reports with lanes and point-in-time stats

use anyhow::{Context, Result};
use cast_timeline_engine::{resolve, TimelineState};
use clap::Parser;
use std::path::{Path, PathBuf};

mod config;
mod report;

use report::ReportOptions;

/// Cast Timeline - Resolve skill casts into stat modifiers over time
#[derive(Parser, Debug)]
#[command(name = "cast-timeline")]
#[command(about = "Resolve a cast timeline and report effects and stats", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a scenario file (scenario.toml)
    #[arg(short, long, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Snapshot token to load instead of a scenario file
    #[arg(long, value_name = "TOKEN", conflicts_with = "scenario")]
    token: Option<String>,

    /// Query time for the stats section (can be repeated)
    #[arg(long = "at", value_name = "SECONDS")]
    at: Vec<f64>,

    /// Only report stats for this actor
    #[arg(long, value_name = "ID")]
    actor: Option<String>,

    /// Show lane numbers next to each instance
    #[arg(long)]
    lanes: bool,

    /// Print the snapshot token after the report
    #[arg(long)]
    emit_token: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Cast Timeline CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using engine library v{}", cast_timeline_engine::VERSION);

    if let Some(scenario_path) = &args.scenario {
        scenario_mode(scenario_path, &args)?;
    } else if let Some(token) = &args.token {
        token_mode(token, &args)?;
    } else {
        // No arguments - show help
        println!("Cast Timeline - No input specified");
        println!("\nQuick Start:");
        println!("  cast-timeline --scenario scenario.toml");
        println!("  cast-timeline --scenario scenario.toml --at 5 --at 12.5 --lanes");
        println!("\nReload a saved timeline:");
        println!("  cast-timeline --token <TOKEN>");
        println!("\nUse --help for more options");
    }

    Ok(())
}

/// Scenario mode - load a TOML scenario, CLI flags extend its [output] table
fn scenario_mode(path: &Path, args: &Args) -> Result<()> {
    log::info!("Loading scenario: {:?}", path);
    let config = config::load_config(path)?;
    let state = config.to_state()?;

    let mut options = ReportOptions {
        sample_times: config.output.sample_times.clone(),
        focus_actor: config.output.focus_actor.clone(),
        show_lanes: config.output.show_lanes,
    };
    options.sample_times.extend(args.at.iter().copied());
    if args.actor.is_some() {
        options.focus_actor = args.actor.clone();
    }
    options.show_lanes |= args.lanes;

    run(&state, &options, config.output.emit_token || args.emit_token)
}

/// Token mode - restore a snapshot token, report options come from flags only
fn token_mode(token: &str, args: &Args) -> Result<()> {
    let state = TimelineState::from_token(token.trim()).context("Failed to load snapshot token")?;

    let options = ReportOptions {
        sample_times: args.at.clone(),
        focus_actor: args.actor.clone(),
        show_lanes: args.lanes,
    };

    run(&state, &options, args.emit_token)
}

fn run(state: &TimelineState, options: &ReportOptions, emit_token: bool) -> Result<()> {
    let resolution = resolve(state);
    let stats = resolution.stats();
    log::info!(
        "Resolved {} events into {} instances ({} skipped)",
        stats.num_events,
        stats.num_resolved_instances,
        stats.num_skipped_events
    );

    let text = report::render_txt(state, &resolution, options).context("Failed to render report")?;
    print!("{}", text);

    if emit_token {
        let token = state.to_token().context("Failed to encode snapshot token")?;
        println!("\nToken:\n{}", token);
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
