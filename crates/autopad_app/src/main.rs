mod config;
mod preset;
mod runtime;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use autopad_core::model::{ActionTable, RangeId};
use autopad_core::session::MacroSession;
use autopad_rt::report::encode_report;
use autopad_rt::transport::{BufferedFrameSink, HidWriterSink};
use autopad_storage::table::TableEnvelope;
use clap::{Parser, Subcommand};
use config::{load_settings, Settings};
use runtime::{
    estimated_polls, FixedIntervalPacer, NoPacer, PollReport, RunSummary, RuntimeCoordinator,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "autopad", about = "Replays timed controller macros over a USB HID gadget")]
struct Cli {
    /// Config file; `autopad.toml` in the working directory when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the configured macro.
    Run {
        /// Drive an in-memory sink as fast as possible instead of the device.
        #[arg(long)]
        dry_run: bool,
        /// HID gadget node, overrides the config file.
        #[arg(long)]
        device: Option<PathBuf>,
        #[arg(long)]
        max_polls: Option<u64>,
        /// Print every frame change as a raw report.
        #[arg(long)]
        trace: bool,
    },
    /// Print the ranges and dates the macro will go through.
    Plan,
    /// Parse and validate a table file.
    CheckTable { path: PathBuf },
    /// Print a bundled table in the table file format.
    ExportPreset {
        #[arg(default_value = preset::DAY_SKIPPER)]
        name: String,
    },
}

const PLAN_ROWS: usize = 64;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            dry_run,
            device,
            max_polls,
            trace,
        } => {
            let mut settings = load_settings(cli.config.as_deref())?;
            if let Some(device) = device {
                settings.transport.device = device;
            }
            run(&settings, dry_run, max_polls, trace)
        }
        Command::Plan => {
            let settings = load_settings(cli.config.as_deref())?;
            plan(&settings)
        }
        Command::CheckTable { path } => check_table(&path),
        Command::ExportPreset { name } => {
            let table = bundled_table(&name)?;
            print!("{}", TableEnvelope::new(table).to_text());
            Ok(())
        }
    }
}

fn bundled_table(name: &str) -> Result<ActionTable> {
    let table = preset::by_name(name).ok_or_else(|| {
        anyhow!(
            "unknown preset `{name}`, expected one of {}",
            preset::NAMES.join(", ")
        )
    })?;
    table.with_context(|| format!("bundled preset {name} is invalid"))
}

fn load_table(settings: &Settings) -> Result<ActionTable> {
    match &settings.session.table {
        Some(path) => read_table(path),
        None => bundled_table(&settings.session.preset),
    }
}

fn read_table(path: &Path) -> Result<ActionTable> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read table {}", path.display()))?;
    let envelope = TableEnvelope::from_text(&text)
        .with_context(|| format!("invalid table {}", path.display()))?;
    Ok(envelope.table)
}

fn build_session(settings: &Settings) -> Result<MacroSession> {
    let table = load_table(settings)?;
    let config = settings.session_config()?;
    MacroSession::new(table, config).context("table does not fit the configured scenario")
}

fn run(settings: &Settings, dry_run: bool, max_polls: Option<u64>, trace: bool) -> Result<()> {
    let session = build_session(settings)?;
    let mut runtime = RuntimeCoordinator::new(session);

    let mut last_frame = None;
    let on_poll = |report: &PollReport| {
        if trace && last_frame != Some(report.frame) {
            println!(
                "{:>8}  {}  {}",
                report.poll,
                encode_report(&report.frame).to_hex(),
                report
                    .range
                    .map(|range| range.to_string())
                    .unwrap_or_default()
            );
        }
        last_frame = Some(report.frame);
    };

    let summary = if dry_run {
        let mut sink = BufferedFrameSink::default();
        let summary = runtime.run_until_done(&mut sink, &mut NoPacer, max_polls, on_poll)?;
        info!(
            frames = sink.submitted(),
            transitions = sink.transitions(),
            "dry run complete"
        );
        summary
    } else {
        let device = &settings.transport.device;
        let file = OpenOptions::new()
            .write(true)
            .open(device)
            .with_context(|| format!("failed to open HID device {}", device.display()))?;
        info!(device = %device.display(), "HID device opened");

        let mut sink = HidWriterSink::new(file);
        let mut pacer = FixedIntervalPacer::new(settings.poll_interval());
        runtime.run_until_done(&mut sink, &mut pacer, max_polls, on_poll)?
    };

    report_summary(settings, &summary, runtime.session());
    Ok(())
}

fn report_summary(settings: &Settings, summary: &RunSummary, session: &MacroSession) {
    let seconds = summary.polls as f64 * settings.poll_interval().as_secs_f64();
    println!(
        "autopad: table={}, polls={}, completed={}, date={}, remaining={}, late_polls={}, est_seconds={:.1}",
        session.table().name(),
        summary.polls,
        summary.completed,
        summary.calendar.date,
        summary.calendar.countdown.as_signed(),
        summary.late_polls,
        seconds
    );
}

fn plan(settings: &Settings) -> Result<()> {
    let session = build_session(settings)?;
    let table = session.table();
    let start = session.calendar();

    let mut total_frames = table.range_frames(RangeId::Setup).unwrap_or(0);
    let mut steps = 0u64;
    println!("start {}  locale={}", start.date, start.locale);

    match session.script() {
        Some(script) => {
            for (index, range_id) in script.ranges().enumerate() {
                let frames = table.range_frames(range_id).unwrap_or(0);
                total_frames += frames;
                steps += 1;
                if index < PLAN_ROWS {
                    println!(
                        "{:>5}  {:<10}  frames={}",
                        index + 1,
                        range_id.to_string(),
                        frames
                    );
                }
            }
        }
        None => {
            for (index, step) in session.advancer().plan().enumerate() {
                let frames = table.range_frames(step.range).unwrap_or(0);
                total_frames += frames;
                steps += 1;
                if index < PLAN_ROWS {
                    println!(
                        "{:>5}  {:<10}  {}  remaining={:>3}  frames={}",
                        index + 1,
                        step.range.to_string(),
                        step.state_after.date,
                        step.state_after.countdown.as_signed(),
                        frames
                    );
                }
            }
        }
    }

    if steps > PLAN_ROWS as u64 {
        println!("  ... {} more ranges", steps - PLAN_ROWS as u64);
    }

    let polls = estimated_polls(total_frames, settings.session.echo_count);
    let seconds = polls as f64 * settings.poll_interval().as_secs_f64();
    println!(
        "total frames={} polls={} est_seconds={:.1}",
        total_frames, polls, seconds
    );
    Ok(())
}

fn check_table(path: &Path) -> Result<()> {
    let table = read_table(path)?;
    let ranges: Vec<String> = table
        .ranges()
        .map(|(range_id, range)| format!("{range_id}={}..{}", range.start, range.end))
        .collect();

    println!(
        "table {} ok: entries={}, ranges=[{}]",
        table.name(),
        table.len(),
        ranges.join(", ")
    );
    Ok(())
}
