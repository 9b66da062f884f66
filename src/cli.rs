//! Command line front end: inspect the pacing of a capture log or replay it
//! against the in-process simulated browser.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::browser::WindowId;
use crate::capture::{CaptureLog, CaptureSource, LogExport};
use crate::config::Config;
use crate::mock::{MockBrowser, MockPage};
use crate::replay::{plan, replayable_steps, ReplayReport, Replayer, StartOptions, StatusHub};

#[derive(Parser, Debug)]
#[command(name = "replayer", about = "Replay captured browser sessions", version)]
pub struct Cli {
    /// Config file (defaults to ~/.replayer/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the replayable steps of a log with the wait before each
    Plan(PlanArgs),
    /// Replay a log against simulated pages, printing notifications as JSON lines
    Simulate(SimulateArgs),
    /// Print an example config file
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Exported capture log (JSON)
    pub log: PathBuf,

    /// Window id to replay as (defaults to the exported window)
    #[arg(long)]
    pub window: Option<i64>,

    /// Playback speed multiplier
    #[arg(long)]
    pub speed: Option<f64>,

    /// Upper bound for a single inter-step wait, in milliseconds
    #[arg(long = "max-step-delay")]
    pub max_step_delay: Option<u64>,
}

impl RunArgs {
    fn start_options(&self) -> StartOptions {
        StartOptions {
            speed: self.speed,
            max_step_delay_ms: self.max_step_delay,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Page fixtures the simulated browser serves
    #[arg(long)]
    pub pages: PathBuf,
}

/// Page fixtures for `simulate`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimulationFixture {
    /// Page the window shows before replay starts (defaults to the first page)
    pub start_url: Option<String>,
    /// Load delay for pages without their own
    pub load_ms: u64,
    pub pages: Vec<MockPage>,
}

impl SimulationFixture {
    pub fn read_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read page fixtures {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid page fixtures {}", path.display()))
    }

    fn start_url(&self) -> String {
        self.start_url
            .clone()
            .or_else(|| self.pages.first().map(|page| page.url.clone()))
            .unwrap_or_else(|| "about:blank".to_string())
    }
}

fn load_log(args: &RunArgs) -> Result<(CaptureLog, WindowId)> {
    let export = LogExport::read_from_path(&args.log)?;
    let log = CaptureLog::new();
    let window = export.import_into(&log, args.window.map(WindowId));
    Ok((log, window))
}

/// `replayer plan`
pub fn run_plan(args: &PlanArgs, config: &Config, out: &mut dyn Write) -> Result<()> {
    let (log, window) = load_log(&args.run)?;
    let options = config.replay.with_overrides(&args.run.start_options());
    let steps = replayable_steps(&log.snapshot(window));

    writeln!(
        out,
        "window {window}: {} replayable steps (speed {}, max step delay {}ms)",
        steps.len(),
        options.speed,
        options.max_step_delay.as_millis()
    )?;
    let mut total_ms = 0;
    for planned in plan(&steps, &options) {
        total_ms += planned.wait_ms;
        writeln!(
            out,
            "{:>6}  {:<16} +{}ms",
            planned.id,
            planned.kind.as_str(),
            planned.wait_ms
        )?;
    }
    writeln!(out, "total pacing: {total_ms}ms")?;
    Ok(())
}

/// `replayer simulate`
pub async fn run_simulate(
    args: &SimulateArgs,
    config: &Config,
    out: &mut dyn Write,
) -> Result<Option<ReplayReport>> {
    let fixture = SimulationFixture::read_from_path(&args.pages)?;
    let (log, window) = load_log(&args.run)?;

    let browser = MockBrowser::new()
        .with_agent(config.agent())
        .with_load_delay(Duration::from_millis(fixture.load_ms));
    let start_url = fixture.start_url();
    for page in fixture.pages {
        browser.add_page(page);
    }
    browser.open_window(window, &start_url);

    let replayer = Replayer::new(Arc::new(browser), Arc::new(log))
        .with_defaults(config.replay)
        .with_timings(config.timings)
        .with_status(StatusHub::new(config.status_capacity));
    let mut rx = replayer.subscribe();

    let Some(mut task) = replayer.start(window, args.run.start_options()) else {
        tracing::warn!(window_id = %window, "Log has no replayable steps");
        return Ok(None);
    };

    let report = loop {
        tokio::select! {
            report = &mut task => break report.context("replay task failed")?,
            event = rx.recv() => match event {
                Ok(event) => writeln!(out, "{}", serde_json::to_string(&event)?)?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Status output fell behind; notifications dropped");
                }
                Err(RecvError::Closed) => {}
            },
        }
    };
    while let Ok(event) = rx.try_recv() {
        writeln!(out, "{}", serde_json::to_string(&event)?)?;
    }
    Ok(Some(report))
}
