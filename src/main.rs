use std::fs::{self, OpenOptions};
use std::io;

use anyhow::Result;
use clap::Parser;
use replayer::cli::{run_plan, run_simulate, Cli, Command};
use replayer::config::EXAMPLE_CONFIG;
use replayer::Config;

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    match &cli.log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let log_file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(log_file)
                .with_ansi(false) // Disable ANSI colors in log file
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = Config::load(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Plan(args) => run_plan(args, &config, &mut out)?,
        Command::Simulate(args) => {
            if let Some(report) = run_simulate(args, &config, &mut out).await? {
                eprintln!(
                    "replayed {} of {} steps ({} failed)",
                    report.completed, report.total, report.failed
                );
            }
        }
        Command::Config => print!("{EXAMPLE_CONFIG}"),
    }
    Ok(())
}
