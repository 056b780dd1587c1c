//! Command-line interface.
//!
//! All options have defaults; the only required input is the YAML config,
//! which is looked up as `config.yaml` in the working directory unless
//! `--config` says otherwise.

use crate::scheduler::DailySchedule;
use crate::utils::is_truthy;
use clap::Parser;
use std::path::PathBuf;

/// Aggregate feeds, videos and pages into a daily digest.
///
/// # Examples
///
/// ```sh
/// # Run now, then every day at 08:00
/// daily_digest
///
/// # Run once and exit (also implied by CI=true)
/// daily_digest --once -c sources.yaml -o /tmp/digest.md
///
/// # Run now, then every day at 18:30
/// daily_digest --at 18:30
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML configuration
    #[arg(short, long, env = "DIGEST_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Report path, overriding `output.path` from the config
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Local time of the daily run (HH:MM)
    #[arg(long, default_value = "08:00", value_parser = parse_schedule)]
    pub at: DailySchedule,

    /// Run the job once and exit
    #[arg(long)]
    pub once: bool,
}

fn parse_schedule(s: &str) -> Result<DailySchedule, String> {
    DailySchedule::parse(s).map_err(|e| format!("expected HH:MM ({e})"))
}

impl Cli {
    /// Single-run mode: `--once`, or a truthy `CI` value.
    pub fn single_run(&self, ci: Option<&str>) -> bool {
        self.once || is_truthy(ci)
    }
}
