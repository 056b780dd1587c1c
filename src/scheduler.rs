//! Daily scheduling of the job.
//!
//! The job runs once at startup. Unless single-run mode is on, a one-minute
//! ticker then fires it again each day at the configured local time until
//! the shutdown future resolves.

use crate::error::JobError;
use crate::job::JobSummary;
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use std::future::Future;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// A fixed local time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// Parse `HH:MM`.
    pub fn parse(at: &str) -> Result<Self, chrono::ParseError> {
        NaiveTime::parse_from_str(at.trim(), "%H:%M").map(Self::new)
    }

    /// First occurrence strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            today + ChronoDuration::days(1)
        }
    }
}

fn log_run(result: &Result<JobSummary, JobError>) {
    match result {
        Ok(summary) => info!(
            path = %summary.report_path.display(),
            items = summary.total_items(),
            "Scheduled run finished"
        ),
        Err(e) => error!(error = %e, "Scheduled run failed; waiting for the next one"),
    }
}

/// Run `job` now and then daily.
///
/// A failure of the first run is returned. Later failures are logged and
/// the loop keeps going. Returns `Ok` once `shutdown` resolves, or right
/// after the first run when `single_run` is set.
pub async fn run<F, Fut, S>(
    schedule: DailySchedule,
    single_run: bool,
    mut job: F,
    shutdown: S,
) -> Result<(), JobError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<JobSummary, JobError>>,
    S: Future,
{
    info!("Running job at startup");
    let summary = job().await?;
    info!(path = %summary.report_path.display(), "Startup run finished");

    if single_run {
        info!("Single-run mode; exiting");
        return Ok(());
    }

    let mut next = schedule.next_after(Local::now().naive_local());
    info!(%next, "Scheduler started");

    let mut ticker = interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown requested; stopping scheduler");
                return Ok(());
            }
            _ = ticker.tick() => {
                if Local::now().naive_local() >= next {
                    log_run(&job().await);
                    next = schedule.next_after(Local::now().naive_local());
                    info!(%next, "Next run scheduled");
                }
            }
        }
    }
}
