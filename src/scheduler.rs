//! Cron-based timer trigger
//!
//! Runs one job at a time on a cron schedule until shutdown is signalled.
//! A failed run is logged and the loop waits for the next occurrence; the
//! job itself decides what a failure means.

use crate::{Result, WeatherStreamError};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Lateness after which a tick is reported as past due
const PAST_DUE_TOLERANCE: Duration = Duration::from_secs(1);

/// A parsed cron expression
#[derive(Debug, Clone)]
pub struct TimerSchedule {
    expression: String,
    schedule: cron::Schedule,
}

impl TimerSchedule {
    /// Parse a six-field (with seconds) or standard five-field expression
    pub fn parse(expression: &str) -> Result<Self> {
        let normalized = normalize_cron_expr(expression);
        let schedule = cron::Schedule::from_str(&normalized).map_err(|e| {
            WeatherStreamError::schedule(format!("invalid cron expression '{expression}': {e}"))
        })?;
        Ok(Self {
            expression: normalized,
            schedule,
        })
    }

    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Next occurrence strictly after `after`
    pub fn next_after(&self, after: &DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.schedule.after(after).next().ok_or_else(|| {
            WeatherStreamError::schedule(format!("'{}' has no next occurrence", self.expression))
        })
    }

    /// Next occurrence after `last`, collapsing occurrences missed before
    /// `now` into the most recent one
    pub fn catch_up(&self, last: &DateTime<Utc>, now: &DateTime<Utc>) -> Result<DateTime<Utc>> {
        let mut next = self.next_after(last)?;
        while next < *now {
            let following = self.next_after(&next)?;
            if following > *now {
                break;
            }
            next = following;
        }
        Ok(next)
    }
}

/// Standard cron has 5 fields; the `cron` crate wants seconds first
fn normalize_cron_expr(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// One firing of the timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerTick {
    /// When the run was due; `None` for the startup run
    pub scheduled: Option<DateTime<Utc>>,
    /// When the run actually started
    pub fired: DateTime<Utc>,
}

impl TimerTick {
    /// Whether the run started noticeably later than scheduled
    #[must_use]
    pub fn is_past_due(&self) -> bool {
        match self.scheduled {
            Some(scheduled) => (self.fired - scheduled)
                .to_std()
                .is_ok_and(|late| late > PAST_DUE_TOLERANCE),
            None => false,
        }
    }
}

/// Run `job` on `schedule` until `shutdown` turns true.
///
/// Runs never overlap: ticks that come due while the previous run is still
/// going collapse into one run that fires as soon as it finishes and is
/// reported past due.
pub async fn run<F, Fut>(
    schedule: &TimerSchedule,
    run_on_startup: bool,
    mut shutdown: watch::Receiver<bool>,
    mut job: F,
) -> Result<()>
where
    F: FnMut(TimerTick) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    info!("Timer trigger started with schedule '{}'", schedule.expression());

    if run_on_startup {
        fire(&mut job, None).await;
    }

    let mut last = Utc::now();
    while !*shutdown.borrow() {
        let next = schedule.catch_up(&last, &Utc::now())?;
        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        fire(&mut job, Some(next)).await;
        last = next;
    }

    info!("Timer trigger stopped");
    Ok(())
}

async fn fire<F, Fut>(job: &mut F, scheduled: Option<DateTime<Utc>>)
where
    F: FnMut(TimerTick) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let tick = TimerTick {
        scheduled,
        fired: Utc::now(),
    };
    if tick.is_past_due() {
        warn!("The timer is past due!");
    }
    info!("Timer trigger ran at {}", tick.fired.to_rfc3339());

    if let Err(e) = job(tick).await {
        error!("Scheduled run failed: {}", e);
    }
}
