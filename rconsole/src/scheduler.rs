// (c) 2026 The rconsole authors

//! # 📖 Scheduled commands
//!
//! `rconsole schedule run` is meant to be called from cron every minute. It
//! runs each enabled schedule that is due, through the [command channel](crate::channel).
//!
//! The schedule file is JSON:
//!
//! ```json
//! {
//!   "schedules": [
//!     { "id": "restart-warning", "type": "daily", "run_time": "03:55",
//!       "command": "say Restarting in 5 minutes" },
//!     { "id": "save", "type": "interval", "interval_minutes": 30, "command": "save-all" },
//!     { "id": "weekly-reset", "type": "weekly", "day_of_week": 0, "run_time": "06:00",
//!       "command": "function reset:weekly", "enabled": false }
//!   ]
//! }
//! ```
//!
//! * Times are UTC. `day_of_week` counts from 0 = Monday.
//! * `last_run` is maintained by the scheduler.
//! * A missing or unreadable file is an empty schedule.
//!
//! Each execution appends one JSON line to `command-schedule.log` next to the schedule file.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::{DateTime, Datelike as _, NaiveDateTime, NaiveTime, TimeDelta, Timelike as _, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::channel::CommandSink;

/// Default location of the schedule file, relative to the working directory
pub const DEFAULT_SCHEDULE_FILE: &str = "config/command-schedule.json";

/// Name of the execution log, which lives beside the schedule file
pub const LOG_FILE_NAME: &str = "command-schedule.log";

/// Longest output recorded in the execution log, in characters
const LOG_OUTPUT_LIMIT: usize = 500;

fn enabled_by_default() -> bool {
    true
}

/// One scheduled command
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Schedule {
    /// Identifier, for the log
    #[serde(default)]
    pub id: Value,
    /// The server command
    #[serde(default)]
    pub command: String,
    /// Disabled schedules are never run
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// `interval`, `daily` or `weekly`
    #[serde(rename = "type", default)]
    pub kind: String,
    /// For `interval` (default 60)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<i64>,
    /// For `daily` and `weekly`, "HH:MM" (default "00:00")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_time: Option<String>,
    /// For `weekly`, 0 = Monday (default 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u32>,
    /// When it last ran (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<String>,
    /// Anything else in the entry is kept as is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// When a schedule runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Every so many minutes
    Interval(i64),
    /// Every day at a time
    Daily(NaiveTime),
    /// One day a week (0 = Monday) at a time
    Weekly(u32, NaiveTime),
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        match self {
            Rule::Interval(m) => write!(f, "every {m} min"),
            Rule::Daily(t) => write!(f, "daily at {}", t.format("%H:%M")),
            Rule::Weekly(d, t) => write!(
                f,
                "{} at {}",
                DAYS.get(*d as usize).copied().unwrap_or("never"),
                t.format("%H:%M")
            ),
        }
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// Reads a timestamp. Offset-less values are taken as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

impl Schedule {
    /// The run rule, if the entry has a valid one
    #[must_use]
    pub fn rule(&self) -> Option<Rule> {
        let at = || parse_time(self.run_time.as_deref().unwrap_or("00:00"));
        match self.kind.as_str() {
            "interval" => Some(Rule::Interval(self.interval_minutes.unwrap_or(60))),
            "daily" => at().map(Rule::Daily),
            "weekly" => at().map(|t| Rule::Weekly(self.day_of_week.unwrap_or(0), t)),
            _ => None,
        }
    }

    fn last_run_time(&self) -> Option<DateTime<Utc>> {
        let s = self.last_run.as_deref()?;
        let t = parse_timestamp(s);
        if t.is_none() {
            warn!("schedule {}: ignoring unreadable last_run {s:?}", self.id);
        }
        t
    }

    /// Should this run at `now`?
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(rule) = self.rule() else {
            return false;
        };
        let last = self.last_run_time();
        let at_time = |t: NaiveTime| now.hour() == t.hour() && now.minute() == t.minute();
        match rule {
            Rule::Interval(minutes) => {
                let Some(interval) = TimeDelta::try_minutes(minutes) else {
                    warn!("schedule {}: interval of {minutes} minutes is out of range", self.id);
                    return false;
                };
                last.is_none_or(|l| now - l >= interval)
            }
            Rule::Daily(t) => {
                at_time(t) && last.is_none_or(|l| l.date_naive() < now.date_naive())
            }
            Rule::Weekly(day, t) => {
                now.weekday().num_days_from_monday() == day
                    && at_time(t)
                    && last.is_none_or(|l| now - l >= TimeDelta::days(7))
            }
        }
    }
}

/// The schedule file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScheduleFile {
    /// Entries, in file order
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    /// Anything else in the file is kept as is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScheduleFile {
    /// Reads the file. Missing or corrupt files are empty schedules.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("{}: {e}; treating as empty", path.display());
                Self::default()
            }),
            Err(e) => {
                debug!("{}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Writes the file, creating its directory if need be
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating directory {}", dir.display()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text + "\n").with_context(|| format!("writing {}", path.display()))
    }

    /// A human-readable listing
    #[must_use]
    pub fn describe(&self) -> String {
        use std::fmt::Write as _;
        if self.schedules.is_empty() {
            return "No schedules.\n".into();
        }
        let mut out = String::new();
        for s in &self.schedules {
            let rule = s
                .rule()
                .map_or_else(|| format!("unknown type {:?}", s.kind), |r| r.to_string());
            let id = s.id.as_str().map_or_else(|| s.id.to_string(), String::from);
            let _ = writeln!(
                out,
                "{id:<20} {:<8} {rule:<20} last run {:<26} {}",
                if s.enabled { "enabled" } else { "disabled" },
                s.last_run.as_deref().unwrap_or("never"),
                s.command
            );
        }
        out
    }
}

/// The execution log's location for a given schedule file
#[must_use]
pub fn log_path(schedule_path: &Path) -> PathBuf {
    schedule_path.with_file_name(LOG_FILE_NAME)
}

fn truncate(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn append_log(path: &Path, entry: &Value) -> Result<()> {
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    writeln!(f, "{entry}").with_context(|| format!("writing {}", path.display()))
}

/// What a run did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Schedules executed
    pub ran: usize,
    /// Of those, how many got through
    pub succeeded: usize,
}

/// Runs every schedule that is due at `now`, logs each execution and saves
/// the updated `last_run` times.
///
/// A command that cannot be delivered is logged and does not stop the run.
pub async fn run_due<S: CommandSink + ?Sized>(
    path: &Path,
    sink: &S,
    now: DateTime<Utc>,
) -> Result<RunSummary> {
    let mut file = ScheduleFile::load(path);
    let log = log_path(path);
    let mut summary = RunSummary::default();

    for schedule in &mut file.schedules {
        if schedule.command.trim().is_empty() || !schedule.is_due(now) {
            continue;
        }
        info!("running schedule {}: {}", schedule.id, schedule.command);
        let (success, output) = sink.send_command_best_effort(&schedule.command).await;
        if !success {
            warn!("schedule {} failed: {output}", schedule.id);
        }
        summary.ran += 1;
        summary.succeeded += usize::from(success);

        let entry = json!({
            "timestamp": now.to_rfc3339(),
            "schedule_id": schedule.id,
            "command": schedule.command,
            "success": success,
            "output": truncate(&output, LOG_OUTPUT_LIMIT),
        });
        if let Err(e) = append_log(&log, &entry) {
            warn!("{e:#}");
        }
        schedule.last_run = Some(now.to_rfc3339());
    }

    if summary.ran > 0 {
        file.save(path)?;
    }
    Ok(summary)
}
