//! Logging setup
// (c) 2026 The rconsole authors

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context as _;
use serde::{Deserialize, Serialize, de};
use strum::VariantNames as _;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{
        MakeWriter,
        time::{ChronoLocal, ChronoUtc},
    },
    prelude::*,
};

use crate::cli::GlobalOptions;

static INITIALISED: AtomicBool = AtomicBool::new(false);

/// Overrides the console filter (standard `tracing_subscriber` syntax)
const CONSOLE_FILTER_VAR: &str = "RUST_LOG";
/// Overrides the log file filter
const FILE_FILTER_VAR: &str = "RUST_LOG_FILE_DETAIL";

/// How much we log about our own doings
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Verbosity {
    /// `--quiet`
    Error,
    /// The default
    Info,
    /// `--debug`: every transport attempt and protocol step
    Debug,
}

impl From<&GlobalOptions> for Verbosity {
    fn from(options: &GlobalOptions) -> Self {
        match (options.debug, options.quiet) {
            (true, _) => Self::Debug,
            (false, true) => Self::Error,
            (false, false) => Self::Info,
        }
    }
}

/// Selects the format of time stamps in log messages
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
    Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "kebab-case")]
pub enum TimeFormat {
    /// Local time, `2024-06-03 04:00:00L`
    #[default]
    Local,
    /// UTC, `2024-06-03 03:00:00Z`
    Utc,
    /// Local time as RFC 3339, `2024-06-03T04:00:00.123+01:00`
    Rfc3339,
}

impl<'de> Deserialize<'de> for TimeFormat {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.to_ascii_lowercase()
            .parse()
            .map_err(|_| de::Error::unknown_variant(&s, TimeFormat::VARIANTS))
    }
}

/// Everything [`init`] needs to know
#[derive(Debug, Clone, Copy)]
pub(crate) struct LogOptions<'a> {
    pub(crate) verbosity: Verbosity,
    /// Log to stderr
    pub(crate) console: bool,
    /// Also append to this file
    pub(crate) file: Option<&'a Path>,
    pub(crate) time_format: TimeFormat,
    /// Colour the console output
    pub(crate) colour: bool,
}

/// A filter, and whether it came from the environment.
/// Targets are only shown in the latter case, since otherwise everything is ours.
fn filter(var: &str, fallback: Verbosity) -> anyhow::Result<(EnvFilter, bool)> {
    match std::env::var(var) {
        Ok(directives) => {
            let f = EnvFilter::try_new(&directives)
                .with_context(|| format!("{var} (set in environment) was not understood"))?;
            Ok((f, true))
        }
        Err(_) => Ok((
            EnvFilter::try_new(format!("{}={fallback}", env!("CARGO_CRATE_NAME")))?,
            false,
        )),
    }
}

type BoxedLayer = Box<dyn tracing_subscriber::Layer<Registry> + Send + Sync>;

fn layer<W>(writer: W, filter: EnvFilter, targets: bool, time: TimeFormat, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(targets)
        .with_ansi(ansi)
        .with_writer(writer);
    match time {
        TimeFormat::Local => base
            .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%SL".into()))
            .with_filter(filter)
            .boxed(),
        TimeFormat::Utc => base
            .with_timer(ChronoUtc::new("%Y-%m-%d %H:%M:%SZ".into()))
            .with_filter(filter)
            .boxed(),
        TimeFormat::Rfc3339 => base
            .with_timer(ChronoLocal::rfc_3339())
            .with_filter(filter)
            .boxed(),
    }
}

fn build_layers(options: &LogOptions<'_>) -> anyhow::Result<Vec<BoxedLayer>> {
    let mut layers = Vec::with_capacity(2);
    let (console_filter, from_env) = filter(CONSOLE_FILTER_VAR, options.verbosity)?;

    if options.console {
        layers.push(layer(
            std::io::stderr,
            console_filter,
            from_env,
            options.time_format,
            options.colour,
        ));
    }

    if let Some(path) = options.file {
        // Appended to, so that scheduled runs build up a history
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        let (file_filter, from_env) = if std::env::var_os(FILE_FILTER_VAR).is_some() {
            filter(FILE_FILTER_VAR, options.verbosity)?
        } else {
            filter(CONSOLE_FILTER_VAR, options.verbosity)?
        };
        layers.push(layer(
            Arc::new(file),
            file_filter,
            from_env,
            options.time_format,
            false,
        ));
    }
    Ok(layers)
}

/// Installs the global subscriber.
///
/// Only the first call in a process has any effect. If this fails, nothing is
/// installed and the caller must report the error some other way.
pub(crate) fn init(options: &LogOptions<'_>) -> anyhow::Result<()> {
    if is_initialised() {
        tracing::debug!("logging already set up");
        return Ok(());
    }
    let layers = build_layers(options)?;
    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("installing the log subscriber")?;
    INITIALISED.store(true, Ordering::Relaxed);
    Ok(())
}

/// Has [`init`] been called?
pub(crate) fn is_initialised() -> bool {
    INITIALISED.load(Ordering::Relaxed)
}
