//! Main CLI for rconsole
// (c) 2026 The rconsole authors

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use tracing::{info, warn};

use super::args::{Action, CliArgs, GlobalOptions, ScheduleAction};
use super::styles::{RESET, Tone, configure_colours, use_colours};
use crate::channel::Channel;
use crate::config::{Configuration, Manager};
use crate::scheduler::{self, DEFAULT_SCHEDULE_FILE, ScheduleFile};
use crate::util::{LogOptions, TimeFormat, Verbosity, init_logging};

/// Main CLI entrypoint
///
/// Call this from `main`, passing the arguments to use.
/// Normally you will call `cli(std::env::args_os())` but you can pass in alternate arguments for CLI testing.
///
/// # Safety
/// - This function starts a tokio runtime and performs work in it.
/// - This function is not safe to call from multi-threaded code.
#[must_use]
pub fn cli<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    #[allow(clippy::match_bool)]
    cli_inner(args)
        .inspect_err(|e| {
            if crate::util::logging_is_initialised() {
                tracing::error!("{e:#}");
            } else {
                anstream::eprintln!("{ERROR}Error:{RESET} {e:#}", ERROR = Tone::Error.style());
            }
        })
        .map_or(ExitCode::FAILURE, |success| match success {
            true => ExitCode::SUCCESS,
            false => ExitCode::FAILURE,
        })
}

/// Inner CLI logic
///
/// # Return
/// true indicates success. false indicates a failure that has already been reported.
fn cli_inner<I, T>(args: I) -> Result<bool>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let Some(args) = parse_args(args)? else {
        return Ok(true); // help/version shown; exit
    };
    configure_colours(args.global.color);

    let mut manager = Manager::standard(args.global.config.as_deref())?;
    manager.merge_provider(args.global.overrides());

    handle_action(args.action, &args.global, manager)
}

fn parse_args<I, T>(args: I) -> Result<Option<CliArgs>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    use clap::error::ErrorKind::{DisplayHelp, DisplayVersion};
    match CliArgs::custom_parse(args) {
        Ok(args) => Ok(Some(args)),
        Err(e) if matches!(e.kind(), DisplayHelp | DisplayVersion) => {
            e.print()?;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

// ACTION HANDLERS ///////////////////////////////////////////////////////////

#[tokio::main(flavor = "current_thread")]
async fn handle_action(action: Action, global: &GlobalOptions, manager: Manager) -> Result<bool> {
    // An invalid configuration is only reported by the actions that need it.
    let config = manager.configuration();
    let time_format = config
        .as_ref()
        .map_or(TimeFormat::default(), |c| c.time_format);
    init_logging(&LogOptions {
        verbosity: Verbosity::from(global),
        console: true,
        file: global.log_file.as_deref(),
        time_format,
        colour: use_colours(),
    })?;
    for w in manager.warnings() {
        warn!("{w}");
    }

    match action {
        Action::ConfigFiles => {
            for f in Manager::config_files(global.config.as_deref()) {
                let status = if f.exists() { "" } else { " (not present)" };
                println!("{}{status}", f.display());
            }
            Ok(true)
        }
        Action::ShowConfig => {
            print!("{}", manager.describe()?);
            Ok(true)
        }
        Action::Setup => super::setup::run(&manager, global.config.as_deref()),
        Action::Command { words } => send_one(&config?, &words.join(" ")).await,
        Action::Test => run_test(&config?).await,
        Action::Interactive => {
            let channel = Channel::new(&config?);
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            super::repl::run(&channel, input, &mut std::io::stdout()).await?;
            Ok(true)
        }
        Action::Schedule { action } => run_schedule(config, action).await,
    }
}

async fn send_one(config: &Configuration, text: &str) -> Result<bool> {
    let delivery = Channel::new(config).send_command(text).await?;
    info!("delivered via {}", delivery.transport);
    if delivery.confirmed {
        print!("{}", delivery.output);
        if !delivery.output.is_empty() && !delivery.output.ends_with('\n') {
            println!();
        }
    } else {
        anstream::eprintln!(
            "{INFO}(sent via {}; no response available){RESET}",
            delivery.transport,
            INFO = Tone::Info.style()
        );
    }
    Ok(true)
}

async fn run_test(config: &Configuration) -> Result<bool> {
    let delivery = Channel::new(config).send_command("list").await?;
    let confirmation = if delivery.confirmed {
        "response received"
    } else {
        "delivery not confirmed"
    };
    anstream::println!(
        "{SUCCESS}OK{RESET}: served by {} ({confirmation})",
        delivery.transport,
        SUCCESS = Tone::Success.style()
    );
    if !delivery.output.is_empty() {
        println!("{}", delivery.output.trim_end());
    }
    Ok(true)
}

async fn run_schedule(config: Result<Configuration>, action: ScheduleAction) -> Result<bool> {
    let default_file = || PathBuf::from(DEFAULT_SCHEDULE_FILE);
    match action {
        ScheduleAction::List { file } => {
            print!("{}", ScheduleFile::load(&file.unwrap_or_else(default_file)).describe());
            Ok(true)
        }
        ScheduleAction::Run { file } => {
            let channel = Channel::new(&config?);
            let path = file.unwrap_or_else(default_file);
            let summary = scheduler::run_due(&path, &channel, chrono::Utc::now()).await?;
            info!(
                "{} schedule(s) run, {} succeeded",
                summary.ran, summary.succeeded
            );
            Ok(summary.succeeded == summary.ran)
        }
    }
}
