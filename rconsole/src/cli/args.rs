//! Command line arguments
// (c) 2026 The rconsole authors

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use figment::{Metadata, Profile, Provider, providers::Serialized, value::Dict, value::Map};
use serde::Serialize;

use super::styles::{CLAP_STYLES, ColourMode};

/// Remote console for a self-hosted game server.
///
/// Commands are delivered through the first transport that works: the RCON
/// CLI inside the server container, an RCON CLI on this host, a direct RCON
/// connection, the server console's stdin, or the container terminal.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    styles(CLAP_STYLES),
    infer_long_args(true),
    propagate_version(true)
)]
pub(crate) struct CliArgs {
    #[command(flatten)]
    pub(crate) global: GlobalOptions,

    #[command(subcommand)]
    pub(crate) action: Action,
}

impl CliArgs {
    pub(crate) fn custom_parse<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }
}

/// Options that apply to every subcommand
#[derive(Debug, clap::Args, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct GlobalOptions {
    /// Enable detailed debug output, including every transport attempt
    ///
    /// This has the same effect as setting `RUST_LOG=rconsole=debug` in the environment.
    /// If present, `RUST_LOG` overrides this option.
    #[arg(short, long, action, global(true), help_heading("Debug"))]
    pub(crate) debug: bool,

    /// Reports only errors
    #[arg(
        short,
        long,
        action,
        global(true),
        conflicts_with("debug"),
        help_heading("Output")
    )]
    pub(crate) quiet: bool,

    /// Log to a file
    ///
    /// The file is appended to. It receives what is printed to stderr, unless
    /// `RUST_LOG_FILE_DETAIL` is set (same syntax as `RUST_LOG`).
    #[arg(
        short('l'),
        long,
        value_name("FILE"),
        global(true),
        help_heading("Output")
    )]
    pub(crate) log_file: Option<PathBuf>,

    /// Colour mode for console output
    ///
    /// If unset, `CLICOLOR_FORCE` and `NO_COLOR` are honoured.
    #[arg(long, alias("colour"), value_name("MODE"), global(true), help_heading("Output"))]
    pub(crate) color: Option<ColourMode>,

    /// Read configuration from this file only
    #[arg(
        short('c'),
        long,
        value_name("FILE"),
        global(true),
        help_heading("Configuration")
    )]
    pub(crate) config: Option<PathBuf>,

    /// RCON host (overrides `RCON_HOST`)
    #[arg(long, value_name("HOST"), global(true), help_heading("Connection"))]
    pub(crate) host: Option<String>,

    /// RCON port (overrides `RCON_PORT`)
    #[arg(long, value_name("PORT"), global(true), help_heading("Connection"))]
    pub(crate) port: Option<u16>,

    /// RCON password (overrides `RCON_PASSWORD`).
    /// This is visible to other users of this machine; prefer the configuration file.
    #[arg(long, value_name("PASSWORD"), global(true), help_heading("Connection"))]
    pub(crate) password: Option<String>,
}

impl GlobalOptions {
    pub(crate) fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
        }
    }
}

/// Configuration set on the command line
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
}

impl Provider for Overrides {
    fn metadata(&self) -> Metadata {
        Metadata::named("command line")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}

/// What to do
#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub(crate) enum Action {
    /// Sends one command and prints the response
    ///
    /// The words are joined with spaces, so quoting is optional:
    /// `rconsole command say hello` and `rconsole command "say hello"` are the same.
    #[command(alias("cmd"))]
    Command {
        /// The command, without a leading slash
        #[arg(
            required(true),
            num_args(1..),
            trailing_var_arg(true),
            allow_hyphen_values(true),
            value_name("COMMAND")
        )]
        words: Vec<String>,
    },
    /// Checks the channel by sending `list`, and reports which transport served it
    Test,
    /// Reads commands from the terminal until `exit`, `quit`, `q` or end of input
    #[command(alias("repl"))]
    Interactive,
    /// Prompts for the connection settings and writes the configuration file
    Setup,
    /// Prints the effective configuration and where each value came from
    ShowConfig,
    /// Lists the configuration files that are read, in increasing order of priority
    ConfigFiles,
    /// Scheduled commands
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
}

/// Scheduler subcommands
#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub(crate) enum ScheduleAction {
    /// Runs every enabled schedule that is due now
    Run {
        /// Schedule file
        #[arg(long, value_name("FILE"))]
        file: Option<PathBuf>,
    },
    /// Lists the schedules
    List {
        /// Schedule file
        #[arg(long, value_name("FILE"))]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod test {
    use super::{Action, CliArgs, ScheduleAction};
    use crate::config::Manager;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::custom_parse(std::iter::once("rconsole").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_words() {
        let a = parse(&["command", "say", "hello", "--not-an-option"]);
        assert_eq!(
            a.action,
            Action::Command {
                words: vec!["say".into(), "hello".into(), "--not-an-option".into()]
            }
        );
        let a = parse(&["--debug", "cmd", r#"say "quoted""#]);
        assert!(a.global.debug);
        assert_eq!(
            a.action,
            Action::Command {
                words: vec![r#"say "quoted""#.into()]
            }
        );
    }

    #[test]
    fn command_needs_words() {
        assert!(CliArgs::custom_parse(["rconsole", "command"]).is_err());
    }

    #[test]
    fn global_options_anywhere() {
        let a = parse(&["test", "--host", "mc", "--port", "25576", "-q"]);
        assert_eq!(a.action, Action::Test);
        assert_eq!(a.global.host.as_deref(), Some("mc"));
        assert_eq!(a.global.port, Some(25576));
        assert!(a.global.quiet);
    }

    #[test]
    fn debug_and_quiet_conflict() {
        assert!(CliArgs::custom_parse(["rconsole", "-d", "-q", "test"]).is_err());
    }

    #[test]
    fn bad_port() {
        assert!(CliArgs::custom_parse(["rconsole", "--port", "70000", "test"]).is_err());
    }

    #[test]
    fn schedule() {
        let a = parse(&["schedule", "run", "--file", "s.json"]);
        assert_eq!(
            a.action,
            Action::Schedule {
                action: ScheduleAction::Run {
                    file: Some("s.json".into())
                }
            }
        );
    }

    #[test]
    fn overrides_only_what_was_given() {
        let a = parse(&["--port", "1234", "test"]);
        let mut mgr = Manager::without_files();
        mgr.merge_provider(a.global.overrides());
        let cfg = mgr.configuration().unwrap();
        assert_eq!(cfg.port, 1234);
        assert_eq!(cfg.host, "localhost");
        assert!(!cfg.password.is_set());
    }
}
