// (c) 2026 The rconsole authors

//! # 📖 The command channel
//!
//! [`Channel`] is the one entry point for getting a command into the game
//! server. Everything else (the CLI, the REPL, the scheduler, and any tool
//! that bans, ops or announces) goes through it.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! let manager = rconsole::Manager::standard(None)?;
//! use rconsole::CommandSink as _;
//! let channel = rconsole::Channel::new(&manager.configuration()?);
//! let (ok, output) = channel.send_command_best_effort("say Backup starting").await;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Configuration;
use crate::transport::{Ladder, TransportError};
use crate::util::shell_quote;

/// A command line that is safe to hand to any transport.
///
/// It is not empty and contains no CR, LF or NUL: through the console
/// transports a line break would inject a second command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand(String);

impl ServerCommand {
    /// Validates a command line. A single trailing newline is dropped.
    pub fn new(text: &str) -> Result<Self, ChannelError> {
        let text = text
            .strip_suffix("\r\n")
            .or_else(|| text.strip_suffix('\n'))
            .unwrap_or(text);
        if text.trim().is_empty() {
            return Err(ChannelError::InvalidCommand("command is empty"));
        }
        if text.contains(['\r', '\n']) {
            return Err(ChannelError::InvalidCommand(
                "command contains a line break",
            ));
        }
        if text.contains('\0') {
            return Err(ChannelError::InvalidCommand("command contains a NUL"));
        }
        Ok(Self(text.to_owned()))
    }

    /// The command, verbatim
    #[must_use]
    pub fn text(&self) -> &str {
        &self.0
    }

    /// The command as a single POSIX shell word
    #[must_use]
    pub fn shell_quoted(&self) -> String {
        shell_quote(&self.0)
    }
}

impl std::str::FromStr for ServerCommand {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A successful delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// The transport that delivered the command
    pub transport: &'static str,
    /// The server's response. Always empty when not `confirmed`.
    pub output: String,
    /// Whether the transport could see the server accept the command
    pub confirmed: bool,
}

/// One transport's reason for not delivering
#[derive(Debug)]
pub struct Attempt {
    /// Which transport
    pub transport: &'static str,
    /// What went wrong
    pub error: TransportError,
}

fn list(attempts: &[Attempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("\n  {}: {}", a.transport, a.error))
        .collect()
}

/// Command delivery failures
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The command was refused before any transport saw it
    #[error("invalid command: {0}")]
    InvalidCommand(&'static str),
    /// No transport could even be attempted
    #[error("no transport is available{}", list(.attempts))]
    NoTransportsAvailable {
        /// Why each was unavailable
        attempts: Vec<Attempt>,
    },
    /// Every transport that could be attempted failed
    #[error("all transports failed{}", list(.attempts))]
    AllTransportsFailed {
        /// Each failure or unavailability, in ladder order
        attempts: Vec<Attempt>,
    },
}

/// Something that takes commands on a best-effort basis.
///
/// This is the interface the other operator tools rely on; [`Channel`] is the real one.
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Returns whether the command got through, and the response or the reason it failed
    async fn send_command_best_effort(&self, text: &str) -> (bool, String);
}

/// The command facade
#[derive(Debug)]
pub struct Channel {
    ladder: Ladder,
}

impl Channel {
    /// A channel using the standard transport ladder
    #[must_use]
    pub fn new(config: &Configuration) -> Self {
        Self::with_ladder(Ladder::standard(config))
    }

    /// A channel using a custom ladder
    #[must_use]
    pub fn with_ladder(ladder: Ladder) -> Self {
        Self { ladder }
    }

    /// Delivers one command through the first transport that works.
    pub async fn send_command(&self, text: &str) -> Result<Delivery, ChannelError> {
        let command = ServerCommand::new(text)?;
        self.ladder.deliver(&command).await
    }
}

#[async_trait]
impl CommandSink for Channel {
    async fn send_command_best_effort(&self, text: &str) -> (bool, String) {
        match self.send_command(text).await {
            Ok(d) => (true, d.output),
            Err(e) => (false, e.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::{Channel, ChannelError, CommandSink as _, ServerCommand};
    use crate::transport::{Ladder, MockTransport, TransportError};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("list", "list")]
    #[case("list\n", "list")]
    #[case("list\r\n", "list")]
    #[case(r#"say "quoted" it's"#, r#"say "quoted" it's"#)]
    #[case("  padded  ", "  padded  ")]
    fn valid(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(ServerCommand::new(input).unwrap().text(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n")]
    #[case("say one\nsay two")]
    #[case("say one\rsay two")]
    #[case("list\n\n")]
    #[case("nul\0")]
    fn invalid(#[case] input: &str) {
        assert!(matches!(
            ServerCommand::new(input),
            Err(ChannelError::InvalidCommand(_))
        ));
    }

    #[test]
    fn shell_rendition() {
        let c: ServerCommand = "say it's".parse().unwrap();
        assert_eq!(c.shell_quoted(), r"'say it'\''s'");
        assert_eq!(c.to_string(), "say it's");
    }

    fn channel_with(result: Result<&'static str, ()>, confirmed: bool) -> Channel {
        let mut t = MockTransport::new();
        let _ = t.expect_name().return_const("fake");
        let _ = t.expect_confirms_delivery().return_const(confirmed);
        let _ = t.expect_available().returning(|| Ok(()));
        let _ = t.expect_execute().returning(move |c| match result {
            Ok(out) => Ok(format!("{out}: {}", c.text())),
            Err(()) => Err(TransportError::Unavailable("gone".into())),
        });
        Channel::with_ladder(Ladder::new(vec![Box::new(t)], Duration::from_secs(1)))
    }

    fn empty_channel() -> Channel {
        Channel::with_ladder(Ladder::new(Vec::new(), Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn send_command() {
        let ch = channel_with(Ok("echo"), true);
        let d = ch.send_command("list\n").await.unwrap();
        assert_eq!(d.transport, "fake");
        assert_eq!(d.output, "echo: list");
        assert!(d.confirmed);
    }

    #[tokio::test]
    async fn invalid_never_reaches_transport() {
        let mut t = MockTransport::new();
        let _ = t.expect_available().never();
        let _ = t.expect_execute().never();
        let ch = Channel::with_ladder(Ladder::new(vec![Box::new(t)], Duration::from_secs(1)));
        assert!(matches!(
            ch.send_command("a\nb").await,
            Err(ChannelError::InvalidCommand(_))
        ));
    }

    #[tokio::test]
    async fn best_effort() {
        let (ok, out) = channel_with(Ok("echo"), true)
            .send_command_best_effort("say hi")
            .await;
        assert!(ok);
        assert_eq!(out, "echo: say hi");

        let (ok, out) = channel_with(Err(()), true)
            .send_command_best_effort("say hi")
            .await;
        assert!(!ok);
        assert_eq!(out, "all transports failed\n  fake: not available: gone");

        let (ok, out) = empty_channel().send_command_best_effort("").await;
        assert!(!ok);
        assert_eq!(out, "invalid command: command is empty");
    }

    #[tokio::test]
    async fn empty_ladder() {
        let e = empty_channel().send_command("list").await.unwrap_err();
        assert!(matches!(e, ChannelError::NoTransportsAvailable { .. }));
    }
}
