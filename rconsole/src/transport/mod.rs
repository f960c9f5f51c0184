// (c) 2026 The rconsole authors

//! # 📖 Transports
//!
//! A transport is one way of getting a command line into the game server.
//! They are tried in a fixed order by the [`Ladder`], best first:
//!
//! | name            | mechanism                                                   | confirmed |
//! |-----------------|-------------------------------------------------------------|-----------|
//! | `container-cli` | `<engine> exec <container> <cli> <command>`                 | yes       |
//! | `local-cli`     | `<cli> --host H --port P <command>`, password in the child's environment | yes |
//! | `raw-rcon`      | our own RCON [`Session`](crate::protocol::Session)          | yes       |
//! | `stdin`         | write the line to the server console's standard input      | no        |
//! | `attach`        | pipe the line through `<engine> attach`                     | no        |
//!
//! The last two cannot see the server's reply, so a [`Delivery`](crate::channel::Delivery)
//! through them is reported as unconfirmed.

use async_trait::async_trait;
use thiserror::Error;

use crate::channel::ServerCommand;
use crate::protocol::SessionError;

mod attach;
mod container;
mod ladder;
mod local_cli;
mod raw;
mod stdin;

pub use ladder::Ladder;

/// Why a transport could not be used, or failed
#[derive(Debug, Error)]
pub enum TransportError {
    /// Something required is not configured
    #[error("not configured: {0}")]
    Config(&'static str),
    /// The transport's preconditions are not met right now
    #[error("not available: {0}")]
    Unavailable(String),
    /// RCON session failure
    #[error(transparent)]
    Session(#[from] SessionError),
    /// An external command ran but reported failure
    #[error("{program} failed with {status}{}", detail(.stderr))]
    CommandFailed {
        /// What we ran
        program: String,
        /// Exit status
        status: String,
        /// What it said
        stderr: String,
    },
    /// The attempt took too long and was abandoned
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// Anything else, e.g. an external command could not be started
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

fn detail(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// One way of delivering a command
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs and reports
    fn name(&self) -> &'static str;

    /// Whether this transport can see the server's reply
    fn confirms_delivery(&self) -> bool;

    /// Checks, at the moment of the call, whether this transport can be attempted.
    /// The error explains why not.
    async fn available(&self) -> Result<(), TransportError>;

    /// Delivers a command, returning the server's response if there is one
    async fn execute(&self, command: &ServerCommand) -> Result<String, TransportError>;
}
