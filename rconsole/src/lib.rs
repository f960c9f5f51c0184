// (c) 2026 The rconsole authors

//! rconsole is a remote command channel for a self-hosted game server.
//!
//! It delivers a single console command (`list`, `say hello`, `save-all`, ...)
//! to the server and returns the server's textual response, trying several
//! transports in order until one works:
//!
//! | # | Transport | Response? |
//! |---|-----------|-----------|
//! | 1 | The RCON CLI inside the server's container | yes |
//! | 2 | An RCON CLI installed on this host | yes |
//! | 3 | A direct [RCON](protocol) connection | yes |
//! | 4 | Writing to the server console's stdin | no |
//! | 5 | Attaching to the container's terminal | no |
//!
//! Whichever transport serves a command, callers see the same [`Delivery`].
//!
//! ## 🧰 Getting Started
//!
//! * Run `rconsole setup` to record the RCON host, port and password in
//!   `config/rcon.conf`, or set `RCON_HOST`, `RCON_PORT` and `RCON_PASSWORD`.
//! * If the server runs in a container, set `RCON_CONTAINER` to its name.
//! * `rconsole test` sends `list` and tells you which transport answered.
//! * `rconsole command say hello` sends one command; `rconsole interactive`
//!   opens a console.
//! * `rconsole schedule run`, from cron, runs [scheduled commands](scheduler).
//!
//! See [config] for all the settings.
//!
//! ## Library use
//!
//! Other tools send commands through [`Channel`], or through the [`CommandSink`]
//! trait when all they need is "did it work, and what came back".

pub(crate) mod cli;
pub use cli::cli as main;

pub mod channel;
pub use channel::{Channel, ChannelError, CommandSink, Delivery, ServerCommand};

pub mod config;
pub use config::{Configuration, Manager};

pub mod protocol;
pub mod scheduler;
pub mod transport;

mod util;
pub use util::TimeFormat;
