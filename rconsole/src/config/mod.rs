// (c) 2026 The rconsole authors
//! # 📖 Configuration management
//!
//! rconsole obtains run-time configuration from the following sources, highest priority first:
//! 1. Command-line options (`--host`, `--port`, `--password`)
//! 2. `RCON_*` environment variables
//! 3. Configuration file(s)
//!    * `config/rcon.conf`, relative to the current directory (the _project file_)
//!    * the per-user file, e.g. `~/.config/rconsole/rcon.conf` on Linux
//!      (lower priority than the project file)
//!    * or, if `--config FILE` is given, only that file
//! 4. Hard-wired defaults
//!
//! Run `rconsole config-files` for a list of which files we read, and
//! `rconsole show-config` to see the effective values and where each came from.
//!
//! ## File format
//!
//! One `KEY=value` assignment per line, compatible with shell `source`:
//!
//! ```text
//! # RCON settings
//! RCON_HOST=localhost
//! RCON_PORT=25575
//! RCON_PASSWORD="my secret"
//! ```
//!
//! * Keys are case insensitive and the `RCON_` prefix is optional.
//! * Lines starting with `#` and blank lines are ignored. An `export ` prefix is accepted.
//! * Values may be single-quoted (taken literally) or double-quoted
//!   (`\"`, `\\`, `\$` and `` \` `` are unescaped).
//! * Unquoted values run to the end of the line, with surrounding whitespace trimmed.
//!
//! The file holds the RCON password in plain text. `rconsole setup` creates it
//! with mode 600; a warning is logged if a file we read is accessible by others.
//!
//! ## Configurable options
//!
//! The set of supported fields is the [Configuration] structure.
//! A file whose syntax is invalid is reported and skipped; an invalid value for a
//! known key is an error naming the key and the file it came from.

mod errors;
pub use errors::ConfigFileError;

mod manager;
pub use manager::Manager;

mod source;
pub(crate) use source::{field_name, key_name, quote_value};

mod structure;
pub use structure::{Configuration, Password, ResponseEndMode};

mod sysdefault;

/// Name of the configuration file
pub const BASE_CONFIG_FILENAME: &str = "rcon.conf";

/// Directory, relative to the working directory, holding the project configuration file
pub const PROJECT_CONFIG_DIR: &str = "config";
