//! General utility code that didn't fit anywhere else
//!
//! Note that most of this module is not exported.
// (c) 2026 The rconsole authors

pub(crate) mod process;

mod shell;
pub(crate) use shell::shell_quote;

mod tracing;
pub use tracing::TimeFormat;
pub(crate) use tracing::{
    LogOptions, Verbosity, init as init_logging, is_initialised as logging_is_initialised,
};
