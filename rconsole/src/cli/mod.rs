//! Command Line Interface for rconsole
// (c) 2026 The rconsole authors
mod args;
pub(crate) use args::GlobalOptions;
mod cli_main;
pub use cli_main::cli;
mod repl;
mod setup;
pub(crate) mod styles;
