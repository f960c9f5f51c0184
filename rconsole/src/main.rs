//! rconsole utility - main entrypoint
// (c) 2026 The rconsole authors

use std::process::ExitCode;

fn main() -> ExitCode {
    rconsole::main(std::env::args_os())
}
