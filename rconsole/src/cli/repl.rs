//! Interactive console
// (c) 2026 The rconsole authors

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};
use tracing::debug;

use super::styles::{RESET, Tone};
use crate::channel::Channel;

const PROMPT: &str = "rcon> ";

/// Does this line end the session?
fn is_exit(line: &str) -> bool {
    ["exit", "quit", "q"]
        .iter()
        .any(|k| line.trim().eq_ignore_ascii_case(k))
}

/// Reads commands from `input` until an exit keyword or end of input,
/// sending each through the channel and writing the response to `output`.
pub(crate) async fn run<R, W>(channel: &Channel, mut input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        output,
        "{INFO}Type server commands; exit, quit or q (or end of input) to finish.{RESET}",
        INFO = Tone::Info.style()
    )?;
    let mut line = String::new();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line).await? == 0 {
            writeln!(output)?;
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        if is_exit(&line) {
            break;
        }
        match channel.send_command(line.trim_end_matches(['\r', '\n'])).await {
            Ok(delivery) => {
                debug!("served by {}", delivery.transport);
                if delivery.confirmed {
                    write!(output, "{}", delivery.output)?;
                    if !delivery.output.is_empty() && !delivery.output.ends_with('\n') {
                        writeln!(output)?;
                    }
                } else {
                    writeln!(
                        output,
                        "{INFO}(sent via {}; no response available){RESET}",
                        delivery.transport,
                        INFO = Tone::Info.style()
                    )?;
                }
            }
            Err(e) => writeln!(output, "{ERROR}Error:{RESET} {e}", ERROR = Tone::Error.style())?,
        }
    }
    Ok(())
}
