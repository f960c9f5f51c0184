// (c) 2026 The rconsole authors
//! Terminal colours

use std::io::IsTerminal as _;

use anstream::ColorChoice;
use anstyle::{AnsiColor, Color, Style};
use clap::builder::styling::Styles;

pub(crate) use anstyle::Reset as RESET;

const fn fg(colour: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(colour)))
}

const HEADING: Style = fg(AnsiColor::Yellow).underline();

pub(crate) const CLAP_STYLES: Styles = Styles::styled()
    .usage(HEADING)
    .header(HEADING)
    .literal(Style::new().bold())
    .invalid(fg(AnsiColor::Yellow).bold())
    .error(fg(AnsiColor::Red).bold())
    .valid(fg(AnsiColor::Cyan).bold().underline())
    .placeholder(fg(AnsiColor::Cyan));

/// What a piece of console output is saying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tone {
    /// Something went wrong
    Error,
    /// Commentary from us, as opposed to output from the server
    Info,
    /// The channel works
    Success,
}

impl Tone {
    /// The style for this tone, or no style when colours are off
    #[must_use]
    pub(crate) fn style(self) -> Style {
        if !use_colours() {
            return Style::new();
        }
        match self {
            Tone::Error => fg(AnsiColor::Red).bold(),
            Tone::Info => fg(AnsiColor::Cyan),
            Tone::Success => fg(AnsiColor::Green),
        }
    }
}

/// Are we configured to use terminal colours?
#[must_use]
pub(crate) fn use_colours() -> bool {
    console::colors_enabled()
}

/// `--color` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum ColourMode {
    /// Always colour (aliases: `on`, `yes`)
    #[value(alias = "on", alias = "yes")]
    Always,
    /// Never colour (aliases: `off`, `no`, `none`)
    #[value(alias = "off", alias = "no", alias = "none")]
    Never,
    /// Colour when writing to a terminal, subject to `NO_COLOR` and `CLICOLOR_FORCE`
    Auto,
}

/// <https://bixense.com/clicolors/>
fn from_environment() -> bool {
    let set = |var: &str| std::env::var_os(var).is_some_and(|v| !v.is_empty());
    if set("NO_COLOR") {
        false
    } else if set("CLICOLOR_FORCE") {
        true
    } else {
        std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
    }
}

/// Applies `--color` to everything that writes to the terminal
pub(crate) fn configure_colours(mode: Option<ColourMode>) {
    let on = match mode {
        Some(ColourMode::Always) => true,
        Some(ColourMode::Never) => false,
        None | Some(ColourMode::Auto) => from_environment(),
    };
    console::set_colors_enabled(on);
    console::set_colors_enabled_stderr(on);
    let choice = if on {
        ColorChoice::Always
    } else {
        ColorChoice::Never
    };
    choice.write_global();
}
