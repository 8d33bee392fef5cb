// src/printer/printers.rs

//! The output line type [`OutputLine`] and the printer
//! [`PrinterLogwatch`] that writes the logwatch text protocol.
//!
//! ```text
//! <<<logwatch>>>
//! [[[/var/log/missing*:missing]]]
//! [[[/var/log/unreadable:cannotopen]]]
//! [[[/var/log/messages]]]
//! C Error: disk full
//! . context line
//! ```

use crate::common::{CONT_SEP, CONT_SEP_DISPLAY};
use crate::data::level::Level;
use crate::debug::printers::de_err;

use std::io::{Result, Write};

#[doc(hidden)]
pub use ::termcolor::{Color, ColorChoice, ColorSpec, WriteColor};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// OutputLine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One content line of a logfile section, printed as `<letter> <text>`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputLine {
    pub level: Level,
    /// without line ending; continuation lines are joined with [`CONT_SEP`]
    pub text: String,
}

pub type OutputLines = Vec<OutputLine>;

impl OutputLine {
    pub fn new<S: Into<String>>(
        level: Level,
        text: S,
    ) -> OutputLine {
        OutputLine {
            level,
            text: text.into(),
        }
    }

    /// The line as written when not printing to a terminal, with line
    /// ending.
    pub fn to_plain(&self) -> String {
        format!("{} {}\n", self.level.letter(), self.text)
    }

    /// Length in bytes of [`to_plain`](OutputLine::to_plain).
    pub fn plain_len(&self) -> usize {
        self.level.letter().len_utf8() + 1 + self.text.len() + 1
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PrinterLogwatch
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// [`Color`] of a [`Level`] on a terminal; neutral lines are not colored.
///
/// [`Color`]: https://docs.rs/termcolor/1.4.1/termcolor/enum.Color.html
pub const fn level_color(level: Level) -> Option<Color> {
    match level {
        Level::Critical => Some(Color::Red),
        Level::Warning => Some(Color::Yellow),
        Level::Ok => Some(Color::Green),
        Level::Info => Some(Color::Blue),
        Level::Neutral => None,
    }
}

/// Writes the logwatch text protocol to `out`.
///
/// When printing to a terminal, content lines are colored by level and
/// continuation separators are shown as `\nCONT:`. Otherwise lines are
/// written exactly as the monitoring server expects them.
pub struct PrinterLogwatch<W: WriteColor> {
    out: W,
    /// print for a human?
    tty: bool,
}

impl<W: WriteColor> PrinterLogwatch<W> {
    pub fn new(
        out: W,
        tty: bool,
    ) -> PrinterLogwatch<W> {
        PrinterLogwatch { out, tty }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write a protocol line like a section header, never colored.
    pub fn print_protocol_line(
        &mut self,
        line: &str,
    ) -> Result<()> {
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")
    }

    pub fn print_section_header(
        &mut self,
        name: &str,
    ) -> Result<()> {
        self.print_protocol_line(&format!("[[[{}]]]", name))
    }

    pub fn print_line(
        &mut self,
        line: &OutputLine,
    ) -> Result<()> {
        if !self.tty {
            return self.out.write_all(line.to_plain().as_bytes());
        }
        let text: String = format!("{} {}", line.level.letter(), line.text.replace(CONT_SEP, CONT_SEP_DISPLAY));
        let color = match level_color(line.level) {
            Some(color) => color,
            None => {
                self.out.write_all(text.as_bytes())?;
                return self.out.write_all(b"\n");
            }
        };
        if let Err(err) = self.out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true)) {
            de_err!("set_color({:?}) returned error {}", color, err);
            return Err(err);
        }
        self.out.write_all(text.as_bytes())?;
        if let Err(err) = self.out.reset() {
            de_err!("reset() returned error {}", err);
            return Err(err);
        }
        self.out.write_all(b"\n")
    }

    pub fn print_lines(
        &mut self,
        lines: &[OutputLine],
    ) -> Result<()> {
        for line in lines.iter() {
            self.print_line(line)?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()
    }
}

/// Color choice for stdout: color only when printing to a terminal.
pub fn color_choice(tty: bool) -> ColorChoice {
    if tty {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}
