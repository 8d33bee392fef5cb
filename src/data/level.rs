// src/data/level.rs

//! Implements [`Level`], the severity of a classified log line.

use std::fmt;
use std::io::{Error, ErrorKind, Result};

/// Rank compared while tracking the worst severity of a scanned file.
pub type LevelRank = i8;

/// Worst-severity value before anything matched. Below every [`Level`]
/// rank so that any rule match, even an `Info` match, is "something".
pub const RANK_NOTHING: LevelRank = -2;

/// Severity of a log line.
///
/// Each variant is written as a single letter at the start of an output
/// line, e.g. `C Error: disk full`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Level {
    /// `C`
    Critical,
    /// `W`
    Warning,
    /// `O`
    Ok,
    /// `I`, shown as [`Level::Neutral`] once classification is done.
    Info,
    /// `.`, a context line, no rule matched.
    #[default]
    Neutral,
}

impl Level {
    /// The single-letter protocol code.
    pub const fn letter(&self) -> char {
        match self {
            Level::Critical => 'C',
            Level::Warning => 'W',
            Level::Ok => 'O',
            Level::Info => 'I',
            Level::Neutral => '.',
        }
    }

    /// Parse a single-letter protocol code.
    pub fn from_letter(letter: &str) -> Result<Level> {
        match letter {
            "C" => Ok(Level::Critical),
            "W" => Ok(Level::Warning),
            "O" => Ok(Level::Ok),
            "I" => Ok(Level::Info),
            "." => Ok(Level::Neutral),
            _ => Err(Error::new(ErrorKind::InvalidData, format!("Invalid level {:?}", letter))),
        }
    }

    /// Rank of a matched rule of this level.
    pub const fn rank(&self) -> LevelRank {
        match self {
            Level::Critical => 2,
            Level::Warning => 1,
            Level::Ok => 0,
            Level::Info => -1,
            Level::Neutral => -1,
        }
    }

    /// Rank of this level used as the `overflow` option.
    ///
    /// `I` and `O` rank the same here.
    pub const fn overflow_rank(&self) -> LevelRank {
        match self {
            Level::Critical => 2,
            Level::Warning => 1,
            Level::Ok | Level::Info => 0,
            Level::Neutral => -1,
        }
    }

    /// The level a line is printed with. `Info` matches are printed as
    /// context lines.
    pub const fn display_level(self) -> Level {
        match self {
            Level::Info => Level::Neutral,
            level => level,
        }
    }

    /// Does a line of this level open a context window?
    pub const fn is_problem(&self) -> bool {
        matches!(self, Level::Critical | Level::Warning)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}
