// src/config/options.rs

//! [`Options`] of a logfile block, set by `key=value` tokens in the block's
//! header line.
//!
//! Only explicitly set values are stored. Merging the options of several
//! blocks that match the same file overrides value by value, the later
//! block winning, see [`Options::update`].

use crate::data::level::{Level, LevelRank};
use crate::data::literal::repr_str;

use std::io::{Error, ErrorKind, Result};

use ::encoding_rs::Encoding;
use ::regex::{Regex, RegexBuilder};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Default of option `maxoutputsize`, in bytes.
pub const MAXOUTPUTSIZE_DEFAULT: usize = 500_000;

/// Default of option `overflow`.
pub const OVERFLOW_DEFAULT: Level = Level::Critical;

/// Case-insensitive boolean words accepted by the boolean options.
const MAP_BOOL: [(&str, bool); 6] = [
    ("true", true),
    ("false", false),
    ("1", true),
    ("0", false),
    ("yes", true),
    ("no", false),
];

/// Options w.r.t. logfile patterns (not w.r.t. cluster mapping).
#[derive(Clone, Debug, Default)]
pub struct Options {
    encoding: Option<String>,
    maxfilesize: Option<u64>,
    maxlines: Option<u64>,
    maxtime: Option<f64>,
    maxlinesize: Option<usize>,
    regex: Option<Regex>,
    overflow: Option<Level>,
    nocontext: Option<bool>,
    maxcontextlines: Option<(usize, usize)>,
    maxoutputsize: Option<usize>,
    fromstart: Option<bool>,
    skipconsecutiveduplicated: Option<bool>,
}

impl Options {
    pub fn new() -> Options {
        Options::default()
    }

    /// Encoding override, a label accepted by [`encoding_for_label`].
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Emit a warning each time the file grows past another multiple of
    /// this many bytes. Zero disables the warning.
    pub fn maxfilesize(&self) -> Option<u64> {
        self.maxfilesize
    }

    pub fn maxlines(&self) -> Option<u64> {
        self.maxlines
    }

    /// Seconds.
    pub fn maxtime(&self) -> Option<f64> {
        self.maxtime
    }

    /// In characters.
    pub fn maxlinesize(&self) -> Option<usize> {
        self.maxlinesize
    }

    /// Filter on the display name of matched files.
    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    pub fn overflow(&self) -> Level {
        self.overflow.unwrap_or(OVERFLOW_DEFAULT)
    }

    /// Rank recorded as worst severity when a resource limit trips.
    pub fn overflow_level(&self) -> LevelRank {
        self.overflow().overflow_rank()
    }

    pub fn nocontext(&self) -> bool {
        self.nocontext.unwrap_or(false)
    }

    /// `(before, after)` lines around each `C`/`W` line.
    pub fn maxcontextlines(&self) -> Option<(usize, usize)> {
        self.maxcontextlines
    }

    pub fn maxoutputsize(&self) -> usize {
        self.maxoutputsize.unwrap_or(MAXOUTPUTSIZE_DEFAULT)
    }

    pub fn fromstart(&self) -> bool {
        self.fromstart.unwrap_or(false)
    }

    pub fn skipconsecutiveduplicated(&self) -> bool {
        self.skipconsecutiveduplicated.unwrap_or(false)
    }

    /// Override every value set in `other`.
    pub fn update(
        &mut self,
        other: &Options,
    ) {
        macro_rules! take {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field.clone();
                }
            };
        }
        take!(encoding);
        take!(maxfilesize);
        take!(maxlines);
        take!(maxtime);
        take!(maxlinesize);
        take!(regex);
        take!(overflow);
        take!(nocontext);
        take!(maxcontextlines);
        take!(maxoutputsize);
        take!(fromstart);
        take!(skipconsecutiveduplicated);
    }

    /// Parse and set one `key=value` token.
    ///
    /// The returned error message is meant to follow
    /// [`INVALID_CONFIG_PREFIX`] in the output.
    ///
    /// [`INVALID_CONFIG_PREFIX`]: crate::common::INVALID_CONFIG_PREFIX
    pub fn set_opt(
        &mut self,
        opt_str: &str,
    ) -> Result<()> {
        defn!("({:?})", opt_str);
        let (key, value) = match opt_str.split_once('=') {
            Some(kv) => kv,
            None => return Err(invalid(format!("Invalid option: {}", repr_str(opt_str)))),
        };
        match key {
            "encoding" => {
                if encoding_for_label(value).is_none() {
                    return Err(invalid(format!("unknown encoding: {}", value)));
                }
                self.encoding = Some(value.to_string());
            }
            "maxlines" => self.maxlines = Some(parse_int::<u64>(key, value)?),
            "maxlinesize" => self.maxlinesize = Some(parse_int::<usize>(key, value)?),
            "maxfilesize" => self.maxfilesize = Some(parse_int::<u64>(key, value)?),
            "maxoutputsize" => self.maxoutputsize = Some(parse_int::<usize>(key, value)?),
            "maxtime" => {
                self.maxtime = match value.trim().parse::<f64>() {
                    Ok(f) => Some(f),
                    Err(_) => return Err(invalid(format!("Invalid {}: {} (not a number)", key, repr_str(value)))),
                }
            }
            "overflow" => {
                let level = match value {
                    "C" | "W" | "I" | "O" => Level::from_letter(value)?,
                    _ => {
                        return Err(invalid(format!(
                            "Invalid overflow: {} (choose from 'C', 'W', 'I', 'O')",
                            repr_str(value)
                        )))
                    }
                };
                self.overflow = Some(level);
            }
            "regex" | "iregex" => {
                let regex = RegexBuilder::new(value)
                    .case_insensitive(key == "iregex")
                    .build()
                    .map_err(|err| invalid(format!("Invalid {}: {}", key, err)))?;
                self.regex = Some(regex);
            }
            "nocontext" | "fromstart" | "skipconsecutiveduplicated" => {
                let lower = value.to_lowercase();
                let b = match MAP_BOOL.iter().find(|(word, _)| *word == lower) {
                    Some((_, b)) => *b,
                    None => {
                        return Err(invalid(format!(
                            "Invalid {}: {} (choose from 'true', 'false', '1', '0', 'yes', 'no')",
                            key,
                            repr_str(value)
                        )))
                    }
                };
                match key {
                    "nocontext" => self.nocontext = Some(b),
                    "fromstart" => self.fromstart = Some(b),
                    _ => self.skipconsecutiveduplicated = Some(b),
                }
            }
            "maxcontextlines" => {
                let (before, after) = match value.split_once(',') {
                    Some(ba) => ba,
                    None => {
                        return Err(invalid(format!(
                            "Invalid maxcontextlines: {} (expected 'before,after')",
                            repr_str(value)
                        )))
                    }
                };
                self.maxcontextlines = Some((parse_int::<usize>(key, before)?, parse_int::<usize>(key, after)?));
            }
            _ => return Err(invalid(format!("Invalid option: {}", repr_str(opt_str)))),
        }
        defx!();

        Ok(())
    }
}

fn invalid(msg: String) -> Error {
    Error::new(ErrorKind::InvalidInput, msg)
}

fn parse_int<T: std::str::FromStr>(
    key: &str,
    value: &str,
) -> Result<T> {
    match value.trim().parse::<T>() {
        Ok(i) => Ok(i),
        Err(_) => Err(invalid(format!("Invalid {}: {} (not a non-negative integer)", key, repr_str(value)))),
    }
}

/// Look up an encoding by label. Besides the WHATWG labels, spellings
/// with `_` in place of `-` (e.g. `utf_16`) and without separators
/// (e.g. `latin_1` as `latin1`) are accepted.
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    let label = label.trim();
    if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
        return Some(encoding);
    }
    let dashed: String = label.replace('_', "-");
    if let Some(encoding) = Encoding::for_label(dashed.as_bytes()) {
        return Some(encoding);
    }
    let joined: String = label.chars().filter(|c| *c != '_' && *c != '-').collect();

    Encoding::for_label(joined.as_bytes())
}
