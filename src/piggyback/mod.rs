// src/piggyback/mod.rs

//! Piggyback data relayed between monitored hosts.
//!
//! A _source_ host's agent output may contain sections about other,
//! _piggybacked_ (target) hosts:
//!
//! ```text
//! <<<<target1>>>>
//! <<<local>>>
//! 0 service - OK
//! <<<<>>>>
//! ```
//!
//! Those sections are stored per (target, source) pair and read back when
//! the target is checked. On disk:
//!
//! ```text
//! <piggyback_dir>/<target>/<source>   payload of one source for one target
//! <source_dir>/<source>               status marker of one source
//! ```
//!
//! The modification time of the status marker is the time of the last
//! store by the source. A payload older than its source's status marker was
//! not part of that store, and is _abandoned_.
//!
//! Another process may store or clean up at the same time. Files and
//! directories that vanish while being listed or read count as absent.

pub mod cleanup;
pub mod reader;
pub mod timesettings;
pub mod writer;

use crate::common::{Path, PathBuf};
use crate::readers::helpers::is_not_found;

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{Error, ErrorKind, Result};
use std::time::SystemTime;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Seconds, possibly fractional, possibly negative for times in the future.
pub type Seconds = f64;

/// The piggyback directories.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PiggybackPaths {
    /// holds one directory per target host
    pub piggyback_dir: PathBuf,
    /// holds one status marker per source host
    pub source_dir: PathBuf,
}

impl PiggybackPaths {
    pub fn new(
        piggyback_dir: PathBuf,
        source_dir: PathBuf,
    ) -> PiggybackPaths {
        PiggybackPaths {
            piggyback_dir,
            source_dir,
        }
    }

    /// The default directories below a site root `omd_root`, or below the
    /// current directory without one.
    pub fn from_omd_root(omd_root: Option<OsString>) -> PiggybackPaths {
        match omd_root {
            Some(root) if !root.is_empty() => {
                let tmp_dir = PathBuf::from(root).join("tmp").join("check_mk");
                PiggybackPaths::new(tmp_dir.join("piggyback"), tmp_dir.join("piggyback_sources"))
            }
            _ => PiggybackPaths::new(PathBuf::from("piggyback"), PathBuf::from("piggyback_sources")),
        }
    }

    pub fn target_dir(
        &self,
        target: &str,
    ) -> PathBuf {
        self.piggyback_dir.join(target)
    }

    pub fn payload_path(
        &self,
        target: &str,
        source: &str,
    ) -> PathBuf {
        self.target_dir(target).join(source)
    }

    pub fn status_path(
        &self,
        source: &str,
    ) -> PathBuf {
        self.source_dir.join(source)
    }
}

/// Names starting with `.` are temporary files of a store in progress.
#[inline(always)]
pub fn is_temporary_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Names of the entries of `dir`, sorted, without temporary files.
///
/// A missing `dir` has no entries. Entries with non-UTF-8 names are
/// skipped, host names are always UTF-8.
pub fn list_dir_names(dir: &Path) -> Result<Vec<String>> {
    list_names(dir, false)
}

/// Like [`list_dir_names`], only the subdirectories.
pub fn list_subdir_names(dir: &Path) -> Result<Vec<String>> {
    list_names(dir, true)
}

fn list_names(
    dir: &Path,
    dirs_only: bool,
) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if is_not_found(&err) => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let mut names: Vec<String> = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if is_not_found(&err) => continue,
            Err(err) => return Err(err),
        };
        let name: String = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_name) => {
                defo!("skip non-UTF-8 name {:?}", _name);
                continue;
            }
        };
        if is_temporary_name(&name) {
            continue;
        }
        if dirs_only {
            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => {}
                Ok(_) => continue,
                Err(err) if is_not_found(&err) => continue,
                Err(err) => return Err(err),
            }
        }
        names.push(name);
    }
    names.sort();

    Ok(names)
}

/// Modification time of `path`, `None` if it does not exist (anymore).
pub fn mtime_of(path: &Path) -> Result<Option<SystemTime>> {
    match std::fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata.modified()?)),
        Err(err) if is_not_found(&err) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Seconds from `then` to `now`; negative if `then` is after `now`.
pub fn age_seconds(
    now: SystemTime,
    then: SystemTime,
) -> Seconds {
    match now.duration_since(then) {
        Ok(duration) => duration.as_secs_f64(),
        Err(err) => -err.duration().as_secs_f64(),
    }
}

/// Render a number of seconds as a short human readable time span, e.g.
/// `2 h 5 m` or `45 s`.
pub fn render_timespan(seconds: Seconds) -> String {
    let secs: i64 = seconds.round() as i64;
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.abs();
    let (days, hours, minutes, seconds) = (secs / 86_400, secs % 86_400 / 3_600, secs % 3_600 / 60, secs % 60);
    if days > 0 {
        format!("{}{} d {} h", sign, days, hours)
    } else if hours > 0 {
        format!("{}{} h {} m", sign, hours, minutes)
    } else if minutes > 0 {
        format!("{}{} m {} s", sign, minutes, seconds)
    } else {
        format!("{}{} s", sign, seconds)
    }
}

/// Is `name` usable as a single file name below the piggyback
/// directories? Only host name characters `A-Za-z0-9._-`, not starting
/// with `.`.
pub fn is_valid_hostname(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

/// `Err` of kind `InvalidInput` unless [`is_valid_hostname`].
pub fn check_hostname(name: &str) -> Result<()> {
    if is_valid_hostname(name) {
        return Ok(());
    }

    Err(Error::new(ErrorKind::InvalidInput, format!("invalid host name {:?}", name)))
}

/// Replace every character of `name` that is not a host name character
/// with `_`, and a leading `.` too. `None` for an empty `name`.
pub fn sanitize_hostname(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let mut sanitized: String = name
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.starts_with('.') {
        sanitized.replace_range(..1, "_");
    }
    debug_assert!(is_valid_hostname(&sanitized), "{:?}", sanitized);

    Some(sanitized)
}

/// Payload lines of each target host, in agent output order.
pub type PiggybackSections = BTreeMap<String, Vec<Vec<u8>>>;

/// Collect the piggybacked sections of the agent output `data`.
///
/// `<<<<host>>>>` starts lines for `host`, `<<<<>>>>` ends them. Lines
/// outside such sections belong to the source itself and are dropped.
/// Several sections for the same host are concatenated. Host names are
/// passed through [`sanitize_hostname`].
pub fn parse_piggyback_sections(data: &[u8]) -> PiggybackSections {
    let mut sections = PiggybackSections::new();
    let mut current: Option<String> = None;
    for raw_line in data.split_inclusive(|b| *b == b'\n') {
        let line: &[u8] = raw_line.strip_suffix(b"\n").unwrap_or(raw_line);
        let line: &[u8] = line.strip_suffix(b"\r").unwrap_or(line);
        if line.starts_with(b"<<<<") && line.ends_with(b">>>>") && line.len() >= 8 {
            let host = String::from_utf8_lossy(&line[4..line.len() - 4]);
            current = sanitize_hostname(host.trim());
            defo!("piggyback header {:?}", current);
            continue;
        }
        if let Some(host) = current.as_ref() {
            sections
                .entry(host.clone())
                .or_default()
                .push(line.to_vec());
        }
    }

    sections
}
