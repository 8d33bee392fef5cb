// src/piggyback/reader.rs

//! Read piggyback payloads, judging each by age and by its source's status
//! marker.
//!
//! The judgement of a payload is re-done on every read; nothing about it is
//! persisted.

use crate::common::{Path, PathBuf};
use crate::piggyback::timesettings::PiggybackTimeSettings;
use crate::piggyback::{
    age_seconds,
    check_hostname,
    list_dir_names,
    list_subdir_names,
    mtime_of,
    render_timespan,
    PiggybackPaths,
    Seconds,
};
use crate::readers::helpers::is_not_found;

use std::fmt;
use std::io::Result;
use std::time::SystemTime;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Judgement of one payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PiggybackFileState {
    /// part of the last store of its source, and not too old
    Fresh,
    /// older than `max_cache_age`
    Expired,
    /// not part of the last store of its source, but within
    /// `validity_period`
    StillValidButAbandoned,
    /// not part of the last store of its source, and past
    /// `validity_period` (or none is configured)
    AbandonedAndExpired,
}

impl PiggybackFileState {
    pub const fn is_valid(&self) -> bool {
        matches!(self, PiggybackFileState::Fresh | PiggybackFileState::StillValidButAbandoned)
    }
}

/// A payload file and its judgement.
#[derive(Clone, Debug, PartialEq)]
pub struct PiggybackFileInfo {
    pub source: String,
    pub target: String,
    pub file_path: PathBuf,
    pub state: PiggybackFileState,
    /// may the payload be used?
    pub valid: bool,
    pub message: String,
    /// the configured `validity_state` while abandoned but valid, else 0
    pub status: i64,
}

impl fmt::Display for PiggybackFileInfo {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "{} → {}: {} ({})", self.source, self.target, self.message, self.status)
    }
}

/// A judged payload with its content.
#[derive(Clone, Debug, PartialEq)]
pub struct PiggybackRawData {
    pub info: PiggybackFileInfo,
    pub raw_data: Vec<u8>,
}

/// Is the payload with modification time `payload_mtime` left over from an
/// earlier store? A missing status marker means the source stopped
/// storing altogether.
pub fn is_abandoned(
    payload_mtime: SystemTime,
    status_mtime: Option<SystemTime>,
) -> bool {
    match status_mtime {
        Some(status_mtime) => status_mtime > payload_mtime,
        None => true,
    }
}

/// Judge a payload of `source` for `target`.
///
/// `age` is the age of the payload in seconds.
pub fn judge_payload(
    time_settings: &PiggybackTimeSettings,
    source: &str,
    target: &str,
    age: Seconds,
    abandoned: bool,
) -> (PiggybackFileState, String, i64) {
    let max_cache_age: Seconds = time_settings.max_cache_age(source, target);
    if age > max_cache_age {
        return (
            PiggybackFileState::Expired,
            format!("Piggyback file too old: {}", render_timespan(age - max_cache_age)),
            0,
        );
    }
    if !abandoned {
        return (
            PiggybackFileState::Fresh,
            format!("Successfully processed from source '{}'", source),
            0,
        );
    }
    match time_settings.validity_period(source, target) {
        Some(validity_period) if age < validity_period => (
            PiggybackFileState::StillValidButAbandoned,
            format!(
                "Piggyback data not updated by source '{}' (still valid, {} left)",
                source,
                render_timespan(validity_period - age),
            ),
            time_settings.validity_state(source, target),
        ),
        _ => (
            PiggybackFileState::AbandonedAndExpired,
            format!("Piggyback data not updated by source '{}'", source),
            0,
        ),
    }
}

/// Judge the payload file `file_path` of `source` for `target`. `None` if
/// it vanished.
fn payload_file_info(
    paths: &PiggybackPaths,
    time_settings: &PiggybackTimeSettings,
    source: &str,
    target: &str,
    file_path: PathBuf,
    now: SystemTime,
) -> Result<Option<PiggybackFileInfo>> {
    let payload_mtime: SystemTime = match mtime_of(&file_path)? {
        Some(mtime) => mtime,
        None => return Ok(None),
    };
    let status_mtime: Option<SystemTime> = mtime_of(&paths.status_path(source))?;
    let abandoned = is_abandoned(payload_mtime, status_mtime);
    let age: Seconds = age_seconds(now, payload_mtime);
    let (state, message, status) = judge_payload(time_settings, source, target, age, abandoned);
    defo!("{} → {}: age {:.1}, abandoned {}, {:?}", source, target, age, abandoned, state);

    Ok(Some(PiggybackFileInfo {
        source: source.to_string(),
        target: target.to_string(),
        file_path,
        valid: state.is_valid(),
        state,
        message,
        status,
    }))
}

/// Judge every payload stored for `target`, sorted by source.
pub fn get_piggyback_files(
    paths: &PiggybackPaths,
    time_settings: &PiggybackTimeSettings,
    target: &str,
    now: SystemTime,
) -> Result<Vec<PiggybackFileInfo>> {
    defn!("({:?})", target);
    check_hostname(target)?;
    let sources: Vec<String> = list_dir_names(&paths.target_dir(target))?;
    let infos = judge_piggyback_files(paths, time_settings, target, &sources, now)?;
    defx!("{} files", infos.len());

    Ok(infos)
}

/// Judge the payloads of `sources` for `target`. Payloads that do not
/// exist (anymore) are skipped.
pub(crate) fn judge_piggyback_files(
    paths: &PiggybackPaths,
    time_settings: &PiggybackTimeSettings,
    target: &str,
    sources: &[String],
    now: SystemTime,
) -> Result<Vec<PiggybackFileInfo>> {
    let target_dir: PathBuf = paths.target_dir(target);
    let mut infos: Vec<PiggybackFileInfo> = Vec::with_capacity(sources.len());
    for source in sources.iter() {
        let file_path = target_dir.join(source);
        if let Some(info) = payload_file_info(paths, time_settings, source, target, file_path, now)? {
            infos.push(info);
        }
    }

    Ok(infos)
}

/// Read `path`, `None` if it vanished.
fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(err) if is_not_found(&err) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Read the payloads of `infos`. Payloads removed since they were judged
/// are skipped.
pub(crate) fn read_piggyback_files(infos: Vec<PiggybackFileInfo>) -> Result<Vec<PiggybackRawData>> {
    let mut raw_datas: Vec<PiggybackRawData> = Vec::with_capacity(infos.len());
    for info in infos.into_iter() {
        let raw_data: Vec<u8> = match read_if_exists(&info.file_path)? {
            Some(data) => data,
            None => {
                defo!("vanished {:?}", info.file_path);
                continue;
            }
        };
        ::log::debug!("Piggyback data {}", info);
        raw_datas.push(PiggybackRawData { info, raw_data });
    }

    Ok(raw_datas)
}

/// Read every payload stored for `target`, valid or not.
///
/// Invalid payloads are returned too, so the caller may report why data
/// of a source is missing.
pub fn get_piggyback_raw_data(
    paths: &PiggybackPaths,
    time_settings: &PiggybackTimeSettings,
    target: &str,
    now: SystemTime,
) -> Result<Vec<PiggybackRawData>> {
    read_piggyback_files(get_piggyback_files(paths, time_settings, target, now)?)
}

/// Is there a valid payload for `target`?
pub fn has_piggyback_raw_data(
    paths: &PiggybackPaths,
    time_settings: &PiggybackTimeSettings,
    target: &str,
    now: SystemTime,
) -> Result<bool> {
    Ok(get_piggyback_files(paths, time_settings, target, now)?
        .iter()
        .any(|info| info.valid))
}

/// Source hosts with a payload for `target`, or with a payload for any
/// target. Sorted, without duplicates.
pub fn get_source_hostnames(
    paths: &PiggybackPaths,
    target: Option<&str>,
) -> Result<Vec<String>> {
    let targets: Vec<String> = match target {
        Some(target) => {
            check_hostname(target)?;
            vec![target.to_string()]
        }
        None => list_subdir_names(&paths.piggyback_dir)?,
    };
    let mut sources: Vec<String> = Vec::new();
    for target in targets.iter() {
        sources.extend(list_dir_names(&paths.target_dir(target))?);
    }
    sources.sort();
    sources.dedup();

    Ok(sources)
}

/// Target hosts with a payload from `source`, or with any payload. Sorted.
pub fn get_piggybacked_hostnames(
    paths: &PiggybackPaths,
    source: Option<&str>,
) -> Result<Vec<String>> {
    if let Some(source) = source {
        check_hostname(source)?;
    }
    let mut targets: Vec<String> = Vec::new();
    for target in list_subdir_names(&paths.piggyback_dir)?.into_iter() {
        let target_dir = paths.target_dir(&target);
        let keep: bool = match source {
            Some(source) => mtime_of(&target_dir.join(source))?.is_some(),
            None => !list_dir_names(&target_dir)?.is_empty(),
        };
        if keep {
            targets.push(target);
        }
    }

    Ok(targets)
}
