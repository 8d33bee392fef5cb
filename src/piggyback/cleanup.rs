// src/piggyback/cleanup.rs

//! Housekeeping of the piggyback directories.
//!
//! Safe to run at any time, also while sources store data: files that
//! vanish are skipped, and a target directory that is refilled before it
//! can be removed is kept.

use crate::common::{Path, PathBuf};
use crate::piggyback::timesettings::PiggybackTimeSettings;
use crate::piggyback::{age_seconds, list_dir_names, list_subdir_names, mtime_of, PiggybackPaths, Seconds};
use crate::readers::helpers::is_not_found;

use std::collections::BTreeMap;
use std::io::{Error, Result};
use std::time::SystemTime;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Counts of what one [`cleanup_piggyback_files`] removed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CleanupSummary {
    pub status_files_removed: usize,
    pub payload_files_removed: usize,
    pub target_dirs_removed: usize,
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        /// Is this the error of removing a directory that is not empty?
        fn is_dir_not_empty(err: &Error) -> bool {
            use ::nix::errno::Errno;
            // POSIX allows either
            matches!(
                err.raw_os_error(),
                Some(code) if code == Errno::ENOTEMPTY as i32 || code == Errno::EEXIST as i32
            )
        }
    } else {
        /// `ERROR_DIR_NOT_EMPTY`
        const ERROR_DIR_NOT_EMPTY: i32 = 145;

        /// Is this the error of removing a directory that is not empty?
        fn is_dir_not_empty(err: &Error) -> bool {
            err.raw_os_error() == Some(ERROR_DIR_NOT_EMPTY)
        }
    }
}

/// Remove `path`. Returns `false` if it was already gone.
fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if is_not_found(&err) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Remove the empty directory `path`. Returns `false` if it is not empty
/// (anymore) or already gone.
fn remove_dir_if_empty(path: &Path) -> Result<bool> {
    match std::fs::remove_dir(path) {
        Ok(()) => Ok(true),
        Err(err) if is_not_found(&err) || is_dir_not_empty(&err) => {
            defo!("keep {:?}: {}", path, err);
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Every (target, source) pair with a payload.
fn payload_pairs(paths: &PiggybackPaths) -> Result<Vec<(String, String)>> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for target in list_subdir_names(&paths.piggyback_dir)?.into_iter() {
        for source in list_dir_names(&paths.target_dir(&target))?.into_iter() {
            pairs.push((target.clone(), source));
        }
    }

    Ok(pairs)
}

/// Remove status markers older than the greatest `max_cache_age` of their
/// source over all targets it has payloads for.
fn cleanup_source_status_files(
    paths: &PiggybackPaths,
    time_settings: &PiggybackTimeSettings,
    pairs: &[(String, String)],
    now: SystemTime,
    summary: &mut CleanupSummary,
) -> Result<()> {
    let mut targets_of_source: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (target, source) in pairs.iter() {
        targets_of_source
            .entry(source.as_str())
            .or_default()
            .push(target.as_str());
    }
    for source in list_dir_names(&paths.source_dir)?.into_iter() {
        let status_path: PathBuf = paths.status_path(&source);
        let mtime: SystemTime = match mtime_of(&status_path)? {
            Some(mtime) => mtime,
            None => continue,
        };
        let targets: &[&str] = targets_of_source
            .get(source.as_str())
            .map(|t| t.as_slice())
            .unwrap_or(&[]);
        let max_cache_age: Seconds = time_settings.max_cache_age_of_source(&source, targets);
        if age_seconds(now, mtime) > max_cache_age && remove_file_if_exists(&status_path)? {
            ::log::info!("Removed outdated status file {:?}", status_path);
            summary.status_files_removed += 1;
        }
    }

    Ok(())
}

/// Remove the payloads of `sources` for `target` that are older than both
/// their `max_cache_age` and their `validity_period`, then the target
/// directory if left empty. Payloads and directories that vanished are
/// skipped.
pub(crate) fn cleanup_target_dir(
    paths: &PiggybackPaths,
    time_settings: &PiggybackTimeSettings,
    target: &str,
    sources: &[String],
    now: SystemTime,
    summary: &mut CleanupSummary,
) -> Result<()> {
    let target_dir: PathBuf = paths.target_dir(target);
    for source in sources.iter() {
        let payload_path: PathBuf = target_dir.join(source);
        let mtime: SystemTime = match mtime_of(&payload_path)? {
            Some(mtime) => mtime,
            None => continue,
        };
        let age: Seconds = age_seconds(now, mtime);
        let max_cache_age: Seconds = time_settings.max_cache_age(source, target);
        let validity_period: Seconds = time_settings
            .validity_period(source, target)
            .unwrap_or(0.0);
        // abandoned but still valid payloads are kept
        if age <= max_cache_age || age <= validity_period {
            continue;
        }
        if remove_file_if_exists(&payload_path)? {
            ::log::info!("Removed outdated piggyback file {:?}", payload_path);
            summary.payload_files_removed += 1;
        }
    }
    if remove_dir_if_empty(&target_dir)? {
        ::log::debug!("Removed empty directory {:?}", target_dir);
        summary.target_dirs_removed += 1;
    }

    Ok(())
}

/// Remove outdated status markers and payloads, and empty target
/// directories.
pub fn cleanup_piggyback_files(
    paths: &PiggybackPaths,
    time_settings: &PiggybackTimeSettings,
    now: SystemTime,
) -> Result<CleanupSummary> {
    defn!("({:?})", paths);
    let mut summary = CleanupSummary::default();
    let pairs = payload_pairs(paths)?;
    cleanup_source_status_files(paths, time_settings, &pairs, now, &mut summary)?;
    for target in list_subdir_names(&paths.piggyback_dir)?.into_iter() {
        let sources: Vec<String> = list_dir_names(&paths.target_dir(&target))?;
        cleanup_target_dir(paths, time_settings, &target, &sources, now, &mut summary)?;
    }
    defx!("{:?}", summary);

    Ok(summary)
}
