// src/piggyback/writer.rs

//! Store piggyback payloads of one source, and maintain the source's status
//! marker.
//!
//! A store
//!
//! 1. replaces the payload file of every target in the agent output,
//! 2. creates a new status marker as a temporary file, and gives every
//!    payload just written the same timestamps,
//! 3. renames the status marker into place.
//!
//! A reader comparing a payload with the status marker therefore never
//! sees a payload of this store as older than the marker. Payloads of
//! targets missing from this store keep their older timestamps, and become
//! abandoned once the marker is in place.

use crate::common::{Path, PathBuf};
use crate::piggyback::{check_hostname, PiggybackPaths, PiggybackSections};
use crate::readers::helpers::is_not_found;

use std::io::{Result, Write};

extern crate filetime;
use filetime::FileTime;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};
use ::tempfile::{Builder, NamedTempFile};

/// A temporary file in `dir`, hidden from listings by its leading dot.
fn hidden_temp_file(
    dir: &Path,
    name: &str,
) -> Result<NamedTempFile> {
    std::fs::create_dir_all(dir)?;
    Builder::new()
        .prefix(&format!(".{}.new", name))
        .tempfile_in(dir)
}

/// Replace the payload of `source` for `target` with `lines`.
fn store_payload(
    paths: &PiggybackPaths,
    source: &str,
    target: &str,
    lines: &[Vec<u8>],
) -> Result<PathBuf> {
    let path: PathBuf = paths.payload_path(target, source);
    let mut tmp = hidden_temp_file(&paths.target_dir(target), source)?;
    for line in lines.iter() {
        tmp.write_all(line)?;
        tmp.write_all(b"\n")?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|err| err.error)?;
    defo!("stored {:?}", path);

    Ok(path)
}

/// Create the status marker of `source` with the current time, and give
/// the same timestamps to `payload_paths` before the marker becomes
/// visible.
fn store_status_file(
    paths: &PiggybackPaths,
    source: &str,
    payload_paths: &[PathBuf],
) -> Result<()> {
    let status_path: PathBuf = paths.status_path(source);
    let tmp = hidden_temp_file(&paths.source_dir, source)?;
    let now = FileTime::now();
    filetime::set_file_times(tmp.path(), now, now)?;
    // read back, the filesystem may round timestamps
    let metadata = tmp.as_file().metadata()?;
    let atime = FileTime::from_last_access_time(&metadata);
    let mtime = FileTime::from_last_modification_time(&metadata);
    for payload_path in payload_paths.iter() {
        match filetime::set_file_times(payload_path, atime, mtime) {
            Ok(()) => {}
            // removed by a concurrent cleanup
            Err(err) if is_not_found(&err) => continue,
            Err(err) => return Err(err),
        }
    }
    tmp.persist(&status_path).map_err(|err| err.error)?;
    defo!("status {:?} at {:?}", status_path, mtime);

    Ok(())
}

/// Store the piggybacked `sections` of one agent output of `source`.
///
/// With no sections at all, the status marker of `source` is removed,
/// which abandons every payload the source stored before.
///
/// Nothing is written if `source` or any target is not a valid host name.
///
/// Returns the paths of the payload files written.
pub fn store_piggyback_raw_data(
    paths: &PiggybackPaths,
    source: &str,
    sections: &PiggybackSections,
) -> Result<Vec<PathBuf>> {
    defn!("({:?}, {} targets)", source, sections.len());
    check_hostname(source)?;
    for target in sections.keys() {
        check_hostname(target)?;
    }
    let mut payload_paths: Vec<PathBuf> = Vec::with_capacity(sections.len());
    for (target, lines) in sections.iter() {
        ::log::info!("Storing piggyback data for: {}", target);
        payload_paths.push(store_payload(paths, source, target, lines)?);
    }
    if payload_paths.is_empty() {
        remove_source_status_file(paths, source)?;
    } else {
        store_status_file(paths, source, &payload_paths)?;
    }
    defx!("{} payloads", payload_paths.len());

    Ok(payload_paths)
}

/// Remove the status marker of `source`. Returns `false` if there was none.
pub fn remove_source_status_file(
    paths: &PiggybackPaths,
    source: &str,
) -> Result<bool> {
    check_hostname(source)?;
    let status_path = paths.status_path(source);
    match std::fs::remove_file(&status_path) {
        Ok(()) => {
            ::log::debug!("Removed status file {:?}", status_path);
            Ok(true)
        }
        Err(err) if is_not_found(&err) => Ok(false),
        Err(err) => Err(err),
    }
}
