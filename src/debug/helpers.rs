// src/debug/helpers.rs

//! Miscellaneous helper functions for testing.

use crate::common::{FPath, Path, PathBuf};

use crate::readers::helpers::path_to_fpath;

use std::fs::File;
use std::io::Write; // for `NamedTempFile.write_all`
use std::time::{Duration, SystemTime};

extern crate filetime;
use filetime::FileTime;

extern crate lazy_static;
use lazy_static::lazy_static;

extern crate si_trace_print;
use si_trace_print::dpfñ;

extern crate tempfile;

#[doc(hidden)]
pub use tempfile::NamedTempFile;
#[doc(hidden)]
pub use tempfile::TempDir;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// temporary file helper functions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// NamedTempFile instances default to this file name prefix.
pub const STR_TEMPFILE_PREFIX: &str = "tmp-lw-test-";

lazy_static! {
    pub static ref STRING_TEMPFILE_PREFIX: String = String::from(STR_TEMPFILE_PREFIX);
}

/// Small helper function for copying `NamedTempFile` path to a `FPath`.
pub fn ntf_fpath(ntf: &NamedTempFile) -> FPath {
    path_to_fpath(ntf.path())
}

/// Testing helper function to write a `[u8]` to a temporary file.
pub fn create_temp_file_bytes(data: &[u8]) -> NamedTempFile {
    let mut ntf = match tempfile::Builder::new()
        // use known prefix for easier cleanup
        .prefix::<str>(&STRING_TEMPFILE_PREFIX)
        .tempfile()
    {
        Ok(val) => val,
        Err(err) => {
            panic!("NamedTempFile::new() return Err {}", err);
        }
    };
    match ntf.write_all(data) {
        Ok(_) => {}
        Err(err) => {
            panic!("NamedTempFile::write_all() return Err {}", err);
        }
    }

    ntf
}

/// Testing helper function to write a `str` to a temporary file.
pub fn create_temp_file(data: &str) -> NamedTempFile {
    create_temp_file_bytes(data.as_bytes())
}

/// Create a temporary directory
pub fn create_temp_dir() -> TempDir {
    dpfñ!();
    tempfile::Builder::new()
        .prefix::<str>(&STRING_TEMPFILE_PREFIX)
        .tempdir()
        .unwrap()
}

/// Testing helper function to write `data` to file `name` within `dir`,
/// creating leading directories as needed. Returns the full path.
pub fn create_file_in_dir(
    dir: &Path,
    name: &str,
    data: &[u8],
) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file_ = match File::create(&path) {
        Ok(f) => f,
        Err(err) => panic!("File::create({:?}) Error {:?}", path, err),
    };
    file_.write_all(data).unwrap();

    path
}

/// Testing helper function to append `data` to existing file `path`.
pub fn append_to_file(
    path: &Path,
    data: &[u8],
) {
    let mut file_ = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .unwrap();
    file_.write_all(data).unwrap();
}

/// Testing helper to set the modification time of `path` to `secs_ago`
/// seconds before `now`.
pub fn set_mtime_ago(
    path: &Path,
    now: SystemTime,
    secs_ago: u64,
) {
    let then = now - Duration::from_secs(secs_ago);
    let ft = FileTime::from_system_time(then);
    filetime::set_file_times(path, ft, ft).unwrap();
}
