// src/common.rs
//
// common imports, type aliases, and other globals (avoids circular imports)

//! Common type aliases, protocol constants, and the [`ResultS3`] result
//! enum shared by the _lwlib_ modules.

use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// file-handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub use std::fs::File;
pub use std::path::{Path, PathBuf};

/// `F`ile `Path` as a printable `String`.
///
/// Only used for display and messages. Paths used for opening files are
/// kept as [`PathBuf`] so non-UTF-8 file names survive.
pub type FPath = String;
pub type FPaths = Vec<FPath>;
/// A byte offset into a file.
pub type FileOffset = u64;
/// A file size in bytes.
pub type FileSz = u64;
/// A file identity as persisted in the state file.
///
/// Signed so the "never seen" value [`INODE_UNSEEN`] fits.
pub type Inode = i64;
/// General purpose counter.
pub type Count = u64;

/// Persisted inode value of a file that was never seen before.
pub const INODE_UNSEEN: Inode = -1;

/// Inode value used on platforms or filesystems without stable inodes.
///
/// Every file then has the same identity, which disables rotation detection.
pub const INODE_SENTINEL: Inode = 1;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// output protocol
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// First line of the whole payload.
pub const SECTION_HEADER: &str = "<<<logwatch>>>";

/// Prefix of a protocol line reporting a broken configuration. The check
/// plugin on the monitoring server looks for this exact text.
pub const CONFIG_ERROR_PREFIX: &str = "CANNOT READ CONFIG FILE: ";

/// Prefix of a protocol line reporting an invalid option token.
pub const INVALID_CONFIG_PREFIX: &str = "INVALID CONFIGURATION: ";

/// Separator joining a primary line and its continuation lines.
pub const CONT_SEP: char = '\x01';

/// Display replacement for [`CONT_SEP`] on a terminal.
pub const CONT_SEP_DISPLAY: &str = "\nCONT:";

/// Appended to lines cut by option `maxlinesize`.
pub const TRUNCATED_MARKER: &str = "[TRUNCATED]";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// custom Results enums for *Reader functions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `Result` Extended
/// for line reading functions
#[derive(Debug, PartialEq)]
pub enum ResultS3<T, E> {
    /// Contains the success data
    Found(T),
    /// No more data, but no bad errors happened
    Done,
    /// Contains the error value, something bad happened
    Err(E),
}

impl<T, E> ResultS3<T, E> {
    /// Returns `true` if the result is [`Found`, 'Done`].
    #[allow(dead_code)]
    #[must_use = "if you intended to assert that this is ok, consider `.unwrap()` instead"]
    #[inline(always)]
    pub const fn is_ok(&self) -> bool {
        matches!(*self, ResultS3::Found(_) | ResultS3::Done)
    }

    /// Returns `true` if the result is [`Err`].
    #[allow(dead_code)]
    #[inline(always)]
    pub const fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Returns `true` if the result is [`Found`].
    #[inline(always)]
    pub const fn is_found(&self) -> bool {
        matches!(*self, ResultS3::Found(_))
    }

    /// Returns `true` if the result is [`Done`].
    #[inline(always)]
    pub const fn is_done(&self) -> bool {
        matches!(*self, ResultS3::Done)
    }

    /// Converts from `ResultS3<T, E>` to [`Option<T>`], discarding the
    /// error, if any.
    #[inline(always)]
    pub fn ok(self) -> Option<T> {
        match self {
            ResultS3::Found(x) => Some(x),
            ResultS3::Done => None,
            ResultS3::Err(_) => None,
        }
    }

    /// Converts from `ResultS3<T, E>` to `Result<Option<T>, E>` so callers
    /// may use `?`.
    #[inline(always)]
    pub fn transpose(self) -> Result<Option<T>, E> {
        match self {
            ResultS3::Found(x) => Ok(Some(x)),
            ResultS3::Done => Ok(None),
            ResultS3::Err(err) => Err(err),
        }
    }
}

impl<T, E> fmt::Display for ResultS3<T, E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultS3::Found(_) => write!(f, "ResultS3::Found"),
            ResultS3::Done => write!(f, "ResultS3::Done"),
            ResultS3::Err(err) => write!(f, "ResultS3::Err({})", err),
        }
    }
}
