// src/readers/helpers.rs

//! Miscellaneous helper functions for _Readers_.

use std;
use std::ffi::OsStr;
use std::io::{Error, ErrorKind};

use crate::common::{
    FPath,
    Inode,
    INODE_SENTINEL,
};

/// Helper function for a slightly annoying set of calls.
pub fn path_to_fpath(path: &std::path::Path) -> FPath {
    // `PathBuf` to `String` https://stackoverflow.com/q/37388107/471376
    (*(path.to_string_lossy())).to_string()
}

/// Does the platform hand out inode numbers that stay stable for the life
/// of a file?
///
/// Only trusted on Linux. Elsewhere every file is given
/// [`INODE_SENTINEL`], which disables log rotation detection.
pub const fn is_inode_capable() -> bool {
    cfg!(target_os = "linux")
}

/// Is this the error of a file or directory that does not exist (anymore)?
#[inline(always)]
pub fn is_not_found(err: &Error) -> bool {
    err.kind() == ErrorKind::NotFound
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        use std::os::unix::ffi::OsStrExt;
        use std::os::unix::fs::MetadataExt;

        /// Return the file identity used for rotation detection.
        pub fn metadata_inode(metadata: &std::fs::Metadata) -> Inode {
            if is_inode_capable() {
                // inode numbers beyond `i64::MAX` do not occur on Linux filesystems
                return metadata.ino() as Inode;
            }
            INODE_SENTINEL
        }

        /// Raw bytes of an `OsStr`, for persisting file names that may not
        /// be UTF-8.
        pub fn os_str_to_bytes(s: &OsStr) -> Vec<u8> {
            s.as_bytes().to_vec()
        }
    } else {
        /// Return the file identity used for rotation detection.
        pub fn metadata_inode(_metadata: &std::fs::Metadata) -> Inode {
            INODE_SENTINEL
        }

        /// Bytes of an `OsStr`, lossy where the name is not valid Unicode.
        pub fn os_str_to_bytes(s: &OsStr) -> Vec<u8> {
            s.to_string_lossy().as_bytes().to_vec()
        }
    }
}
