// src/state/mod.rs

//! Persistent scan state of _lwlib_.
//!
//! For every monitored file the [`StateStore`] remembers the byte offset
//! up to which the file was scanned, and the inode it had, so the next run
//! resumes where the last one ended and notices rotated files.
//!
//! [`StateStore`]: crate::state::statestore::StateStore

pub mod statestore;
