// src/tests/statestore_tests.rs

//! tests for `statestore.rs`

use ::test_case::test_case;

use crate::common::{Path, INODE_UNSEEN};
use crate::debug::helpers::{create_file_in_dir, create_temp_dir};
use crate::state::statestore::{FileScanState, StateStore};

#[test_case(
    "{'file': b'/var/log/messages', 'offset': 7767698, 'inode': 32455445}",
    b"/var/log/messages", Some(7767698), 32455445;
    "current"
)]
#[test_case(
    "{'file': '/var/log/messages', 'offset': 12, 'inode': -1}",
    b"/var/log/messages", Some(12), -1;
    "current str name"
)]
#[test_case(
    "{'file': b'/var/log/\\xc3\\xa4', 'offset': 3, 'inode': 7}",
    b"/var/log/\xc3\xa4", Some(3), 7;
    "current escaped bytes"
)]
#[test_case("/var/log/messages|7767698|32455445", b"/var/log/messages", Some(7767698), 32455445; "legacy")]
#[test_case("/var/log/messages|7767698", b"/var/log/messages", Some(7767698), INODE_UNSEEN; "legacy no inode")]
fn test_from_line(
    line: &str,
    file: &[u8],
    offset: Option<u64>,
    inode: i64,
) {
    let state = FileScanState::from_line(line).unwrap();
    assert_eq!(state.file, file);
    assert_eq!(state.offset, offset);
    assert_eq!(state.inode, inode);
}

#[test_case("garbage"; "no separator")]
#[test_case("/var/log/x|notanumber"; "legacy bad offset")]
#[test_case("{'offset': 3, 'inode': 7}"; "missing file")]
#[test_case("{'file': b'/x', 'offset': -3, 'inode': 7}"; "negative offset")]
fn test_from_line_err(line: &str) {
    assert!(FileScanState::from_line(line).is_err());
}

#[test]
fn test_to_line() {
    let mut state = FileScanState::new(b"/var/log/messages".to_vec());
    assert_eq!(state.to_line(), "{'file': b'/var/log/messages', 'inode': -1}");
    state.offset = Some(42);
    state.inode = 1234;
    assert_eq!(state.to_line(), "{'file': b'/var/log/messages', 'offset': 42, 'inode': 1234}");
    assert_eq!(FileScanState::from_line(&state.to_line()).unwrap(), state);
}

#[test]
fn test_read_missing_file() {
    let dir = create_temp_dir();
    let mut store = StateStore::new(dir.path().join("logwatch.state"));
    store.read().unwrap();
    assert!(store.is_empty());
}

#[cfg(unix)]
#[test]
fn test_write_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = create_temp_dir();
    // a plainly created file shows the umask
    let plain = create_file_in_dir(dir.path(), "plain", b"");
    let plain_mode = std::fs::metadata(&plain).unwrap().permissions().mode() & 0o777;

    let path = dir.path().join("logwatch.state");
    let mut store = StateStore::new(path.clone());
    store.get(Path::new("/var/log/messages")).offset = Some(1);
    store.write().unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, plain_mode & 0o644, "mode {:o}", mode);
    assert_eq!(mode & 0o600, 0o600, "mode {:o}", mode);
}

#[test]
fn test_read_write() {
    let dir = create_temp_dir();
    let path = create_file_in_dir(
        dir.path(),
        "logwatch.state",
        b"/var/log/legacy|10|20\n\n{'file': b'/var/log/current', 'offset': 30, 'inode': 40}\n",
    );
    let mut store = StateStore::new(path.clone());
    store.read().unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(Path::new("/var/log/legacy")).offset, Some(10));
    assert_eq!(store.get(Path::new("/var/log/current")).inode, 40);

    // never scanned, not written
    let fresh = store.get(Path::new("/var/log/fresh"));
    assert_eq!(fresh.offset, None);
    assert_eq!(fresh.inode, INODE_UNSEEN);
    assert_eq!(store.len(), 3);

    store.get(Path::new("/var/log/current")).offset = Some(31);
    store.write().unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "{'file': b'/var/log/current', 'offset': 31, 'inode': 40}\n\
         {'file': b'/var/log/legacy', 'offset': 10, 'inode': 20}\n"
    );

    let mut reread = StateStore::new(path);
    reread.read().unwrap();
    assert_eq!(reread.len(), 2);
    assert_eq!(reread.iter().cloned().collect::<Vec<_>>(), store.iter().filter(|s| s.offset.is_some()).cloned().collect::<Vec<_>>());
}

#[test]
fn test_read_corrupted_keeps_previous() {
    let dir = create_temp_dir();
    let path = create_file_in_dir(dir.path(), "logwatch.state", b"/var/log/a|1|2\ncorrupted\n/var/log/b|3|4\n");
    let mut store = StateStore::new(path);
    assert!(store.read().is_err());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_read_deeply_nested_is_corrupted() {
    let dir = create_temp_dir();
    let line = format!("{{'file': {}\n", "[".repeat(100_000));
    let path = create_file_in_dir(dir.path(), "logwatch.state", line.as_bytes());
    let mut store = StateStore::new(path);
    assert!(store.read().is_err());
    assert!(store.is_empty());
}
