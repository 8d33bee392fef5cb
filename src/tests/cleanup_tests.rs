// src/tests/cleanup_tests.rs

//! tests for `cleanup.rs`

use crate::debug::helpers::{create_file_in_dir, create_temp_dir, set_mtime_ago};
use crate::piggyback::cleanup::{cleanup_piggyback_files, cleanup_target_dir, CleanupSummary};
use crate::piggyback::timesettings::PiggybackTimeSettings;
use crate::piggyback::writer::store_piggyback_raw_data;
use crate::piggyback::{list_dir_names, PiggybackPaths, PiggybackSections};

use std::time::SystemTime;

fn store(
    paths: &PiggybackPaths,
    source: &str,
    targets: &[&str],
) {
    let sections: PiggybackSections = targets
        .iter()
        .map(|target| (target.to_string(), vec![b"<<<local>>>".to_vec()]))
        .collect();
    store_piggyback_raw_data(paths, source, &sections).unwrap();
}

#[test]
fn test_cleanup_nothing_to_do() {
    let dir = create_temp_dir();
    let paths = PiggybackPaths::new(dir.path().join("piggyback"), dir.path().join("piggyback_sources"));
    let summary = cleanup_piggyback_files(&paths, &PiggybackTimeSettings::new(), SystemTime::now()).unwrap();
    assert_eq!(summary, CleanupSummary::default());

    store(&paths, "src", &["dst"]);
    let summary = cleanup_piggyback_files(&paths, &PiggybackTimeSettings::new(), SystemTime::now()).unwrap();
    assert_eq!(summary, CleanupSummary::default());
    assert!(paths.payload_path("dst", "src").exists());
    assert!(paths.status_path("src").exists());
}

#[test]
fn test_cleanup_outdated() {
    let dir = create_temp_dir();
    let paths = PiggybackPaths::new(dir.path().join("piggyback"), dir.path().join("piggyback_sources"));
    store(&paths, "old", &["dst_old"]);
    store(&paths, "new", &["dst_new", "dst_old"]);
    let now = SystemTime::now();
    set_mtime_ago(&paths.payload_path("dst_old", "old"), now, 4000);
    set_mtime_ago(&paths.status_path("old"), now, 4000);

    let summary = cleanup_piggyback_files(&paths, &PiggybackTimeSettings::new(), now).unwrap();
    assert_eq!(
        summary,
        CleanupSummary {
            status_files_removed: 1,
            payload_files_removed: 1,
            target_dirs_removed: 0,
        }
    );
    assert!(!paths.status_path("old").exists());
    assert!(!paths.payload_path("dst_old", "old").exists());
    assert!(paths.payload_path("dst_old", "new").exists());
    assert!(paths.payload_path("dst_new", "new").exists());
}

#[test]
fn test_cleanup_removes_empty_target_dir() {
    let dir = create_temp_dir();
    let paths = PiggybackPaths::new(dir.path().join("piggyback"), dir.path().join("piggyback_sources"));
    store(&paths, "src", &["dst"]);
    let now = SystemTime::now();
    set_mtime_ago(&paths.payload_path("dst", "src"), now, 4000);

    let summary = cleanup_piggyback_files(&paths, &PiggybackTimeSettings::new(), now).unwrap();
    assert_eq!(summary.payload_files_removed, 1);
    assert_eq!(summary.target_dirs_removed, 1);
    assert!(!paths.target_dir("dst").exists());
    // the status marker is not outdated yet
    assert!(paths.status_path("src").exists());
}

#[test]
fn test_cleanup_keeps_still_valid() {
    let dir = create_temp_dir();
    let paths = PiggybackPaths::new(dir.path().join("piggyback"), dir.path().join("piggyback_sources"));
    store(&paths, "src", &["dst"]);
    let now = SystemTime::now();
    set_mtime_ago(&paths.payload_path("dst", "src"), now, 4000);
    let time_settings = PiggybackTimeSettings::from_strs(&["validity_period=5000"]).unwrap();

    let summary = cleanup_piggyback_files(&paths, &time_settings, now).unwrap();
    assert_eq!(summary.payload_files_removed, 0);
    assert!(paths.payload_path("dst", "src").exists());
}

#[test]
fn test_cleanup_status_uses_greatest_target_age() {
    let dir = create_temp_dir();
    let paths = PiggybackPaths::new(dir.path().join("piggyback"), dir.path().join("piggyback_sources"));
    store(&paths, "src", &["dst1", "dst2"]);
    let now = SystemTime::now();
    set_mtime_ago(&paths.status_path("src"), now, 4000);
    let time_settings = PiggybackTimeSettings::from_strs(&["dst2:max_cache_age=5000"]).unwrap();

    let summary = cleanup_piggyback_files(&paths, &time_settings, now).unwrap();
    assert_eq!(summary.status_files_removed, 0);
    assert!(paths.status_path("src").exists());

    let summary = cleanup_piggyback_files(&paths, &PiggybackTimeSettings::new(), now).unwrap();
    assert_eq!(summary.status_files_removed, 1);
}

#[test]
fn test_cleanup_entries_vanishing_after_listing() {
    let dir = create_temp_dir();
    let paths = PiggybackPaths::new(dir.path().join("piggyback"), dir.path().join("piggyback_sources"));
    let time_settings = PiggybackTimeSettings::new();
    store(&paths, "src1", &["dst"]);
    store(&paths, "src2", &["dst"]);
    let now = SystemTime::now();
    set_mtime_ago(&paths.payload_path("dst", "src1"), now, 4000);
    set_mtime_ago(&paths.payload_path("dst", "src2"), now, 4000);
    let sources = list_dir_names(&paths.target_dir("dst")).unwrap();

    // removed by another process after listing
    std::fs::remove_file(paths.payload_path("dst", "src1")).unwrap();
    let mut summary = CleanupSummary::default();
    cleanup_target_dir(&paths, &time_settings, "dst", &sources, now, &mut summary).unwrap();
    assert_eq!(summary.payload_files_removed, 1);
    assert_eq!(summary.target_dirs_removed, 1);

    // the whole target directory is gone
    let mut summary = CleanupSummary::default();
    cleanup_target_dir(&paths, &time_settings, "dst", &sources, now, &mut summary).unwrap();
    assert_eq!(summary, CleanupSummary::default());
}

#[test]
fn test_cleanup_keeps_refilled_target_dir() {
    let dir = create_temp_dir();
    let paths = PiggybackPaths::new(dir.path().join("piggyback"), dir.path().join("piggyback_sources"));
    store(&paths, "src", &["dst"]);
    let now = SystemTime::now();
    set_mtime_ago(&paths.payload_path("dst", "src"), now, 4000);
    let sources = list_dir_names(&paths.target_dir("dst")).unwrap();

    // stored by another source after listing
    create_file_in_dir(&paths.target_dir("dst"), "late", b"<<<local>>>\n");
    let mut summary = CleanupSummary::default();
    cleanup_target_dir(&paths, &PiggybackTimeSettings::new(), "dst", &sources, now, &mut summary).unwrap();
    assert_eq!(summary.payload_files_removed, 1);
    assert_eq!(summary.target_dirs_removed, 0);
    assert!(paths.payload_path("dst", "late").exists());
}
