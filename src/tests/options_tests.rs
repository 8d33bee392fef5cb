// src/tests/options_tests.rs

//! tests for `options.rs`

use ::test_case::test_case;

use crate::config::options::{encoding_for_label, Options, MAXOUTPUTSIZE_DEFAULT};
use crate::data::level::Level;

#[test]
fn test_options_defaults() {
    let options = Options::new();
    assert_eq!(options.encoding(), None);
    assert_eq!(options.maxfilesize(), None);
    assert_eq!(options.maxlines(), None);
    assert_eq!(options.maxtime(), None);
    assert_eq!(options.maxlinesize(), None);
    assert!(options.regex().is_none());
    assert_eq!(options.overflow(), Level::Critical);
    assert_eq!(options.overflow_level(), 2);
    assert!(!options.nocontext());
    assert_eq!(options.maxcontextlines(), None);
    assert_eq!(options.maxoutputsize(), MAXOUTPUTSIZE_DEFAULT);
    assert!(!options.fromstart());
    assert!(!options.skipconsecutiveduplicated());
}

#[test]
fn test_set_opt_values() {
    let mut options = Options::new();
    for token in [
        "maxlines=100",
        "maxlinesize=20",
        "maxfilesize=4096",
        "maxoutputsize=300",
        "maxtime=0.5",
        "overflow=W",
        "nocontext=Yes",
        "fromstart=1",
        "skipconsecutiveduplicated=TRUE",
        "maxcontextlines=2,3",
        "encoding=utf_16",
    ] {
        options.set_opt(token).unwrap();
    }
    assert_eq!(options.maxlines(), Some(100));
    assert_eq!(options.maxlinesize(), Some(20));
    assert_eq!(options.maxfilesize(), Some(4096));
    assert_eq!(options.maxoutputsize(), 300);
    assert_eq!(options.maxtime(), Some(0.5));
    assert_eq!(options.overflow(), Level::Warning);
    assert_eq!(options.overflow_level(), 1);
    assert!(options.nocontext());
    assert!(options.fromstart());
    assert!(options.skipconsecutiveduplicated());
    assert_eq!(options.maxcontextlines(), Some((2, 3)));
    assert_eq!(options.encoding(), Some("utf_16"));
}

#[test_case("I", 0)]
#[test_case("O", 0)]
#[test_case("C", 2)]
fn test_overflow_rank(letter: &str, rank: i8) {
    let mut options = Options::new();
    options.set_opt(&format!("overflow={}", letter)).unwrap();
    assert_eq!(options.overflow_level(), rank);
}

#[test]
fn test_set_opt_regex_and_iregex() {
    let mut options = Options::new();
    options.set_opt("regex=\\.log$").unwrap();
    assert!(options.regex().unwrap().is_match("/var/log/x.log"));
    assert!(!options.regex().unwrap().is_match("/var/log/x.LOG"));
    options.set_opt("iregex=\\.log$").unwrap();
    assert!(options.regex().unwrap().is_match("/var/log/x.LOG"));
}

#[test_case("maxlines"; "no equals")]
#[test_case("unknown=1"; "unknown key")]
#[test_case("maxlines=abc"; "not a number")]
#[test_case("maxlines=-1"; "negative")]
#[test_case("maxtime=soon"; "bad float")]
#[test_case("overflow=X"; "bad overflow")]
#[test_case("nocontext=maybe"; "bad bool")]
#[test_case("maxcontextlines=3"; "one context number")]
#[test_case("regex=("; "bad regex")]
#[test_case("encoding=klingon"; "bad encoding")]
fn test_set_opt_invalid(token: &str) {
    let mut options = Options::new();
    assert!(options.set_opt(token).is_err(), "accepted {:?}", token);
}

#[test]
fn test_set_opt_invalid_message() {
    let mut options = Options::new();
    let err = options.set_opt("foo").unwrap_err();
    assert_eq!(err.to_string(), "Invalid option: 'foo'");
}

#[test]
fn test_update_overrides_only_set_values() {
    let mut first = Options::new();
    first.set_opt("maxlines=10").unwrap();
    first.set_opt("overflow=W").unwrap();
    let mut second = Options::new();
    second.set_opt("maxlines=20").unwrap();
    second.set_opt("nocontext=true").unwrap();

    first.update(&second);
    assert_eq!(first.maxlines(), Some(20));
    assert_eq!(first.overflow(), Level::Warning);
    assert!(first.nocontext());
}

#[test_case("utf-8", "UTF-8")]
#[test_case("utf_8", "UTF-8"; "underscore")]
#[test_case("latin_1", "windows-1252"; "latin1")]
#[test_case("UTF-16", "UTF-16LE"; "utf16")]
#[test_case("utf-16be", "UTF-16BE"; "utf16be")]
fn test_encoding_for_label(label: &str, name: &str) {
    assert_eq!(encoding_for_label(label).unwrap().name(), name);
}

#[test]
fn test_encoding_for_label_unknown() {
    assert!(encoding_for_label("klingon").is_none());
}
