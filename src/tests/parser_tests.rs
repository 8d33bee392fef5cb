// src/tests/parser_tests.rs

//! tests for `parser.rs`

use ::test_case::test_case;

use crate::common::CONFIG_ERROR_PREFIX;
use crate::config::parser::{
    is_comment,
    is_empty,
    is_indented,
    parse_config,
    parse_filenames,
    read_config_lines,
    ClusterDefinition,
};
use crate::data::level::Level;
use crate::debug::helpers::{create_file_in_dir, create_temp_dir};

fn lines(text: &str) -> Vec<String> {
    text.lines().map(|l| l.to_string()).collect()
}

#[test_case("# comment", true)]
#[test_case("   # indented comment", true; "indented")]
#[test_case(" C foo # not a comment", false; "trailing hash")]
fn test_is_comment(line: &str, expected: bool) {
    assert_eq!(is_comment(line), expected);
}

#[test]
fn test_is_empty_and_indented() {
    assert!(is_empty(""));
    assert!(is_empty("  \t "));
    assert!(!is_empty(" x"));
    assert!(is_indented(" C x"));
    assert!(!is_indented("\tC x"));
    assert!(!is_indented("/var/log/x"));
}

#[test]
fn test_parse_filenames_quoting() {
    let files = parse_filenames("/var/log/a \"/var/log/with space\" maxlines=3").unwrap();
    assert_eq!(files, vec!["/var/log/a", "/var/log/with space", "maxlines=3"]);
    assert!(parse_filenames("\"/var/log/unbalanced").is_err());
}

#[test]
fn test_parse_config_blocks() {
    let config = parse_config(&lines(
        "/var/log/messages /var/log/syslog* maxlines=10
 C .*Error.*
 A .*more info.*
 R error: \\0
 W warn
 I ignore
 O fine
CLUSTER duck
 192.168.1.1
 10.0.0.0/24
/var/log/other
 C boom",
    ))
    .unwrap();
    assert_eq!(config.logfiles.len(), 2);
    let block = &config.logfiles[0];
    assert_eq!(block.files, vec!["/var/log/messages", "/var/log/syslog*", "maxlines=10"]);
    assert_eq!(block.option_tokens().collect::<Vec<_>>(), vec!["maxlines=10"]);
    assert_eq!(block.glob_patterns().count(), 2);
    assert_eq!(block.rules.len(), 4);
    assert_eq!(block.rules[0].level, Level::Critical);
    assert_eq!(block.rules[0].pattern, ".*Error.*");
    assert_eq!(block.rules[0].continuations, vec![".*more info.*"]);
    assert_eq!(block.rules[0].rewrites, vec!["error: \\0"]);
    assert_eq!(block.rules[1].level, Level::Warning);
    assert_eq!(block.rules[2].level, Level::Info);
    assert_eq!(block.rules[3].level, Level::Ok);
    assert_eq!(config.logfiles[1].files, vec!["/var/log/other"]);
    assert_eq!(
        config.clusters,
        vec![ClusterDefinition {
            name: "duck".to_string(),
            ips_or_subnets: vec!["192.168.1.1".to_string(), "10.0.0.0/24".to_string()],
        }]
    );
}

#[test]
fn test_parse_config_continuation_before_rule_ignored() {
    let config = parse_config(&lines("/var/log/x\n A orphan\n C real")).unwrap();
    assert_eq!(config.logfiles[0].rules.len(), 1);
    assert!(config.logfiles[0].rules[0].continuations.is_empty());
}

#[test]
fn test_parse_config_missing_block() {
    let err = parse_config(&lines(" C indented first")).unwrap_err();
    assert_eq!(err.message, "Missing block definition for line ' C indented first'");
    assert!(err.partial.logfiles.is_empty());
}

#[test]
fn test_parse_config_invalid_level_keeps_partial() {
    let err = parse_config(&lines("/var/log/a\n C ok\n/var/log/b\n X bad")).unwrap_err();
    assert_eq!(err.message, "Invalid level in pattern line ' X bad'");
    assert_eq!(err.partial.logfiles.len(), 1);
    assert_eq!(err.partial.logfiles[0].files, vec!["/var/log/a"]);
}

#[test]
fn test_parse_config_empty() {
    let config = parse_config(&[]).unwrap();
    assert!(config.logfiles.is_empty());
    assert!(config.clusters.is_empty());
}

#[test]
fn test_read_config_lines() {
    let dir = create_temp_dir();
    let cfg1 = create_file_in_dir(dir.path(), "logwatch.cfg", b"# comment\n\n/var/log/a  \n C x\n");
    let cfg2 = create_file_in_dir(dir.path(), "logwatch.d/b.cfg", b"/var/log/b\n W y\r\n");
    let missing = dir.path().join("missing.cfg");
    let config_lines = read_config_lines(&[cfg1, missing, cfg2], false).unwrap();
    assert_eq!(config_lines.lines, vec!["/var/log/a", " C x", "/var/log/b", " W y"]);
    assert!(config_lines.errors.is_empty());
}

#[test]
fn test_read_config_lines_not_utf8() {
    let dir = create_temp_dir();
    let cfg = create_file_in_dir(dir.path(), "bad.cfg", b"/var/log/a\n C \xff\xfe\n C later\n");
    let config_lines = read_config_lines(&[cfg], false).unwrap();
    assert_eq!(config_lines.lines, vec!["/var/log/a"]);
    assert_eq!(config_lines.errors.len(), 1);
    assert!(config_lines.errors[0].starts_with(CONFIG_ERROR_PREFIX));
    assert!(config_lines.errors[0].ends_with("(please use utf-8 encoding!)"));
}

#[test]
fn test_read_config_lines_debug_no_content() {
    let dir = create_temp_dir();
    let missing = dir.path().join("missing.cfg");
    assert!(read_config_lines(&[missing.clone()], false).unwrap().lines.is_empty());
    let err = read_config_lines(&[missing], true).unwrap_err();
    assert!(err.to_string().starts_with("Did not find any content in config files: "));
}
