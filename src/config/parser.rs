// src/config/parser.rs

//! Reads the block structured configuration into [`LogwatchConfig`].
//!
//! ```text
//! # comment
//! /var/log/messages /var/log/syslog maxlines=1000
//!  C Fail event detected on md device
//!  W mdadm\[\d+\]: Rebuild.*
//!  A .*more info.*
//!  R rewritten: \1
//! CLUSTER duck
//!  192.168.1.1
//!  10.0.0.0/24
//! ```
//!
//! A line starting with a space continues the block opened by the last
//! line that did not. `CLUSTER <name>` opens a cluster block, any other line
//! opens a logfile block.

use crate::common::{Path, PathBuf, CONFIG_ERROR_PREFIX};
use crate::data::level::Level;
use crate::data::literal::repr_str;
use crate::data::rule::{ClassificationRule, ClassificationRules};
use crate::readers::helpers::path_to_fpath;

use std::fmt;
use std::io::{Error, ErrorKind, Read, Result};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Opens a cluster block.
pub const CLUSTER_PREFIX: &str = "CLUSTER ";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// configuration blocks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A logfile block: glob patterns and option tokens, then rules.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LogfileBlock {
    /// glob patterns mixed with `key=value` option tokens
    pub files: Vec<String>,
    pub rules: ClassificationRules,
}

impl LogfileBlock {
    /// The `key=value` tokens.
    pub fn option_tokens(&self) -> impl Iterator<Item = &String> {
        self.files.iter().filter(|f| f.contains('='))
    }

    /// The glob patterns.
    pub fn glob_patterns(&self) -> impl Iterator<Item = &String> {
        self.files.iter().filter(|f| !f.contains('='))
    }
}

/// Maps a cluster name to the addresses of its members.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClusterDefinition {
    pub name: String,
    /// single addresses or subnets in CIDR notation
    pub ips_or_subnets: Vec<String>,
}

/// The whole parsed configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LogwatchConfig {
    /// logfile blocks in configuration order
    pub logfiles: Vec<LogfileBlock>,
    pub clusters: Vec<ClusterDefinition>,
}

/// A parse failure. Carries everything parsed before the failing block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigParseError {
    pub message: String,
    pub partial: LogwatchConfig,
}

impl fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConfigParseError {}

impl From<ConfigParseError> for Error {
    fn from(err: ConfigParseError) -> Self {
        Error::new(ErrorKind::InvalidData, err.message)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// reading configuration files
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configuration lines of all files, and the protocol lines for files
/// that could not be decoded.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigLines {
    /// right trimmed, no comment or blank lines
    pub lines: Vec<String>,
    /// complete output lines, starting with [`CONFIG_ERROR_PREFIX`]
    pub errors: Vec<String>,
}

#[inline(always)]
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

#[inline(always)]
pub fn is_empty(line: &str) -> bool {
    line.trim().is_empty()
}

/// Only a leading space indents, a leading tab does not.
#[inline(always)]
pub fn is_indented(line: &str) -> bool {
    line.starts_with(' ')
}

/// Read the non-comment, non-blank lines of `files`, in order.
///
/// Files that do not exist or cannot be read are skipped. A file that is
/// not UTF-8 contributes an error line instead of its remaining lines.
/// With `debug`, finding no lines at all is an error.
pub fn read_config_lines(
    files: &[PathBuf],
    debug: bool,
) -> Result<ConfigLines> {
    defn!("({:?}, debug={})", files, debug);
    let mut config_lines = ConfigLines::default();
    for path in files.iter() {
        let mut data = Vec::<u8>::new();
        match std::fs::File::open(path).and_then(|mut f| f.read_to_end(&mut data)) {
            Ok(_) => {}
            Err(_err) => {
                defo!("skip {:?}: {}", path, _err);
                continue;
            }
        }
        read_config_bytes(path, &data, &mut config_lines);
    }
    if debug && config_lines.lines.is_empty() {
        let names: Vec<String> = files.iter().map(|p| path_to_fpath(p)).collect();
        defx!("no content");
        return Err(
            Error::new(
                ErrorKind::NotFound,
                format!("Did not find any content in config files: {}", names.join(", ")),
            )
        );
    }
    defx!("{} lines, {} errors", config_lines.lines.len(), config_lines.errors.len());

    Ok(config_lines)
}

/// Split `data` of config file `path` into lines.
fn read_config_bytes(
    path: &Path,
    data: &[u8],
    config_lines: &mut ConfigLines,
) {
    for raw_line in data.split_inclusive(|b| *b == b'\n') {
        let line = match std::str::from_utf8(raw_line) {
            Ok(line) => line,
            Err(_) => {
                config_lines.errors.push(format!(
                    "{}Error reading file {} (please use utf-8 encoding!)",
                    CONFIG_ERROR_PREFIX,
                    repr_str(&path_to_fpath(path)),
                ));
                return;
            }
        };
        if is_comment(line) || is_empty(line) {
            continue;
        }
        config_lines.lines.push(line.trim_end().to_string());
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Shell-split the header line of a logfile block.
///
/// On Windows backslashes are path separators, not escapes.
pub fn parse_filenames(line: &str) -> Result<Vec<String>> {
    let line: String = if cfg!(windows) {
        line.replace('\\', "/")
    } else {
        line.to_string()
    };
    match ::shlex::split(&line) {
        Some(files) => Ok(files),
        None => Err(
            Error::new(
                ErrorKind::InvalidData,
                format!("Unbalanced quotes in logfile line {}", repr_str(&line)),
            )
        ),
    }
}

/// Parse `lines` as returned by [`read_config_lines`].
pub fn parse_config(lines: &[String]) -> std::result::Result<LogwatchConfig, ConfigParseError> {
    defn!("({} lines)", lines.len());
    let mut config = LogwatchConfig::default();
    let mut index: usize = 0;
    while index < lines.len() {
        let first_line: &str = &lines[index];
        if is_indented(first_line) {
            defx!("indented line {}", index);
            return Err(ConfigParseError {
                message: format!("Missing block definition for line {}", repr_str(first_line)),
                partial: config,
            });
        }
        let block_end: usize = index
            + 1
            + lines[index + 1..]
                .iter()
                .take_while(|line| is_indented(line))
                .count();
        let block: &[String] = &lines[index..block_end];
        if first_line.starts_with(CLUSTER_PREFIX) {
            let cluster = parse_cluster_block(block);
            ::log::debug!("new ClusterDefinition: {}", cluster.name);
            config.clusters.push(cluster);
        } else {
            match parse_logfile_block(block) {
                Ok(logfile) => config.logfiles.push(logfile),
                Err(err) => {
                    defx!("{}", err);
                    return Err(ConfigParseError {
                        message: err.to_string(),
                        partial: config,
                    });
                }
            }
        }
        index = block_end;
    }
    ::log::info!("Logfiles configurations: {:?}", config.logfiles);
    ::log::info!("Optional cluster configurations: {:?}", config.clusters);
    defx!("{} logfile blocks, {} clusters", config.logfiles.len(), config.clusters.len());

    Ok(config)
}

fn parse_cluster_block(block: &[String]) -> ClusterDefinition {
    ClusterDefinition {
        name: block[0][CLUSTER_PREFIX.len()..].trim().to_string(),
        ips_or_subnets: block[1..].iter().map(|line| line.trim().to_string()).collect(),
    }
}

fn parse_logfile_block(block: &[String]) -> Result<LogfileBlock> {
    let mut logfile = LogfileBlock {
        files: parse_filenames(&block[0])?,
        rules: ClassificationRules::new(),
    };
    ::log::debug!("new LogfileBlock: {:?}", logfile.files);

    for line in block[1..].iter() {
        let (level, raw_pattern) = match line.trim_start().split_once(char::is_whitespace) {
            Some((level, raw_pattern)) => (level, raw_pattern.trim_start()),
            None => {
                return Err(
                    Error::new(ErrorKind::InvalidData, format!("Invalid pattern line {}", repr_str(line)))
                )
            }
        };
        match level {
            "A" | "R" => {
                let rule = match logfile.rules.last_mut() {
                    Some(rule) => rule,
                    None => {
                        ::log::debug!("ignoring {:?} before the first rule", line);
                        continue;
                    }
                };
                if level == "A" {
                    rule.continuations.push(raw_pattern.to_string());
                } else {
                    rule.rewrites.push(raw_pattern.to_string());
                }
            }
            "C" | "W" | "I" | "O" => {
                let rule = ClassificationRule::new(Level::from_letter(level)?, raw_pattern.to_string());
                ::log::debug!("pattern {:?}", rule);
                logfile.rules.push(rule);
            }
            _ => {
                return Err(
                    Error::new(ErrorKind::InvalidData, format!("Invalid level in pattern line {}", repr_str(line)))
                )
            }
        }
    }

    Ok(logfile)
}
