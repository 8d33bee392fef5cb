// src/data/section.rs

//! Implements [`LogfileSection`] and the glob expansion of logfile blocks,
//! [`parse_sections`].

use crate::common::{FPath, PathBuf, INVALID_CONFIG_PREFIX};
use crate::config::options::Options;
use crate::config::parser::LogfileBlock;
use crate::data::rule::{ClassificationRules, CompiledRules};
use crate::readers::helpers::{os_str_to_bytes, path_to_fpath};

use std::collections::BTreeMap;
use std::io::Result;

use ::glob::MatchOptions;
use ::once_cell::unsync::OnceCell;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Glob matching: `*` does not cross `/`, hidden files need a literal `.`.
const GLOB_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// One monitored file.
#[derive(Debug)]
pub struct LogfileSection {
    /// path used for opening the file, may not be UTF-8
    pub name_fs: PathBuf,
    /// path written to output and state
    pub name_write: FPath,
    pub options: Options,
    /// rules of every block that matched this file, in block order
    pub rules: ClassificationRules,
    compiled_rules: OnceCell<CompiledRules>,
}

impl LogfileSection {
    pub fn new(
        name_fs: PathBuf,
        name_write: FPath,
    ) -> LogfileSection {
        LogfileSection {
            name_fs,
            name_write,
            options: Options::new(),
            rules: ClassificationRules::new(),
            compiled_rules: OnceCell::new(),
        }
    }

    /// The compiled rules, compiled on first use.
    pub fn compiled_rules(&self) -> Result<&CompiledRules> {
        self.compiled_rules.get_or_try_init(|| {
            defñ!("compile {} rules of {:?}", self.rules.len(), self.name_write);
            self.rules
                .iter()
                .map(|rule| rule.compile())
                .collect::<Result<CompiledRules>>()
        })
    }
}

/// Return the non-directory paths matching `glob_pattern`, each with its
/// printable name.
///
/// An invalid pattern matches nothing.
pub fn find_matching_logfiles(glob_pattern: &str) -> Vec<(PathBuf, FPath)> {
    defn!("({:?})", glob_pattern);
    let paths = match ::glob::glob_with(glob_pattern, GLOB_MATCH_OPTIONS) {
        Ok(paths) => paths,
        Err(err) => {
            ::log::debug!("invalid glob pattern {:?}: {}", glob_pattern, err);
            defx!("invalid pattern");
            return Vec::new();
        }
    };
    let file_refs: Vec<(PathBuf, FPath)> = paths
        .filter_map(|entry| entry.ok())
        .filter(|path| !path.is_dir())
        .map(|path| {
            let name = path_to_fpath(&path);
            (path, name)
        })
        .collect();
    defx!("{} files", file_refs.len());

    file_refs
}

/// Result of [`parse_sections`].
#[derive(Debug, Default)]
pub struct ParsedSections {
    /// sorted by the bytes of [`LogfileSection::name_fs`]
    pub sections: Vec<LogfileSection>,
    /// glob patterns that matched no file
    pub missing: Vec<String>,
    /// complete output lines, starting with [`INVALID_CONFIG_PREFIX`]
    pub invalid: Vec<String>,
}

/// Expand the glob patterns of `blocks` into one [`LogfileSection`] per
/// matched file.
///
/// A file matched by several blocks gets the rules of all of them, in block
/// order, and their options merged in block order. A block with an invalid
/// option token is skipped, or with `debug` is an error.
pub fn parse_sections(
    blocks: &[LogfileBlock],
    debug: bool,
) -> Result<ParsedSections> {
    defn!("({} blocks)", blocks.len());
    let mut found = BTreeMap::<Vec<u8>, LogfileSection>::new();
    let mut parsed = ParsedSections::default();

    'blocks: for block in blocks.iter() {
        // first read all the options like `maxlines=100` or `maxtime=10`
        let mut options = Options::new();
        for token in block.option_tokens() {
            if let Err(err) = options.set_opt(token) {
                parsed.invalid.push(format!("{}{}", INVALID_CONFIG_PREFIX, err));
                if debug {
                    defx!("invalid option {:?}", token);
                    return Err(err);
                }
                ::log::warn!("Skipping logfile block {:?}: {}", block.files, err);
                continue 'blocks;
            }
        }

        // the same file may match several patterns
        for glob_pattern in block.glob_patterns() {
            let mut logfile_refs = find_matching_logfiles(glob_pattern);
            if let Some(regex) = options.regex() {
                logfile_refs.retain(|(_, name_write)| regex.is_match(name_write));
            }
            if logfile_refs.is_empty() {
                parsed.missing.push(glob_pattern.clone());
            }
            for (name_fs, name_write) in logfile_refs.into_iter() {
                let key: Vec<u8> = os_str_to_bytes(name_fs.as_os_str());
                let section = found
                    .entry(key)
                    .or_insert_with(|| LogfileSection::new(name_fs, name_write));
                section.rules.extend(block.rules.iter().cloned());
                section.options.update(&options);
            }
        }
    }
    parsed.sections = found.into_values().collect();
    defx!("{} sections, {} missing", parsed.sections.len(), parsed.missing.len());

    Ok(parsed)
}
