// src/data/rule.rs

//! Implements [`ClassificationRule`] as parsed from configuration and the
//! pattern compiler that turns it into a [`CompiledRule`].
//!
//! ## Backtracking mitigation
//!
//! Rules are matched with an unanchored search, so a single leading and a
//! single trailing `.*` never change *whether* a line matches. They only add
//! needless work on very long lines, and are stripped before compiling.
//! Capture group positions do change, so rules with rewrite templates are
//! compiled verbatim.

use crate::data::level::Level;

use std::fmt;
use std::io::{Error, ErrorKind, Result};

use ::regex::{Captures, Regex};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ClassificationRule
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One rule of a logfile block, as written in the configuration.
///
/// ```text
///  C .*Error.*
///  A .*more info.*
///  R error: \0
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassificationRule {
    pub level: Level,
    /// primary match pattern
    pub pattern: String,
    /// `A` lines: a line count or a regular expression
    pub continuations: Vec<String>,
    /// `R` lines: rewrite templates
    pub rewrites: Vec<String>,
}

pub type ClassificationRules = Vec<ClassificationRule>;

impl ClassificationRule {
    pub fn new(level: Level, pattern: String) -> ClassificationRule {
        ClassificationRule {
            level,
            pattern,
            continuations: Vec::new(),
            rewrites: Vec::new(),
        }
    }

    /// Compile this rule, see the module documentation.
    pub fn compile(&self) -> Result<CompiledRule> {
        defn!("({:?})", self.pattern);
        let raw_pattern: &str = if self.rewrites.is_empty() {
            search_optimize_raw_pattern(&self.pattern)
        } else {
            self.pattern.as_str()
        };
        let regex = compile_regex(raw_pattern)?;
        let mut continuations = Vec::<ContinuationPattern>::with_capacity(self.continuations.len());
        for raw in self.continuations.iter() {
            continuations.push(ContinuationPattern::compile(raw)?);
        }
        defx!("{:?}", regex);

        Ok(CompiledRule {
            level: self.level,
            regex,
            continuations,
            rewrites: self.rewrites.clone(),
        })
    }
}

/// Return `raw_pattern` with one leading and one trailing `.*` removed.
///
/// A pattern consisting only of `.*` (or `.*.*`) is returned unchanged.
pub fn search_optimize_raw_pattern(raw_pattern: &str) -> &str {
    let start: usize = if raw_pattern.starts_with(".*") { 2 } else { 0 };
    let end: usize = if raw_pattern.ends_with(".*") {
        raw_pattern.len() - 2
    } else {
        raw_pattern.len()
    };
    if start >= end {
        return raw_pattern;
    }

    &raw_pattern[start..end]
}

fn compile_regex(raw_pattern: &str) -> Result<Regex> {
    match Regex::new(raw_pattern) {
        Ok(regex) => Ok(regex),
        Err(err) => Err(
            Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid pattern {:?}: {}", raw_pattern, err),
            )
        ),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CompiledRule
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A compiled `A` line.
#[derive(Clone, Debug)]
pub enum ContinuationPattern {
    /// Append this many following lines, whatever they contain.
    Count(usize),
    /// Append following lines for as long as they match.
    Regex(Regex),
}

impl ContinuationPattern {
    pub fn compile(raw: &str) -> Result<ContinuationPattern> {
        if let Ok(count) = raw.trim().parse::<i64>() {
            // a negative count appends nothing
            return Ok(ContinuationPattern::Count(count.max(0) as usize));
        }

        Ok(ContinuationPattern::Regex(compile_regex(search_optimize_raw_pattern(raw))?))
    }
}

impl PartialEq for ContinuationPattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ContinuationPattern::Count(a), ContinuationPattern::Count(b)) => a == b,
            (ContinuationPattern::Regex(a), ContinuationPattern::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// A [`ClassificationRule`] ready for matching.
#[derive(Clone)]
pub struct CompiledRule {
    pub level: Level,
    pub regex: Regex,
    pub continuations: Vec<ContinuationPattern>,
    pub rewrites: Vec<String>,
}

pub type CompiledRules = Vec<CompiledRule>;

impl fmt::Debug for CompiledRule {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("level", &self.level)
            .field("regex", &self.regex.as_str())
            .field("continuations", &self.continuations)
            .field("rewrites", &self.rewrites)
            .finish()
    }
}

/// Capture groups `1..` of a primary match, owned, so the matched line may
/// be replaced while they are substituted.
pub type CaptureGroups = Vec<Option<String>>;

/// Copy capture groups `1..` out of `captures`.
pub fn capture_groups(captures: &Captures) -> CaptureGroups {
    captures
        .iter()
        .skip(1)
        .map(|m| m.map(|m_| m_.as_str().to_string()))
        .collect()
}

impl CompiledRule {
    /// Apply the rewrite templates to `line` (which ends with `'\n'`).
    ///
    /// Every template replaces the whole line: `\0` becomes the current line
    /// without trailing whitespace, `\1`, `\2`, ... become the capture groups
    /// of the primary match. Groups that did not participate are left as is.
    pub fn rewrite(
        &self,
        line: String,
        groups: &CaptureGroups,
    ) -> String {
        let mut line = line;
        for template in self.rewrites.iter() {
            let mut line_new = template.replace("\\0", line.trim_end());
            line_new.push('\n');
            for (num, group) in groups.iter().enumerate() {
                if let Some(group) = group {
                    line_new = line_new.replace(&format!("\\{}", num + 1), group);
                }
            }
            line = line_new;
        }

        line
    }
}
