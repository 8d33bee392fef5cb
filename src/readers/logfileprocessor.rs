// src/readers/logfileprocessor.rs

//! Implements a [`LogfileProcessor`], the driver of scanning one
//! [`LogfileSection`] for new lines and classifying them.
//!
//! A `LogfileProcessor` drives a [`LogLineReader`] from the offset
//! remembered in the file's [`FileScanState`] up to the end of the file,
//! and leaves the offset of the next unread line in the `FileScanState`.
//!
//! [`LogfileSection`]: crate::data::section::LogfileSection
//! [`LogLineReader`]: crate::readers::loglinereader::LogLineReader
//! [`FileScanState`]: crate::state::statestore::FileScanState

use crate::common::{Count, FileOffset, FileSz, Inode, CONT_SEP, TRUNCATED_MARKER};
use crate::config::options::encoding_for_label;
use crate::data::level::{Level, LevelRank, RANK_NOTHING};
use crate::data::rule::{capture_groups, CaptureGroups, CompiledRule, ContinuationPattern};
use crate::data::section::LogfileSection;
#[allow(unused_imports)]
use crate::debug::printers::str_to_String_noraw;
use crate::printer::printers::{OutputLine, OutputLines};
use crate::readers::helpers::metadata_inode;
use crate::readers::loglinereader::{LogLine, LogLineReader};
use crate::state::statestore::FileScanState;

use std::io::{Error, ErrorKind, Result};
use std::time::Instant;

extern crate encoding_rs;
use encoding_rs::Encoding;

extern crate si_trace_print;
#[allow(unused_imports)]
use si_trace_print::{defn, defo, defx, defñ};

/// Enum for the [`LogfileProcessor`] processing stages. Each file processed
/// advances through these stages. Sometimes stages may be skipped.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum ProcessingStage {
    /// Not yet opened.
    Stage0Unopened,
    /// Opened; compare the file with its [`FileScanState`] to find where
    /// to start reading.
    Stage1ResolvePosition,
    /// Read, classify and rewrite lines until the end of the file or until
    /// a resource limit trips.
    Stage2Scan,
    /// Record the new offset and inode.
    Stage3Finished,
}

/// When to check option `maxtime`: at every line number `n` (counting from
/// 1) where `n % every == offset`, avoiding a clock read per line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimeCheckCadence {
    pub every: Count,
    pub offset: Count,
}

impl Default for TimeCheckCadence {
    fn default() -> Self {
        TimeCheckCadence { every: 100, offset: 10 }
    }
}

/// The result of processing one logfile section.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessedLogfile {
    /// the name inside the section header, e.g. `/var/log/messages` or
    /// `/var/log/messages:cannotopen`
    pub header: String,
    /// empty if no rule matched and no limit tripped
    pub lines: OutputLines,
}

/// Scans one [`LogfileSection`], see the module documentation.
#[derive(Debug)]
pub struct LogfileProcessor<'a> {
    section: &'a LogfileSection,
    processingstage: ProcessingStage,
    cadence: TimeCheckCadence,
    /// `Count` of lines read, not counting continuation lines
    lines_parsed: Count,
    /// rank of the worst matched rule or tripped limit
    worst: LevelRank,
}

/// Join continuation line `cont` onto `line`, replacing the newline of
/// `line` with [`CONT_SEP`].
fn join_continuation(
    line: &mut String,
    cont: &str,
) {
    line.pop();
    line.push(CONT_SEP);
    line.push_str(cont);
}

/// `line` without its final character, the newline.
fn strip_newline(line: &str) -> &str {
    match line.char_indices().next_back() {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

impl<'a> LogfileProcessor<'a> {
    pub fn new(section: &'a LogfileSection) -> LogfileProcessor<'a> {
        LogfileProcessor {
            section,
            processingstage: ProcessingStage::Stage0Unopened,
            cadence: TimeCheckCadence::default(),
            lines_parsed: 0,
            worst: RANK_NOTHING,
        }
    }

    pub fn with_time_check_cadence(
        mut self,
        cadence: TimeCheckCadence,
    ) -> LogfileProcessor<'a> {
        self.cadence = cadence;
        self
    }

    pub fn processingstage(&self) -> ProcessingStage {
        self.processingstage
    }

    pub fn lines_parsed(&self) -> Count {
        self.lines_parsed
    }

    pub fn worst(&self) -> LevelRank {
        self.worst
    }

    /// Scan the section's file for lines added since the run that left
    /// `filestate`, and update `filestate` for the next run.
    ///
    /// A file that cannot be opened gets a `:cannotopen` header and no
    /// lines, or with `debug` is an error. Also with `debug`, a file never
    /// seen before is read from the start.
    pub fn process(
        &mut self,
        filestate: &mut FileScanState,
        fallback_encoding: &'static Encoding,
        debug: bool,
    ) -> Result<ProcessedLogfile> {
        defn!("({:?})", self.section.name_write);
        let options = &self.section.options;
        let encoding: Option<&'static Encoding> = match options.encoding() {
            Some(label) => match encoding_for_label(label) {
                Some(encoding) => Some(encoding),
                None => {
                    defx!("unknown encoding {:?}", label);
                    return Err(Error::new(ErrorKind::InvalidInput, format!("unknown encoding: {}", label)));
                }
            },
            None => None,
        };
        let mut reader = match LogLineReader::new(&self.section.name_fs, encoding, fallback_encoding) {
            Ok(reader) => reader,
            Err(err) => {
                if debug {
                    defx!("{}", err);
                    return Err(err);
                }
                ::log::debug!("Cannot open {:?}: {}", self.section.name_write, err);
                defx!("cannotopen");
                return Ok(ProcessedLogfile {
                    header: format!("{}:cannotopen", self.section.name_write),
                    lines: OutputLines::new(),
                });
            }
        };
        let nothing_new = ProcessedLogfile {
            header: self.section.name_write.clone(),
            lines: OutputLines::new(),
        };

        self.processingstage = ProcessingStage::Stage1ResolvePosition;
        let metadata = std::fs::metadata(&self.section.name_fs)?;
        let size: FileSz = metadata.len();
        let inode: Inode = metadata_inode(&metadata);
        let prev_inode: Inode = filestate.inode;
        filestate.inode = inode;
        let mut offset: Option<FileOffset> = filestate.offset;
        // if anything goes wrong from here on, the lines up to now are skipped
        filestate.offset = Some(size);

        if offset.is_none() && !(options.fromstart() || debug) {
            // never seen before, do not report ancient lines
            defx!("first sight, offset {}", size);
            return Ok(nothing_new);
        }
        if prev_inode >= 0 && inode != prev_inode {
            defo!("inode changed {} → {}, assume rotation", prev_inode, inode);
            offset = None;
        }
        if offset == Some(size) {
            defx!("no new data");
            return Ok(nothing_new);
        }
        if matches!(offset, Some(offset_) if offset_ > size) {
            defo!("offset {:?} beyond size {}, assume truncation", offset, size);
            offset = None;
        }
        reader.set_position(offset)?;

        self.processingstage = ProcessingStage::Stage2Scan;
        let lines = self.scan(&mut reader)?;
        let new_offset: FileOffset = reader.get_position()?;
        filestate.offset = Some(new_offset);

        self.processingstage = ProcessingStage::Stage3Finished;
        let mut lines = lines;
        if let Some(maxfilesize) = options.maxfilesize().filter(|m| *m > 0) {
            let offset_wrap: FileOffset = new_offset / maxfilesize;
            if offset.unwrap_or(0) / maxfilesize < offset_wrap {
                lines.push(OutputLine::new(
                    Level::Warning,
                    format!(
                        "Maximum allowed logfile size ({} bytes) exceeded for the {}th time.",
                        maxfilesize, offset_wrap
                    ),
                ));
            }
        }
        if self.worst <= RANK_NOTHING {
            defx!("nothing matched, offset {}", new_offset);
            return Ok(nothing_new);
        }
        defx!("{} lines, worst {}, offset {}", lines.len(), self.worst, new_offset);

        Ok(ProcessedLogfile {
            header: self.section.name_write.clone(),
            lines,
        })
    }

    /// Read and classify lines until the end of the file or until a limit
    /// trips.
    fn scan(
        &mut self,
        reader: &mut LogLineReader,
    ) -> Result<OutputLines> {
        let options = &self.section.options;
        let rules = self.section.compiled_rules()?;
        let mut lines = OutputLines::new();
        let start = Instant::now();

        loop {
            let mut line: String = match reader.next_line().transpose()? {
                Some(logline) => logline.text,
                None => break,
            };

            if let Some(maxlinesize) = options.maxlinesize() {
                if line.len() > maxlinesize && line.chars().count() > maxlinesize {
                    line = line.chars().take(maxlinesize).collect();
                    line.push_str(TRUNCATED_MARKER);
                    line.push('\n');
                }
            }

            self.lines_parsed += 1;
            if let Some(maxlines) = options.maxlines() {
                if self.lines_parsed > maxlines {
                    lines.push(OutputLine::new(
                        options.overflow(),
                        format!("Maximum number ({}) of new log messages exceeded.", maxlines),
                    ));
                    self.worst = self.worst.max(options.overflow_level());
                    reader.skip_remaining()?;
                    break;
                }
            }
            if let Some(maxtime) = options.maxtime() {
                if self.cadence.every > 0
                    && self.lines_parsed % self.cadence.every == self.cadence.offset
                    && start.elapsed().as_secs_f64() > maxtime
                {
                    lines.push(OutputLine::new(
                        options.overflow(),
                        format!("Maximum parsing time ({:.1} sec) of this log file exceeded.", maxtime),
                    ));
                    self.worst = self.worst.max(options.overflow_level());
                    reader.skip_remaining()?;
                    break;
                }
            }

            let mut level = Level::Neutral;
            for rule in rules.iter() {
                let groups: CaptureGroups = match self.match_rule(rule, &line) {
                    Some(groups) => groups,
                    None => continue,
                };
                level = rule.level;
                self.worst = self.worst.max(rule.level.rank());
                for cont_pattern in rule.continuations.iter() {
                    Self::read_continuation(reader, cont_pattern, &mut line)?;
                }
                line = rule.rewrite(line, &groups);
                break;
            }

            let level = level.display_level();
            defo!("{} {:?}", level, str_to_String_noraw(&line));
            if options.nocontext() && level == Level::Neutral {
                continue;
            }
            lines.push(OutputLine::new(level, strip_newline(&line)));
        }
        defo!("parsed {} lines", self.lines_parsed);

        Ok(lines)
    }

    /// Search `rule` in `line`. On a match return the capture groups, which
    /// are only needed for rewriting.
    fn match_rule(
        &self,
        rule: &CompiledRule,
        line: &str,
    ) -> Option<CaptureGroups> {
        let text: &str = strip_newline(line);
        if rule.rewrites.is_empty() {
            if rule.regex.is_match(text) {
                return Some(CaptureGroups::new());
            }
            return None;
        }

        rule.regex.captures(text).map(|captures| capture_groups(&captures))
    }

    /// Append the lines following `line` that `cont_pattern` takes.
    fn read_continuation(
        reader: &mut LogLineReader,
        cont_pattern: &ContinuationPattern,
        line: &mut String,
    ) -> Result<()> {
        match cont_pattern {
            ContinuationPattern::Count(count) => {
                for _ in 0..*count {
                    match reader.next_line().transpose()? {
                        Some(cont) => join_continuation(line, &cont.text),
                        None => break,
                    }
                }
            }
            ContinuationPattern::Regex(regex) => {
                while let Some(cont) = reader.next_line().transpose()? {
                    if regex.is_match(strip_newline(&cont.text)) {
                        join_continuation(line, &cont.text);
                    } else {
                        // not a continuation, process normally
                        Self::push_back(reader, cont);
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    #[inline(always)]
    fn push_back(
        reader: &mut LogLineReader,
        line: LogLine,
    ) {
        reader.push_back_line(line);
    }
}
