// src/printer/filters.rs

//! Post-processing of the [`OutputLine`]s of one logfile section.
//!
//! [`apply_filters`] runs, in order,
//! 1. [`filter_maxcontextlines`] if option `maxcontextlines` is set,
//! 2. [`filter_maxoutputsize`],
//! 3. [`filter_consecutive_duplicates`] if option
//!    `skipconsecutiveduplicated` is set.

use crate::config::options::Options;
use crate::data::level::Level;
use crate::printer::printers::{OutputLine, OutputLines};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Text of the line replacing a run of duplicate lines.
pub fn duplicate_line_message(count: usize) -> String {
    format!("[the above message was repeated {} times]", count)
}

/// Keep only lines within `before` lines ahead of, or `after` lines
/// behind, a `C` or `W` line. Think of `grep -B before -A after`.
///
/// An interesting line inside an open window extends the window.
pub fn filter_maxcontextlines(
    lines: OutputLines,
    before: usize,
    after: usize,
) -> OutputLines {
    defn!("({} lines, before {}, after {})", lines.len(), before, after);
    let n_lines = lines.len() as i64;
    let before = before as i64;
    let after = after as i64;
    let mut keep: Vec<bool> = vec![false; lines.len()];
    let mut context_end: i64 = -1;
    for idx in -before..n_lines {
        // the line `before` lines ahead opens or extends the window
        let ahead = idx + before;
        if ahead < n_lines && context_end < n_lines && lines[ahead as usize].level.is_problem() {
            context_end = ahead + after;
        }
        if 0 <= idx && idx <= context_end {
            keep[idx as usize] = true;
        }
    }
    let lines: OutputLines = lines
        .into_iter()
        .zip(keep)
        .filter_map(|(line, keep)| if keep { Some(line) } else { None })
        .collect();
    defx!("{} lines", lines.len());

    lines
}

/// Keep lines while their cumulative size stays within `maxoutputsize`
/// bytes. The first line that does not fit ends the output.
pub fn filter_maxoutputsize(
    lines: OutputLines,
    maxoutputsize: usize,
) -> OutputLines {
    let mut bytecount: usize = 0;
    lines
        .into_iter()
        .take_while(|line| {
            bytecount += line.plain_len();
            bytecount <= maxoutputsize
        })
        .collect()
}

/// Collapse each run of identical consecutive lines into its first line,
/// followed by a neutral line telling how many lines were dropped (not
/// with `nocontext`).
pub fn filter_consecutive_duplicates(
    lines: OutputLines,
    nocontext: bool,
) -> OutputLines {
    let mut out = OutputLines::with_capacity(lines.len());
    let mut counter: usize = 0;
    let mut iter = lines.into_iter().peekable();
    while let Some(line) = iter.next() {
        if iter.peek() == Some(&line) {
            if counter == 0 {
                out.push(line);
            }
            counter += 1;
            continue;
        }
        if counter == 0 {
            out.push(line);
            continue;
        }
        if !nocontext {
            out.push(OutputLine::new(Level::Neutral, duplicate_line_message(counter)));
        }
        counter = 0;
    }

    out
}

/// Apply the filters configured in `options`, see the module
/// documentation.
pub fn apply_filters(
    lines: OutputLines,
    options: &Options,
) -> OutputLines {
    let mut lines = lines;
    if let Some((before, after)) = options.maxcontextlines() {
        lines = filter_maxcontextlines(lines, before, after);
    }
    lines = filter_maxoutputsize(lines, options.maxoutputsize());
    if options.skipconsecutiveduplicated() {
        lines = filter_consecutive_duplicates(lines, options.nocontext());
    }

    lines
}
