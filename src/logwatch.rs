// src/logwatch.rs

//! The run driver of the _mk_logwatch_ agent plugin.
//!
//! One call to [`run`] writes the whole `<<<logwatch>>>` payload:
//!
//! 1. read and parse the configuration files,
//! 2. choose and read the state file of the caller,
//! 3. expand the logfile blocks into [`LogfileSection`]s,
//! 4. scan each section with a [`LogfileProcessor`], filter and print its
//!    lines,
//! 5. write the state file.
//!
//! Problems with single files or configuration lines are reported inside
//! the payload. Only with `debug` do they end the run.
//!
//! [`LogfileSection`]: crate::data::section::LogfileSection
//! [`LogfileProcessor`]: crate::readers::logfileprocessor::LogfileProcessor

use crate::common::{PathBuf, CONFIG_ERROR_PREFIX, INVALID_CONFIG_PREFIX, SECTION_HEADER};
use crate::config::environment::Environment;
use crate::config::parser::{parse_config, read_config_lines, LogwatchConfig};
use crate::data::section::{parse_sections, ParsedSections};
use crate::printer::filters::apply_filters;
use crate::printer::printers::{OutputLines, PrinterLogwatch, WriteColor};
use crate::readers::logfileprocessor::LogfileProcessor;
use crate::state::statestore::StateStore;

use std::io::Result;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Command-line switches of one run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunOptions {
    /// fail on the first problem instead of reporting it, never write state
    pub debug: bool,
    /// read only this configuration file
    pub config: Option<PathBuf>,
    /// do not write the state file
    pub no_state: bool,
}

/// Counts of one run, for logging and tests.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    pub sections: usize,
    pub sections_failed: usize,
    pub lines_printed: usize,
    pub state_written: bool,
}

/// Read and parse the configuration, printing problems as protocol lines.
fn load_config<W: WriteColor>(
    env: &Environment,
    run_options: &RunOptions,
    printer: &mut PrinterLogwatch<W>,
) -> Result<LogwatchConfig> {
    let files = env.config_files(run_options.config.as_deref());
    let config_lines = read_config_lines(&files, run_options.debug)?;
    for error in config_lines.errors.iter() {
        printer.print_protocol_line(error)?;
    }
    let config = match parse_config(&config_lines.lines) {
        Ok(config) => config,
        Err(err) => {
            printer.print_protocol_line(&format!("{}{}", CONFIG_ERROR_PREFIX, err))?;
            if run_options.debug {
                return Err(err.into());
            }
            ::log::warn!("Continuing with partial configuration: {}", err);
            err.partial
        }
    };

    Ok(config)
}

/// Run the plugin once, writing the payload to `printer`.
pub fn run<W: WriteColor>(
    env: &Environment,
    run_options: &RunOptions,
    printer: &mut PrinterLogwatch<W>,
) -> Result<RunSummary> {
    defn!("({:?})", run_options);
    let debug = run_options.debug;
    let mut summary = RunSummary::default();

    printer.print_protocol_line(SECTION_HEADER)?;

    let config = load_config(env, run_options, printer)?;

    let status_path: PathBuf = env.status_filename(&config.clusters);
    if let Err(err) = env.migrate_state_file(&status_path) {
        if debug {
            defx!("migrate_state_file failed {}", err);
            return Err(err);
        }
        ::log::warn!("Cannot copy state file to {:?}: {}", status_path, err);
    }

    let parsed: ParsedSections = match parse_sections(&config.logfiles, debug) {
        Ok(parsed) => parsed,
        Err(err) => {
            printer.print_protocol_line(&format!("{}{}", INVALID_CONFIG_PREFIX, err))?;
            defx!("parse_sections failed {}", err);
            return Err(err);
        }
    };
    for invalid in parsed.invalid.iter() {
        printer.print_protocol_line(invalid)?;
    }
    for pattern in parsed.missing.iter() {
        printer.print_section_header(&format!("{}:missing", pattern))?;
    }

    let mut state = StateStore::new(status_path);
    if let Err(err) = state.read() {
        if debug {
            defx!("state read failed {}", err);
            return Err(err);
        }
        // better to report some old lines again than to stop monitoring
        ::log::warn!("Corrupted state file {:?}: {}", state.path(), err);
    }

    for section in parsed.sections.iter() {
        summary.sections += 1;
        let filestate = state.get(&section.name_fs);
        let mut processor = LogfileProcessor::new(section);
        let processed = match processor.process(filestate, env.locale_encoding, debug) {
            Ok(processed) => processed,
            Err(err) => {
                summary.sections_failed += 1;
                if debug {
                    defx!("process failed {}", err);
                    return Err(err);
                }
                ::log::debug!("Exception when processing {:?}: {}", section.name_write, err);
                continue;
            }
        };
        let lines: OutputLines = apply_filters(processed.lines, &section.options);
        printer.print_section_header(&processed.header)?;
        printer.print_lines(&lines)?;
        summary.lines_printed += lines.len();
    }
    printer.flush()?;

    if debug {
        ::log::debug!("State file not written (debug mode)");
    } else if run_options.no_state {
        ::log::debug!("State file not written (--no_state)");
    } else {
        state.write()?;
        summary.state_written = true;
    }
    defx!("{:?}", summary);

    Ok(summary)
}
