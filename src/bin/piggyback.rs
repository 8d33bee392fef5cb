// src/bin/piggyback.rs

//! Driver program _piggyback_ drives the [_lwlib_] piggyback manager.
//!
//! * `store SOURCE` reads the agent output of host `SOURCE` from STDIN (or
//!   `--input`) and stores its piggybacked sections.
//! * `get TARGET` writes the usable payloads for host `TARGET` to STDOUT,
//!   and the judgement of every payload to STDERR.
//! * `cleanup` removes outdated files.
//! * `sources [TARGET]` and `targets [SOURCE]` list host names.
//!
//! [_lwlib_]: lwlib

#![allow(non_camel_case_types)]

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;

use ::anyhow::Context;
use ::clap::{Parser, Subcommand};
use ::const_format::concatcp;

use ::lwlib::debug::printers::e_err;
use ::lwlib::piggyback::cleanup::cleanup_piggyback_files;
use ::lwlib::piggyback::reader::{get_piggyback_raw_data, get_piggybacked_hostnames, get_source_hostnames};
use ::lwlib::piggyback::timesettings::PiggybackTimeSettings;
use ::lwlib::piggyback::writer::store_piggyback_raw_data;
use ::lwlib::piggyback::{parse_piggyback_sections, PiggybackPaths};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// `--help` _afterword_ message.
const CLI_HELP_AFTER: &str = concatcp!(
    "\
Time settings are given as [HOST:]KEY=VALUE, KEY one of
  max_cache_age    seconds a payload stays usable (default 3600)
  validity_period  seconds a payload no longer updated by its source stays usable
  validity_state   status reported while such a payload is usable
A HOST setting applies to payloads for or from that host, a setting for the
target winning over one for the source.

Directories default to $OMD_ROOT/tmp/check_mk/piggyback and
$OMD_ROOT/tmp/check_mk/piggyback_sources.

---

Version: ", env!("CARGO_PKG_VERSION"), "
License: ", env!("CARGO_PKG_LICENSE"), "
",
);

/// clap command-line arguments build-time definitions.
#[derive(Parser, Debug)]
#[clap(
    about = "Store, read and clean up piggyback data relayed between monitored hosts.",
    name = "piggyback",
    version = env!("CARGO_PKG_VERSION"),
    after_help = CLI_HELP_AFTER,
    verbatim_doc_comment,
)]
struct CLI_Args {
    /// Directory of the payloads, one subdirectory per target host.
    #[clap(long, value_name = "DIR")]
    piggyback_dir: Option<PathBuf>,

    /// Directory of the status files, one per source host.
    #[clap(long, value_name = "DIR")]
    source_dir: Option<PathBuf>,

    /// Time setting [HOST:]KEY=VALUE, may be repeated.
    #[clap(short = 's', long = "setting", value_name = "SETTING")]
    settings: Vec<String>,

    /// Increase logging verbosity on STDERR: -v for info, -vv for debug.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: CLI_Command,
}

#[derive(Subcommand, Debug)]
enum CLI_Command {
    /// Store the piggybacked sections of the agent output of SOURCE.
    Store {
        source: String,
        /// Read the agent output from this file instead of STDIN.
        #[clap(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Write the usable payloads for TARGET.
    Get {
        target: String,
    },
    /// Remove outdated status files and payloads, and empty directories.
    Cleanup,
    /// List the source hosts with payloads for TARGET, or for any target.
    Sources {
        target: Option<String>,
    },
    /// List the target hosts with payloads from SOURCE, or from any source.
    Targets {
        source: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => ::log::LevelFilter::Error,
        1 => ::log::LevelFilter::Info,
        _ => ::log::LevelFilter::Debug,
    };
    ::env_logger::Builder::new()
        .filter_level(level)
        .target(::env_logger::Target::Stderr)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();
}

fn piggyback_paths(args: &CLI_Args) -> PiggybackPaths {
    let defaults = PiggybackPaths::from_omd_root(std::env::var_os("OMD_ROOT"));
    PiggybackPaths::new(
        args.piggyback_dir.clone().unwrap_or(defaults.piggyback_dir),
        args.source_dir.clone().unwrap_or(defaults.source_dir),
    )
}

fn print_names(names: &[String]) -> ::anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    for name in names.iter() {
        writeln!(stdout, "{}", name)?;
    }
    stdout.flush()?;

    Ok(())
}

fn run_main(args: &CLI_Args) -> ::anyhow::Result<()> {
    let paths = piggyback_paths(args);
    ::log::debug!("{:?}", paths);
    let time_settings = PiggybackTimeSettings::from_strs(&args.settings).context("invalid time setting")?;
    let now = SystemTime::now();

    match &args.command {
        CLI_Command::Store { source, input } => {
            let mut data: Vec<u8> = Vec::new();
            match input {
                Some(path) => {
                    data = std::fs::read(path).with_context(|| format!("cannot read {:?}", path))?;
                }
                None => {
                    std::io::stdin()
                        .lock()
                        .read_to_end(&mut data)
                        .context("cannot read STDIN")?;
                }
            }
            let sections = parse_piggyback_sections(&data);
            let stored = store_piggyback_raw_data(&paths, source, &sections)
                .with_context(|| format!("cannot store piggyback data of {:?}", source))?;
            ::log::info!("Stored {} payloads of {:?}", stored.len(), source);
        }
        CLI_Command::Get { target } => {
            let raw_datas = get_piggyback_raw_data(&paths, &time_settings, target, now)
                .with_context(|| format!("cannot read piggyback data for {:?}", target))?;
            let mut stdout = std::io::stdout().lock();
            for raw_data in raw_datas.iter() {
                eprintln!("{}: {} (status {})", raw_data.info.source, raw_data.info.message, raw_data.info.status);
                if raw_data.info.valid {
                    stdout.write_all(&raw_data.raw_data)?;
                }
            }
            stdout.flush()?;
        }
        CLI_Command::Cleanup => {
            let summary = cleanup_piggyback_files(&paths, &time_settings, now).context("cleanup failed")?;
            ::log::info!("{:?}", summary);
        }
        CLI_Command::Sources { target } => {
            print_names(&get_source_hostnames(&paths, target.as_deref())?)?;
        }
        CLI_Command::Targets { source } => {
            print_names(&get_piggybacked_hostnames(&paths, source.as_deref())?)?;
        }
    }

    Ok(())
}

pub fn main() -> ExitCode {
    let args = CLI_Args::parse();
    init_logging(args.verbose);
    defn!("{:?}", args);

    let exitcode = match run_main(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            e_err!("{:#}", err);
            ExitCode::FAILURE
        }
    };
    defx!("exitcode {:?}", exitcode);

    exitcode
}
