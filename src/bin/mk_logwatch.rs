// src/bin/mk_logwatch.rs

//! Driver program _mk_logwatch_ drives the [_lwlib_] log scanner.
//!
//! Run by the monitoring agent, it writes the `<<<logwatch>>>` section to
//! STDOUT: for every configured log file, the lines added since the last
//! run that matched a pattern, together with their context.
//!
//! The agent passes the address of the calling monitoring server in
//! environment variable `REMOTE` (or `REMOTE_ADDR`). Every caller gets its
//! own state file, so several monitoring servers may poll one host.
//!
//! All logging goes to STDERR, STDOUT carries only the protocol.
//!
//! [_lwlib_]: lwlib

#![allow(non_camel_case_types)]

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use ::anyhow::Context;
use ::clap::Parser;
use ::const_format::concatcp;
use ::termcolor::BufferedStandardStream;

use ::lwlib::config::environment::{Environment, CONFIG_DIR_GLOB, CONFIG_FILE_NAME, STATE_FILE_NAME};
use ::lwlib::debug::printers::e_err;
use ::lwlib::logwatch::{run, RunOptions, RunSummary};
use ::lwlib::printer::printers::{color_choice, PrinterLogwatch};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

#[cfg(debug_assertions)]
const CLI_HELP_AFTER_NOTE_DEBUG: &str = "\nDEBUG BUILD";
#[cfg(not(debug_assertions))]
const CLI_HELP_AFTER_NOTE_DEBUG: &str = "";

/// `--help` _afterword_ message.
const CLI_HELP_AFTER: &str = concatcp!(
    "\
Configuration is read from $MK_CONFDIR/", CONFIG_FILE_NAME, " and
$MK_CONFDIR/", CONFIG_DIR_GLOB, ", in that order. A block starts with a
line of file name glob patterns and options, followed by indented pattern
lines:

    /var/log/messages /var/log/syslog* maxlines=1000 overflow=W
     C fail.*disk
     W warn
     A ^\\s+at\\s
     I ignore me
     R reformatted: \\1

Pattern levels are C (critical), W (warning), O (ok), I (ignore).
An A line following a pattern line selects continuation lines; an R line
rewrites the matched line.

Offsets are kept in $MK_VARDIR/", STATE_FILE_NAME, "[.<caller>].
Without a state record a file is only read from the next run on, unless
option fromstart=true is set.

---

Version: ", env!("CARGO_PKG_VERSION"), "
MSRV: ", env!("CARGO_PKG_RUST_VERSION"), "
License: ", env!("CARGO_PKG_LICENSE"), "
",
    CLI_HELP_AFTER_NOTE_DEBUG,
);

/// clap command-line arguments build-time definitions.
#[derive(Parser, Debug)]
#[clap(
    about = env!("CARGO_PKG_DESCRIPTION"),
    name = "mk_logwatch",
    version = concatcp!(
        "Version: ",
        env!("CARGO_PKG_VERSION"), "\n",
        "MSRV: ", env!("CARGO_PKG_RUST_VERSION"), "\n",
        "License: ", env!("CARGO_PKG_LICENSE"), "\n",
    ),
    after_help = CLI_HELP_AFTER,
    verbatim_doc_comment,
)]
struct CLI_Args {
    /// Raise errors instead of reporting them in the output. Read never
    /// seen files from the start. Do not write the state file.
    #[clap(short = 'd', long, verbatim_doc_comment)]
    debug: bool,

    /// Read only this configuration file.
    #[clap(short = 'c', long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Do not write the state file.
    #[clap(long = "no_state", alias = "no-state")]
    no_state: bool,

    /// Increase logging verbosity on STDERR: -v for info, -vv for debug.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Log level for the `-v` count.
fn log_level(
    verbose: u8,
    debug: bool,
) -> ::log::LevelFilter {
    if debug {
        return ::log::LevelFilter::Debug;
    }
    match verbose {
        0 => ::log::LevelFilter::Error,
        1 => ::log::LevelFilter::Info,
        _ => ::log::LevelFilter::Debug,
    }
}

fn init_logging(level: ::log::LevelFilter) {
    ::env_logger::Builder::new()
        .filter_level(level)
        .target(::env_logger::Target::Stderr)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();
}

fn run_main(args: &CLI_Args) -> ::anyhow::Result<RunSummary> {
    let env = Environment::from_env();
    ::log::debug!("{:?}", env);
    let run_options = RunOptions {
        debug: args.debug,
        config: args.config.clone(),
        no_state: args.no_state,
    };
    let stdout = BufferedStandardStream::stdout(color_choice(env.stdout_is_tty));
    let mut printer = PrinterLogwatch::new(stdout, env.stdout_is_tty);
    let summary = run(&env, &run_options, &mut printer).context("logwatch run failed")?;
    printer.flush().context("cannot write to STDOUT")?;

    Ok(summary)
}

pub fn main() -> ExitCode {
    let args = CLI_Args::parse();
    init_logging(log_level(args.verbose, args.debug));
    defn!("{:?}", args);

    let exitcode = match run_main(&args) {
        Ok(summary) => {
            ::log::info!("{:?}", summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            e_err!("{:#}", err);
            ExitCode::FAILURE
        }
    };
    defx!("exitcode {:?}", exitcode);

    exitcode
}
