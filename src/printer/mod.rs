// src/printer/mod.rs

//! The `printer` module is for writing the logwatch text protocol
//! ([`OutputLine`s] and section headers), with per-level color when
//! printing to a terminal, and for the [filters] applied to the lines of a
//! section before printing.
//!
//! [`OutputLine`s]: crate::printer::printers::OutputLine
//! [filters]: crate::printer::filters

pub mod filters;
pub mod printers;
