// src/readers/mod.rs

//! "Readers" for _lwlib_.
//!
//! ## Overview of readers
//!
//! * A [`LogfileProcessor`] drives a [`LogLineReader`] to derive
//!   [`OutputLine`s], one processor per logfile section.
//! * A `LogLineReader` reads raw bytes from a file and decodes them into
//!   [`LogLine`s].
//!
//! <br/>
//!
//! _These are not rust "Readers"; these structs do not implement the trait
//! [`Read`]. These are "readers" in an informal sense._
//!
//! [`Read`]: std::io::Read
//! [`LogLine`s]: crate::readers::loglinereader::LogLine
//! [`OutputLine`s]: crate::printer::printers::OutputLine
//! [`LogLineReader`]: crate::readers::loglinereader::LogLineReader
//! [`LogfileProcessor`]: crate::readers::logfileprocessor::LogfileProcessor

pub mod helpers;
pub mod logfileprocessor;
pub mod loglinereader;
