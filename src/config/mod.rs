// src/config/mod.rs

//! Configuration of _lwlib_.
//!
//! * [`environment`] resolves directories and the caller from environment
//!   variables, and which files to read and write.
//! * [`parser`] reads the configuration files into blocks.
//! * [`options`] parses the `key=value` tokens of a logfile block.

pub mod environment;
pub mod options;
pub mod parser;
