// src/lib.rs

//! Incrementally scan log files, classify new lines by pattern, and manage
//! piggyback data relayed between monitored hosts.
//!
//! _lwlib_ is the library behind the binaries `mk_logwatch`, the agent
//! plugin writing the `<<<logwatch>>>` section, and `piggyback`.
//!
//! Start at [`logwatch::run`] for the log scanner, and at [`piggyback`]
//! for piggyback data.

pub mod common;
pub mod config;
pub mod data;
pub mod debug;
pub mod logwatch;
pub mod piggyback;
pub mod printer;
pub mod readers;
pub mod state;
#[cfg(test)]
pub mod tests;
