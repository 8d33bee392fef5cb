// src/debug/mod.rs

//! The `debug` module is macros for user-facing error printing, functions
//! for printing in debug builds, and helpers for test builds.

#[cfg(test)]
pub mod helpers;

pub mod printers;
