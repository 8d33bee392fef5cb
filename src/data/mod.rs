// src/data/mod.rs

//! The `data` module holds the domain data of _lwlib_.
//!
//! ## Definitions of data
//!
//! ### Level
//!
//! A [`Level`] is the severity of one output line, written as a single letter
//! (`C`, `W`, `O`, `I`, `.`).
//!
//! ### Rule
//!
//! A [`ClassificationRule`] is one indented rule line of a logfile block,
//! plus the `A` (continuation) and `R` (rewrite) lines that follow it.
//! Compiled, it becomes a [`CompiledRule`].
//!
//! ### Section
//!
//! A [`LogfileSection`] is one monitored file after glob expansion. It
//! carries every rule of every block whose glob matched the file, and the
//! merged [`Options`] of those blocks.
//!
//! ### Literal
//!
//! A [`Literal`] is a value of the small literal language used by the state
//! file.
//!
//! [`Level`]: crate::data::level::Level
//! [`ClassificationRule`]: crate::data::rule::ClassificationRule
//! [`CompiledRule`]: crate::data::rule::CompiledRule
//! [`LogfileSection`]: crate::data::section::LogfileSection
//! [`Options`]: crate::config::options::Options
//! [`Literal`]: crate::data::literal::Literal

pub mod level;
pub mod literal;
pub mod rule;
pub mod section;
