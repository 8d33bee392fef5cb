// src/tests/mod.rs

//! Tests for _lwlib_.
//!
//! Tests are placed at `src/tests/`, inside the `lwlib`. This is a
//! reasonable trade-off of separation and access.
//!
//! Tests placed at top-level path `tests/` do not have crate-internal
//! visibility. While it is recommended to not require internal visibility for
//! testing, in practice that often makes tests difficult or impossible to
//! implement.

pub mod cleanup_tests;
pub mod literal_tests;
pub mod options_tests;
pub mod parser_tests;
pub mod printers_tests;
pub mod statestore_tests;
