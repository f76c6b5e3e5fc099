//! Deterministic, pure logic shared by the build helpers.
//!
//! Core modules must be free of I/O side effects. They operate on strings and
//! in-memory values and return deterministic outputs suitable for tests.

pub mod command_line;
pub mod env_vars;
pub mod matchers;
pub mod output;
pub mod path;
