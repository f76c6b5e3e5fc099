//! Reusable build tasks for Go repositories.
//!
//! Each task shells out to an external tool (gofmt, go test, gocritic,
//! govulncheck, deadcode, ...) and reports pass/fail. The crate keeps a strict
//! separation:
//!
//! - **[`core`]**: Pure logic (file name safety, matchers, command lines,
//!   environment directives). No I/O.
//! - **[`io`]**: Collaborators with side effects (filesystem, environment,
//!   processes, console), each behind a trait so tests can swap in fakes.
//!
//! [`build::Build`] ties the collaborators to a validated working root;
//! [`directed::DirectedCommand`] runs one tool with a scoped environment;
//! [`tasks`] defines the task functions on top of both.

pub mod build;
pub mod core;
pub mod directed;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod tasks;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
