//! Process exit codes used by the build helpers.

/// The build cannot continue safely: no acceptable working root, or a file
/// name that could reach outside it.
pub const FATAL: i32 = 1;
