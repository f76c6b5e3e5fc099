//! File name predicates used to decide which directories a task touches.

/// Non-test Go source: ends in `.go`, not in `_test.go`, and does not start
/// with `testing`.
pub fn match_go_source(name: &str) -> bool {
    name.ends_with(".go") && !name.ends_with("_test.go") && !name.starts_with("testing")
}

/// Any Go file, tests included.
pub fn match_any_go_file(name: &str) -> bool {
    name.ends_with(".go")
}

/// The module descriptor, `go.mod`.
pub fn match_module_file(name: &str) -> bool {
    name == MODULE_FILE
}

pub const MODULE_FILE: &str = "go.mod";
