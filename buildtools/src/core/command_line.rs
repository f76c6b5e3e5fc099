//! Command lines handed to the external executor.
//!
//! Fixed commands are constants; templated ones are assembled here so the
//! task functions only decide *which* command to run.

use crate::core::path::is_parent_dir;

pub const FORMAT: &str = "gofmt -e -l -s -w .";
pub const FORMAT_PREFIX: &str = "gofmt -e -l -s -w";
pub const GENERATE: &str = "go generate -x ./...";
pub const UNIT_TESTS: &str = "go test -cover ./...";
pub const LINT: &str = "gocritic check -enableAll ./...";
pub const NIL_AWAY: &str = "nilaway ./...";
pub const VULNERABILITY_CHECK: &str = "govulncheck -show verbose ./...";
pub const DEPENDENCY_FETCH: &str = "go get -u ./...";
pub const DEPENDENCY_TIDY: &str = "go mod tidy";

pub const LINT_PACKAGE: &str = "github.com/go-critic/go-critic/cmd/gocritic";
pub const NIL_AWAY_PACKAGE: &str = "go.uber.org/nilaway/cmd/nilaway";
pub const VULNERABILITY_PACKAGE: &str = "golang.org/x/vuln/cmd/govulncheck";
pub const DEADCODE_PACKAGE: &str = "golang.org/x/tools/cmd/deadcode";

/// Default `deadcode -f` template: package path, then one tab-indented line
/// per unreachable function.
pub const DEFAULT_DEADCODE_TEMPLATE: &str =
    r#"{{println .Path}}{{range .Funcs}}{{printf "\t%s\t%s\n" .Position .Name}}{{end}}{{println}}"#;

pub fn install_command(package: &str) -> String {
    format!("go install -v {package}@latest")
}

pub fn coverage_profile_command(coverage_file: &str) -> String {
    format!("go test -coverprofile={coverage_file} ./...")
}

pub fn coverage_report_command(coverage_file: &str) -> String {
    format!("go tool cover -html={coverage_file}")
}

/// `go doc` for one directory relative to the working root (`""` is the root).
pub fn doc_command(dir: &str) -> String {
    format!("go doc -all ./{dir}")
}

/// `deadcode [-f='<template>'] [-test] .`
pub fn deadcode_command(template: Option<&str>, include_tests: bool) -> String {
    let mut parts = vec!["deadcode".to_string()];
    if let Some(template) = template {
        parts.push(format!("-f='{template}'"));
    }
    if include_tests {
        parts.push("-test".to_string());
    }
    parts.push(".".to_string());
    parts.join(" ")
}

/// True if `dir` is `excluded` itself or nested under any of the exclusions.
pub fn is_excluded(dir: &str, exclusions: &[&str]) -> bool {
    exclusions
        .iter()
        .any(|excluded| is_parent_dir(dir, excluded))
}

/// `gofmt` over an explicit argument list.
///
/// The root directory (`""`) cannot be named without pulling in every
/// subdirectory, so it contributes its own files (`root_files`) instead.
/// Other directories are named unless excluded.
pub fn selective_format_command(
    relevant_dirs: &[String],
    root_files: &[String],
    exclusions: &[&str],
) -> String {
    let mut parts = vec![FORMAT_PREFIX.to_string()];
    for dir in relevant_dirs {
        if dir.is_empty() {
            parts.extend(root_files.iter().cloned());
        } else if !is_excluded(dir, exclusions) {
            parts.push(dir.clone());
        }
    }
    parts.join(" ")
}
