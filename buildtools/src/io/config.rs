//! Build helper configuration, read from a TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::command_line::DEFAULT_DEADCODE_TEMPLATE;

/// Build helper configuration (TOML).
///
/// Every field has a default, so an empty or missing file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    /// Environment variable that overrides the working root.
    pub working_dir_var: String,

    /// Working root used when `working_dir_var` is unset.
    pub default_working_dir: String,

    /// Subdirectory that must exist in the working root.
    pub marker_dir: String,

    /// Fetch dependencies straight from their origin (`GOPROXY=direct`).
    pub aggressive: bool,

    /// Task names to skip; matched case-insensitively, surrounding whitespace
    /// ignored.
    pub disabled_tasks: Vec<String>,

    pub deadcode: DeadcodeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeadcodeConfig {
    /// Pass `-f='<template>'`.
    pub format: bool,
    /// Pass `-test`.
    pub include_tests: bool,
    pub template: String,
}

impl Default for DeadcodeConfig {
    fn default() -> Self {
        Self {
            format: true,
            include_tests: true,
            template: DEFAULT_DEADCODE_TEMPLATE.to_string(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            working_dir_var: "DIR".to_string(),
            default_working_dir: "..".to_string(),
            marker_dir: ".git".to_string(),
            aggressive: false,
            disabled_tasks: Vec::new(),
            deadcode: DeadcodeConfig::default(),
        }
    }
}

impl BuildConfig {
    pub fn validate(&self) -> Result<()> {
        if self.working_dir_var.trim().is_empty() {
            return Err(anyhow!("working_dir_var must not be empty"));
        }
        if self.default_working_dir.is_empty() {
            return Err(anyhow!("default_working_dir must not be empty"));
        }
        if self.marker_dir.trim().is_empty() {
            return Err(anyhow!("marker_dir must not be empty"));
        }
        if self.deadcode.format && self.deadcode.template.is_empty() {
            return Err(anyhow!(
                "deadcode.template must not be empty when deadcode.format is set"
            ));
        }
        Ok(())
    }

    /// True if `task` is listed in `disabled_tasks`.
    pub fn task_disabled(&self, task: &str) -> bool {
        let task = task.trim();
        self.disabled_tasks
            .iter()
            .any(|disabled| disabled.trim().eq_ignore_ascii_case(task))
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BuildConfig::default()`.
pub fn load_config(path: &Path) -> Result<BuildConfig> {
    if !path.exists() {
        let cfg = BuildConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BuildConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, BuildConfig::default());
    }

    #[test]
    fn serialized_config_loads_back() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("build.toml");
        let cfg = BuildConfig {
            aggressive: true,
            disabled_tasks: vec!["nilaway".to_string()],
            ..BuildConfig::default()
        };
        let contents = toml::to_string(&cfg).expect("serialize");
        fs::write(&path, contents).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("build.toml");
        fs::write(&path, "aggressive = true\n\n[deadcode]\ninclude_tests = false\n")
            .expect("write");

        let cfg = load_config(&path).expect("load");
        assert!(cfg.aggressive);
        assert!(!cfg.deadcode.include_tests);
        assert!(cfg.deadcode.format);
        assert_eq!(cfg.deadcode.template, DEFAULT_DEADCODE_TEMPLATE);
        assert_eq!(cfg.working_dir_var, "DIR");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("build.toml");
        fs::write(&path, "marker_dir = \"\"\n").expect("write");

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("marker_dir"));
    }

    #[test]
    fn empty_template_is_allowed_without_formatting() {
        let cfg = BuildConfig {
            deadcode: DeadcodeConfig {
                format: false,
                include_tests: true,
                template: String::new(),
            },
            ..BuildConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn task_disabled_ignores_case_and_whitespace() {
        let cfg = BuildConfig {
            disabled_tasks: vec![
                "task1".to_string(),
                " task2".to_string(),
                "NilAway ".to_string(),
            ],
            ..BuildConfig::default()
        };
        assert!(cfg.task_disabled("nilaway"));
        assert!(cfg.task_disabled("TASK2"));
        assert!(!cfg.task_disabled("lint"));
        assert!(!BuildConfig::default().task_disabled("nilaway"));
    }
}
