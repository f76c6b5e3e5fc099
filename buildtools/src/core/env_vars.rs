//! Environment variable directives.
//!
//! A directive batch describes the mutations to apply around one command; the
//! snapshot batch produced while applying it has the same shape and undoes it.

use std::collections::HashSet;
use std::ffi::OsString;

use anyhow::{Result, bail};

/// What to do with one variable. Values are kept as raw OS strings so a
/// snapshot restores exactly what was there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvAction {
    Set(OsString),
    Unset,
}

/// One intended (or recorded) variable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVarDirective {
    pub name: String,
    pub action: EnvAction,
}

impl EnvVarDirective {
    pub fn set(name: impl Into<String>, value: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            action: EnvAction::Set(value.into()),
        }
    }

    pub fn unset(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: EnvAction::Unset,
        }
    }

    /// Record a variable's current state: `Set` if defined, `Unset` otherwise.
    pub fn snapshot(name: impl Into<String>, current: Option<OsString>) -> Self {
        match current {
            Some(value) => Self::set(name, value),
            None => Self::unset(name),
        }
    }
}

/// Check a directive batch before anything is mutated.
///
/// Every name must be usable by the OS (non-empty, no `=` or NUL) and appear
/// at most once.
pub fn check_env_vars(batch: &[EnvVarDirective]) -> Result<()> {
    let mut seen = HashSet::new();
    for directive in batch {
        let name = directive.name.as_str();
        if name.is_empty() || name.contains(['=', '\0']) {
            bail!("code error: invalid environment variable name {name:?}");
        }
        if !seen.insert(name) {
            bail!("code error: detected attempt to set environment variable {name} twice");
        }
    }
    Ok(())
}
