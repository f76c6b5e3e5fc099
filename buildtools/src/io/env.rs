//! Scoped environment variable changes.
//!
//! [`setup_env_vars`] applies a directive batch and returns the snapshot batch
//! that undoes it; [`restore_env_vars`] applies a snapshot. [`EnvScope`] ties
//! the two together so the restore runs when the scope ends, unwinding
//! included.

use std::ffi::{OsStr, OsString};

use anyhow::Result;
use tracing::{debug, warn};

use crate::core::env_vars::{EnvAction, EnvVarDirective, check_env_vars};
use crate::io::printer::Printer;

pub trait EnvStore {
    fn var(&self, name: &str) -> Option<OsString>;
    fn set_var(&self, name: &str, value: &OsStr);
    fn remove_var(&self, name: &str);
}

/// [`EnvStore`] backed by the process environment.
///
/// Not synchronized: callers must not use it from more than one thread, and
/// nothing else in the process may touch the environment while a batch is
/// applied or restored.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnv;

impl EnvStore for OsEnv {
    fn var(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    #[allow(unsafe_code)]
    fn set_var(&self, name: &str, value: &OsStr) {
        // SAFETY: `OsEnv` is only used from the build thread (see type docs).
        unsafe { std::env::set_var(name, value) };
    }

    #[allow(unsafe_code)]
    fn remove_var(&self, name: &str) {
        // SAFETY: `OsEnv` is only used from the build thread (see type docs).
        unsafe { std::env::remove_var(name) };
    }
}

/// Apply `directives` in order and return the snapshot batch that reverts them.
///
/// The whole batch is checked first; a rejected batch mutates nothing.
pub fn setup_env_vars(
    env: &dyn EnvStore,
    printer: &dyn Printer,
    directives: &[EnvVarDirective],
) -> Result<Vec<EnvVarDirective>> {
    if let Err(err) = check_env_vars(directives) {
        printer.println(&err.to_string());
        warn!(err = %err, "rejected environment batch");
        return Err(err);
    }
    let mut saved = Vec::with_capacity(directives.len());
    for directive in directives {
        let name = directive.name.as_str();
        let previous = env.var(name);
        match &previous {
            Some(value) => printer.println(&format!(
                "{name} was set to {}",
                value.to_string_lossy()
            )),
            None => printer.println(&format!("{name} was not set")),
        }
        saved.push(EnvVarDirective::snapshot(name, previous));
        match &directive.action {
            EnvAction::Set(value) => {
                printer.println(&format!("setting {name} to {}", value.to_string_lossy()));
                env.set_var(name, value);
            }
            EnvAction::Unset => {
                printer.println(&format!("unsetting {name}"));
                env.remove_var(name);
            }
        }
        debug!(name, "applied environment directive");
    }
    Ok(saved)
}

/// Apply a snapshot batch produced by [`setup_env_vars`].
pub fn restore_env_vars(env: &dyn EnvStore, printer: &dyn Printer, saved: &[EnvVarDirective]) {
    for snapshot in saved {
        let name = snapshot.name.as_str();
        match &snapshot.action {
            EnvAction::Set(value) => {
                printer.println(&format!(
                    "restoring (resetting): {name} <- {}",
                    value.to_string_lossy()
                ));
                env.set_var(name, value);
            }
            EnvAction::Unset => {
                printer.println(&format!("restoring (unsetting): {name}"));
                env.remove_var(name);
            }
        }
    }
}

/// Environment changes that last until the value is dropped.
#[must_use = "the environment is restored as soon as the scope is dropped"]
pub struct EnvScope<'a> {
    env: &'a dyn EnvStore,
    printer: &'a dyn Printer,
    saved: Vec<EnvVarDirective>,
}

impl<'a> EnvScope<'a> {
    pub fn enter(
        env: &'a dyn EnvStore,
        printer: &'a dyn Printer,
        directives: &[EnvVarDirective],
    ) -> Result<Self> {
        let saved = setup_env_vars(env, printer, directives)?;
        Ok(Self {
            env,
            printer,
            saved,
        })
    }
}

impl Drop for EnvScope<'_> {
    fn drop(&mut self) {
        restore_env_vars(self.env, self.printer, &self.saved);
    }
}
