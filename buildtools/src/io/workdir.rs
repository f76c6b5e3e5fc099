//! Working root discovery and the fatal-exit primitive.
//!
//! Every task runs relative to the working root, so a root that cannot be
//! trusted ends the process instead of letting tasks run in the wrong place.

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, instrument};

use crate::core::path::join_dir;
use crate::io::config::BuildConfig;
use crate::io::env::EnvStore;
use crate::io::fs::FileSystem;
use crate::io::printer::Printer;

/// Terminates the build.
pub trait Exit {
    fn exit(&self, code: i32) -> !;
}

/// [`Exit`] via `std::process::exit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl Exit for ProcessExit {
    fn exit(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}

/// Check that `candidate` is a directory holding a `marker` subdirectory.
pub fn check_working_dir(fs: &dyn FileSystem, candidate: &str, marker: &str) -> Result<()> {
    if candidate.is_empty() {
        bail!("code error: empty working directory candidate");
    }
    ensure_dir(fs, candidate)?;
    ensure_dir(fs, &join_dir(candidate, marker))
}

/// True if `candidate` cannot serve as the working root; the reason is printed
/// to the error stream.
pub fn unacceptable_working_dir(
    fs: &dyn FileSystem,
    printer: &dyn Printer,
    candidate: &str,
    marker: &str,
) -> bool {
    match check_working_dir(fs, candidate, marker) {
        Ok(()) => false,
        Err(err) => {
            printer.eprintln(&format!("{err:#}"));
            true
        }
    }
}

/// Pick the working root: the configured environment variable if set, else
/// the configured default, and validate it.
#[instrument(skip_all)]
pub fn resolve_working_dir(
    fs: &dyn FileSystem,
    env: &dyn EnvStore,
    config: &BuildConfig,
) -> Result<String> {
    let candidate = match env.var(&config.working_dir_var) {
        Some(raw) => {
            let dir = raw.into_string().map_err(|raw| {
                anyhow!("{} is not valid UTF-8: {raw:?}", config.working_dir_var)
            })?;
            debug!(var = %config.working_dir_var, dir = %dir, "working root from environment");
            dir
        }
        None => config.default_working_dir.clone(),
    };
    check_working_dir(fs, &candidate, &config.marker_dir)
        .with_context(|| format!("unacceptable working directory {candidate:?}"))?;
    info!(dir = %candidate, "resolved working root");
    Ok(candidate)
}

fn ensure_dir(fs: &dyn FileSystem, path: &str) -> Result<()> {
    let is_dir = fs
        .is_dir(path)
        .with_context(|| format!("validation error for {path:?}"))?;
    if !is_dir {
        bail!("not a directory: {path:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MapEnv, MemoryFileSystem, RecordingPrinter};

    fn repo_fs() -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        fs.mkdir_all("repo/.git");
        fs.mkdir_all("plain");
        fs.write_file("plain/.git", "gitdir: elsewhere");
        fs.write_file("file", "");
        fs
    }

    #[test]
    fn accepts_directory_with_marker() {
        let fs = repo_fs();
        let printer = RecordingPrinter::default();
        assert!(!unacceptable_working_dir(&fs, &printer, "repo", ".git"));
        assert!(printer.errors().is_empty());
    }

    #[test]
    fn rejects_bad_candidates() {
        let fs = repo_fs();
        for candidate in ["", "missing", "file", "plain"] {
            let printer = RecordingPrinter::default();
            assert!(
                unacceptable_working_dir(&fs, &printer, candidate, ".git"),
                "{candidate:?} should be unacceptable"
            );
            assert_eq!(printer.errors().len(), 1);
        }
    }

    #[test]
    fn honours_custom_marker() {
        let fs = repo_fs();
        fs.mkdir_all("hg/.hg");
        let printer = RecordingPrinter::default();
        assert!(!unacceptable_working_dir(&fs, &printer, "hg", ".hg"));
        assert!(unacceptable_working_dir(&fs, &printer, "hg", ".git"));
    }

    #[test]
    fn resolve_prefers_environment_override() {
        let fs = repo_fs();
        let env = MapEnv::from_pairs(&[("DIR", "repo")]);
        let dir = resolve_working_dir(&fs, &env, &BuildConfig::default()).expect("resolve");
        assert_eq!(dir, "repo");
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let fs = repo_fs();
        let env = MapEnv::default();
        let config = BuildConfig {
            default_working_dir: "repo".to_string(),
            ..BuildConfig::default()
        };
        let dir = resolve_working_dir(&fs, &env, &config).expect("resolve");
        assert_eq!(dir, "repo");
    }

    #[test]
    fn resolve_reports_unacceptable_override() {
        let fs = repo_fs();
        let env = MapEnv::from_pairs(&[("DIR", "plain")]);
        let err = resolve_working_dir(&fs, &env, &BuildConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("not a directory: \"plain/.git\""));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_rejects_non_utf8_override() {
        use std::os::unix::ffi::OsStrExt;

        let fs = repo_fs();
        let env = MapEnv::default();
        env.set_var("DIR", std::ffi::OsStr::from_bytes(b"re\xFFpo"));
        let err = resolve_working_dir(&fs, &env, &BuildConfig::default()).unwrap_err();
        assert!(err.to_string().contains("DIR is not valid UTF-8"));
    }
}
