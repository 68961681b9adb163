//! Prerequisite checks run before the server is started.

use std::process::Stdio;

use tokio::process::Command;

use crate::config::LauncherConfig;
use crate::error::LaunchError;

/// Whether `CHECK_DEPS` found the dependencies or had to install them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepsStatus {
    Present,
    Installed,
}

/// Runs `<runtime> --version` and returns the reported version.
///
/// A runtime that cannot be spawned or exits non-zero counts as missing.
pub async fn check_runtime(runtime: &str) -> Result<String, LaunchError> {
    let missing = || LaunchError::RuntimeMissing {
        runtime: runtime.to_string(),
    };

    let output = Command::new(runtime)
        .arg("--version")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            tracing::debug!(runtime, error = %e, "runtime version check failed to spawn");
            missing()
        })?;

    if !output.status.success() {
        tracing::debug!(runtime, status = %output.status, "runtime version check exited non-zero");
        return Err(missing());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Installs dependencies unless the marker directory already exists.
///
/// The installer runs once, in the backend directory, with its output going
/// straight to the terminal. Dropping the future kills it.
pub async fn ensure_dependencies(config: &LauncherConfig) -> Result<DepsStatus, LaunchError> {
    if config.marker_path().is_dir() {
        return Ok(DepsStatus::Present);
    }

    let (program, args) = config
        .install_command
        .split_first()
        .ok_or_else(|| LaunchError::DependencyInstall {
            reason: "no install command configured".to_string(),
        })?;

    tracing::debug!(program, ?args, dir = %config.backend_dir.display(), "running installer");
    let status = Command::new(program)
        .args(args)
        .current_dir(&config.backend_dir)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|e| LaunchError::DependencyInstall {
            reason: format!("could not run `{program}`: {e}"),
        })?;

    if !status.success() {
        return Err(LaunchError::DependencyInstall {
            reason: format!("`{}` exited with {status}", config.install_command.join(" ")),
        });
    }

    Ok(DepsStatus::Installed)
}
