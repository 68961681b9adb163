//! Error taxonomy for the launcher.
//!
//! Every failure the launcher can hit is a [`LaunchError`] variant. The
//! binaries print the `Display` text plus [`LaunchError::guidance`] and then
//! return normally; none of these abort the process with a non-zero status.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{runtime} is not installed or not in PATH")]
    RuntimeMissing { runtime: String },

    #[error("Failed to install dependencies: {reason}")]
    DependencyInstall { reason: String },

    #[error("Server script not found at {}", path.display())]
    EntryPointMissing { path: PathBuf },

    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server failed to start ({status})")]
    StartupFailed {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    #[error("Server did not respond after {attempts} attempts")]
    ReadinessTimeout { attempts: u32 },

    #[error("Interrupted before the server was running")]
    Interrupted,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LaunchError {
    /// Follow-up hint shown under the error message, if the user can act on it.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            LaunchError::RuntimeMissing { .. } => {
                Some("Please install Node.js from https://nodejs.org/")
            }
            LaunchError::DependencyInstall { .. } => {
                Some("Run `npm install` inside the backend directory and check its output")
            }
            LaunchError::EntryPointMissing { .. } => {
                Some("Set `backend_dir` in parkease.toml or PARKEASE_BACKEND_DIR")
            }
            LaunchError::ReadinessTimeout { .. } => {
                Some("Make sure nothing else is bound to the server port")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_missing_display() {
        let err = LaunchError::RuntimeMissing {
            runtime: "node".into(),
        };
        assert_eq!(err.to_string(), "node is not installed or not in PATH");
        assert_eq!(
            err.guidance(),
            Some("Please install Node.js from https://nodejs.org/")
        );
    }

    #[test]
    fn readiness_timeout_display() {
        let err = LaunchError::ReadinessTimeout { attempts: 10 };
        assert_eq!(err.to_string(), "Server did not respond after 10 attempts");
    }

    #[test]
    fn entry_point_missing_shows_path() {
        let err = LaunchError::EntryPointMissing {
            path: PathBuf::from("backend/server.js"),
        };
        assert!(err.to_string().contains("backend/server.js"));
        assert!(err.guidance().is_some());
    }

    #[test]
    fn spawn_error_keeps_source() {
        use std::error::Error as _;
        let err = LaunchError::Spawn {
            program: "node".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Failed to spawn `node`"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LaunchError>();
    }
}
