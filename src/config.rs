//! Launcher configuration loaded from `parkease.toml`.
//!
//! [`LauncherConfig`] holds every tunable of the launch lifecycle. Keys
//! missing from the file fall back to defaults matching a stock ParkEase
//! checkout (`node backend/server.js` on port 3000). The environment variable
//! `PARKEASE_BACKEND_DIR` takes precedence over the file for the backend path.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "parkease.toml";
pub const BACKEND_DIR_ENV: &str = "PARKEASE_BACKEND_DIR";

/// Top-level launcher configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Runtime executable used for the version check and to run the server.
    pub runtime: String,

    /// Installer command line, run inside `backend_dir` when deps are missing.
    pub install_command: Vec<String>,

    /// Directory holding the server entry point.
    pub backend_dir: PathBuf,

    /// Server script, relative to `backend_dir`.
    pub entry_point: String,

    /// Directory whose presence under `backend_dir` means deps are installed.
    pub dependency_marker: String,

    pub host: String,
    pub port: u16,

    /// Pause after spawning before checking whether the child crashed.
    pub settle_delay_ms: u64,

    /// Readiness polls before giving up.
    pub max_attempts: u32,

    /// Timeout of each readiness request.
    pub request_timeout_ms: u64,

    /// Pause between failed readiness polls.
    pub retry_interval_ms: u64,

    /// Idle wait between exit checks while relaying output.
    pub output_poll_ms: u64,

    /// Grace period between SIGTERM and the forced kill.
    pub shutdown_timeout_ms: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            runtime: "node".to_string(),
            install_command: vec!["npm".to_string(), "install".to_string()],
            backend_dir: PathBuf::from("backend"),
            entry_point: "server.js".to_string(),
            dependency_marker: "node_modules".to_string(),
            host: "localhost".to_string(),
            port: 3000,
            settle_delay_ms: 3000,
            max_attempts: 10,
            request_timeout_ms: 5000,
            retry_interval_ms: 2000,
            output_poll_ms: 100,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl LauncherConfig {
    /// Loads `parkease.toml` from the current directory, or `path` when given.
    ///
    /// A missing default file yields defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(dir) = std::env::var(BACKEND_DIR_ENV)
            && !dir.is_empty()
        {
            config.backend_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Base URL of the server, e.g. `http://localhost:3000`.
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Root endpoint polled for readiness.
    pub fn health_url(&self) -> String {
        format!("{}/", self.server_url())
    }

    pub fn entry_path(&self) -> PathBuf {
        self.backend_dir.join(&self.entry_point)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.backend_dir.join(&self.dependency_marker)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn output_poll(&self) -> Duration {
        Duration::from_millis(self.output_poll_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = LauncherConfig::default();
        assert_eq!(config.runtime, "node");
        assert_eq!(config.install_command, vec!["npm", "install"]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.settle_delay(), Duration::from_secs(3));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.retry_interval(), Duration::from_secs(2));
        assert_eq!(config.output_poll(), Duration::from_millis(100));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn urls_are_built_from_host_and_port() {
        let config = LauncherConfig::default();
        assert_eq!(config.server_url(), "http://localhost:3000");
        assert_eq!(config.health_url(), "http://localhost:3000/");
    }

    #[test]
    fn paths_are_relative_to_backend_dir() {
        let config = LauncherConfig::default();
        assert_eq!(config.entry_path(), PathBuf::from("backend/server.js"));
        assert_eq!(config.marker_path(), PathBuf::from("backend/node_modules"));
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            runtime = "bun"
            port = 8080
            install_command = ["bun", "install"]
        "#;
        let config: LauncherConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runtime, "bun");
        assert_eq!(config.port, 8080);
        assert_eq!(config.install_command, vec!["bun", "install"]);
        assert_eq!(config.entry_point, "server.js");
        assert_eq!(config.max_attempts, 10);
    }

    #[test]
    fn load_reads_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "max_attempts = 4\nhost = \"127.0.0.1\"\n").unwrap();

        let config = LauncherConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.server_url(), "http://127.0.0.1:3000");
    }

    #[test]
    fn load_rejects_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = LauncherConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();
        assert!(LauncherConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn backend_dir_env_overrides_file_unless_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parkease.toml");
        std::fs::write(&path, "backend_dir = \"from-file\"\n").unwrap();

        // Only this test touches the variable.
        unsafe { std::env::set_var(BACKEND_DIR_ENV, "/srv/parkease/backend") };
        let overridden = LauncherConfig::load(Some(&path)).unwrap();
        unsafe { std::env::set_var(BACKEND_DIR_ENV, "") };
        let kept = LauncherConfig::load(Some(&path)).unwrap();
        unsafe { std::env::remove_var(BACKEND_DIR_ENV) };

        assert_eq!(overridden.backend_dir, PathBuf::from("/srv/parkease/backend"));
        assert_eq!(kept.backend_dir, PathBuf::from("from-file"));
    }
}
