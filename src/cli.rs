//! Command-line interfaces of the two binaries, built on clap.
//!
//! Both run with no arguments; every flag is optional.

use std::path::PathBuf;

use clap::Parser;

/// Show this machine's LAN address so other devices can reach ParkEase.
#[derive(Debug, Parser)]
#[command(name = "parkease-ip", version, about)]
pub struct IpCli {
    /// Port the ParkEase server listens on.
    #[arg(long, default_value_t = 3000)]
    pub port: u16,

    /// Enable debug logging.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

/// Start the ParkEase server, wait for it, and open it in the browser.
#[derive(Debug, Parser)]
#[command(name = "parkease-launch", version, about)]
pub struct LaunchCli {
    /// Configuration file (defaults to ./parkease.toml when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the configured server port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Do not open a browser tab once the server is up.
    #[arg(long, default_value_t = false)]
    pub no_browser: bool,

    /// Enable debug logging and print the launch record on exit.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn ip_cli_runs_without_arguments() {
        let cli = IpCli::parse_from(["parkease-ip"]);
        assert_eq!(cli.port, 3000);
        assert!(!cli.verbose);
    }

    #[test]
    fn ip_cli_parses_flags() {
        let cli = IpCli::parse_from(["parkease-ip", "--port", "8080", "-v"]);
        assert_eq!(cli.port, 8080);
        assert!(cli.verbose);
    }

    #[test]
    fn launch_cli_runs_without_arguments() {
        let cli = LaunchCli::parse_from(["parkease-launch"]);
        assert!(cli.config.is_none());
        assert!(cli.port.is_none());
        assert!(!cli.no_browser);
        assert!(!cli.verbose);
    }

    #[test]
    fn launch_cli_parses_flags() {
        let cli = LaunchCli::parse_from([
            "parkease-launch",
            "--config",
            "ops/parkease.toml",
            "--port",
            "4000",
            "--no-browser",
            "--verbose",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("ops/parkease.toml")));
        assert_eq!(cli.port, Some(4000));
        assert!(cli.no_browser);
        assert!(cli.verbose);
    }

    #[test]
    fn launch_cli_rejects_positional_arguments() {
        assert!(LaunchCli::try_parse_from(["parkease-launch", "extra"]).is_err());
    }

    #[test]
    fn cli_verify() {
        IpCli::command().debug_assert();
        LaunchCli::command().debug_assert();
    }
}
