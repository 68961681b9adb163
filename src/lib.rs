//! Operator tools for the ParkEase web application.
//!
//! - `parkease-ip` prints the machine's LAN address and the URL other
//!   devices should use ([`netinfo`]).
//! - `parkease-launch` checks prerequisites, starts the backend server,
//!   waits for it to answer, opens the browser and relays the server output
//!   until Ctrl-C ([`launcher`]).

pub mod cli;
pub mod config;
pub mod error;
pub mod launcher;
pub mod lifecycle;
pub mod logging;
pub mod netinfo;
pub mod supervisor;
pub mod ui;

pub use config::LauncherConfig;
pub use error::LaunchError;
pub use launcher::Launcher;
