use std::io;
use std::process::Stdio;

use tokio::process::Command;

/// Opens a URL for the user.
pub trait BrowserOpener {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Hands the URL to the platform's default-browser launcher without waiting
/// for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        opener_command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
    }
}

fn opener_command(url: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        // The empty argument is the window title `start` expects first.
        cmd.args(["/C", "start", "", url]);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_uses_xdg_open() {
        let cmd = opener_command("http://localhost:3000");
        let std_cmd = cmd.as_std();
        assert_eq!(std_cmd.get_program(), "xdg-open");
        let args: Vec<_> = std_cmd.get_args().collect();
        assert_eq!(args, vec!["http://localhost:3000"]);
    }
}
