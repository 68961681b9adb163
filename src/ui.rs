//! Terminal output: banners, colored status lines and the readiness spinner.
//!
//! Uses `console` for styling and `indicatif` for the spinner shown while
//! the server is being polled. Everything meant for the user goes through
//! here; diagnostics go through `tracing`.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::LaunchError;
use crate::lifecycle::LaunchReport;
use crate::netinfo::NetworkReport;
use crate::supervisor::{OutputSource, ProbeResult};

const RULE_WIDTH: usize = 60;

/// Styled printer shared by both binaries.
pub struct Console {
    green: Style,
    red: Style,
    yellow: Style,
    cyan: Style,
    dim: Style,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan().bold(),
            dim: Style::new().dim(),
        }
    }

    pub fn rule(&self) {
        println!("{}", "=".repeat(RULE_WIDTH));
    }

    /// Title framed by rules.
    pub fn banner(&self, title: &str) {
        self.rule();
        println!("{}", self.cyan.apply_to(title));
        self.rule();
    }

    pub fn section(&self, title: &str) {
        println!("\n{}", self.cyan.apply_to(title));
    }

    pub fn ok(&self, msg: &str) {
        println!("{} {msg}", self.green.apply_to("✓"));
    }

    pub fn fail(&self, msg: &str) {
        println!("{} {msg}", self.red.apply_to("✗"));
    }

    pub fn warn(&self, msg: &str) {
        println!("{} {msg}", self.yellow.apply_to("⚠"));
    }

    pub fn info(&self, msg: &str) {
        println!("   {msg}");
    }

    /// One relayed line of server output.
    pub fn server_line(&self, source: OutputSource, line: &str) {
        match source {
            OutputSource::Stdout => println!("{line}"),
            OutputSource::Stderr => println!("{}", self.yellow.apply_to(line)),
        }
    }

    /// Prints a launch failure with its guidance and any captured output.
    pub fn launch_error(&self, err: &LaunchError) {
        println!();
        self.fail(&err.to_string());
        if let LaunchError::StartupFailed { stdout, stderr, .. } = err {
            println!("{}", self.dim.apply_to("STDOUT:"));
            println!("{}", stdout.trim_end());
            println!("{}", self.dim.apply_to("STDERR:"));
            println!("{}", stderr.trim_end());
        }
        if let Some(hint) = err.guidance() {
            println!("  {}", self.yellow.apply_to(hint));
        }
    }

    /// Success banner once the browser has been pointed at the server.
    pub fn running(&self, url: &str) {
        println!();
        self.rule();
        println!("{}", self.green.apply_to("ParkEase is now running!"));
        self.rule();
        println!("Website: {url}");
        println!("Press Ctrl+C to stop the server");
        self.rule();
        println!("\nServer output:");
        println!("{}", "-".repeat(40));
    }

    pub fn network_report(&self, report: &NetworkReport) {
        self.banner("ParkEase Network Access Information");

        match (report.address, report.lan_url(), report.qr_url()) {
            (Some(ip), Some(url), Some(qr)) => {
                println!("\nYour IP Address: {}", self.green.apply_to(ip));
                println!("Computer Name: {}", report.hostname);
                println!("\nServer URL for other devices:");
                self.info(&url);
                println!("\nTo access from other devices:");
                self.info("1. Make sure your device and their device are on the SAME network");
                self.info(&format!("2. They can access: {url}"));
                self.info("3. Or scan this QR code (if using mobile):");
                println!("\n   QR Code URL: {qr}");
                println!("\n{}", self.yellow.apply_to("Important Security Notes:"));
                self.info("- Only share within your local network");
                self.info("- Firewall may block connections (check your firewall settings)");
                self.info(&format!("- Make sure server is running on port {}", report.port));
            }
            _ => {
                self.fail("Could not determine your IP address");
                println!("\nAlternative methods:");
                self.info("• Windows: open Command Prompt and run: ipconfig");
                self.info("• Linux/macOS: run: ip addr (or ifconfig)");
                self.info("• Look for the 'IPv4 Address' of your network adapter");
                self.info(&format!("• Use that IP address with :{} port", report.port));
            }
        }
        self.rule();
    }

    /// Prints the lifecycle record as pretty JSON.
    pub fn launch_report(&self, report: &LaunchReport) {
        println!();
        println!("{}", self.dim.apply_to("─── Launch Record ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_default()
        );
    }
}

/// Spinner shown while waiting for the server to answer.
pub struct ReadinessProgress {
    pb: ProgressBar,
    yellow: Style,
}

impl ReadinessProgress {
    pub fn start(url: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Waiting for {url}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            yellow: Style::new().yellow(),
        }
    }

    /// Reports a failed attempt above the spinner.
    pub fn attempt(&self, attempt: u32, max: u32, result: &ProbeResult) {
        if let ProbeResult::NotReady(reason) = result {
            if attempt < max {
                self.pb.println(format!(
                    "  {} Attempt {attempt}/{max}: {reason}",
                    self.yellow.apply_to("↻")
                ));
            }
        }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}
