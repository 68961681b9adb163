use clap::Parser;
use parkease::cli::LaunchCli;
use parkease::config::LauncherConfig;
use parkease::launcher::Launcher;
use parkease::logging;
use parkease::ui::Console;

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = LaunchCli::parse();
    logging::init(cli.verbose);
    let console = Console::new();

    console.banner("ParkEase Website Launcher");

    let mut config = match LauncherConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            console.fail(&format!("{e:#}"));
            return;
        }
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    tracing::debug!(?config, "configuration loaded");

    let mut launcher = match Launcher::new(config) {
        Ok(launcher) => launcher.open_browser(!cli.no_browser),
        Err(e) => {
            console.launch_error(&e);
            return;
        }
    };

    match launcher.run(ctrl_c()).await {
        Ok(report) => {
            if cli.verbose {
                console.launch_report(&report);
            }
        }
        Err(e) => {
            console.launch_error(&e);
            if cli.verbose {
                console.launch_report(&launcher.failure_report());
            }
        }
    }
    println!("\nGoodbye!");
}
