use clap::Parser;
use parkease::cli::IpCli;
use parkease::netinfo::NetworkReport;
use parkease::ui::Console;
use parkease::logging;

fn main() {
    let cli = IpCli::parse();
    logging::init(cli.verbose);

    let report = NetworkReport::gather(cli.port);
    tracing::debug!(?report, "network report gathered");
    Console::new().network_report(&report);
}
