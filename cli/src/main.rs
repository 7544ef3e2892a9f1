//! fleetops - endpoint agent lifecycle jobs for managed Macs

use clap::Parser;
use fleetops_cli::cli::Cli;
use fleetops_cli::output::json;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_mode = cli.json;

    match cli.run().await {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            let message = format!("{e:#}");
            match json::format_error(&message, "internal") {
                Ok(out) if json_mode => println!("{out}"),
                _ => eprintln!("Error: {message}"),
            }
            std::process::exit(1);
        }
    }
}
