// tripsearch - command-line client for the travel site's home page
//
// Architecture:
// - api: reqwest backend behind the `Backend` trait
// - suggest: debounced quick search and province lookup with a submit cache
// - history / auth / session: the page's side panels and local storage
// - cli: one subcommand per page interaction

mod cli;

use anyhow::Result;
use clap::Parser;

use tripsearch::config::Config;
use tripsearch::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // config --show / --path / --reset never touch the backend
    if cli::handle_config(&cli.command) {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let config = Config::from_env();

    // The guard must be kept alive for the duration of the program to ensure logs flush
    let _file_guard = logging::init_tracing(&config.logging);

    tracing::debug!("tripsearch {} starting", tripsearch::config::VERSION);

    cli::run(cli.command, config).await
}
