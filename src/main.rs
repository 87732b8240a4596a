//! PkgBot configuration CLI entry point.

use clap::Parser;
use tracing_subscriber::util::SubscriberInitExt;

use pkgbot_config::cli::{Cli, Commands};
use pkgbot_config::infrastructure::logging::logger::bootstrap_subscriber;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `watch` installs the logger from the settings document instead
    if !matches!(cli.command, Commands::Watch) {
        bootstrap_subscriber(std::io::stderr).init();
    }

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Check(args) => pkgbot_config::cli::commands::check::execute(args, config, cli.json).await,
        Commands::Show(args) => pkgbot_config::cli::commands::show::execute(args, config, cli.json).await,
        Commands::Get(args) => pkgbot_config::cli::commands::get::execute(args, config, cli.json).await,
        Commands::Redact(args) => pkgbot_config::cli::commands::redact::execute(args, config, cli.json).await,
        Commands::Watch => pkgbot_config::cli::commands::watch::execute(config, cli.json).await,
    };

    if let Err(err) = result {
        pkgbot_config::cli::handle_error(err, cli.json);
    }
}
