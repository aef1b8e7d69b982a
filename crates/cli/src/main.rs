use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::process::ExitCode;
use stubres_domain::CliOverrides;
use tracing::info;

mod bootstrap;
mod commands;

#[derive(Parser)]
#[command(name = "stubres")]
#[command(version)]
#[command(about = "Asynchronous stub DNS resolver")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Nameserver to query instead of the configured ones (repeatable)
    #[arg(short = 'n', long = "nameserver", value_name = "ADDR")]
    nameservers: Vec<String>,

    /// Domain appended to names without a dot
    #[arg(short = 'd', long)]
    domain: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Print nameserver health after the lookups finish
    #[arg(long)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve names to addresses
    Lookup {
        #[arg(required = true)]
        names: Vec<String>,

        /// Ask for AAAA records instead of A
        #[arg(long)]
        aaaa: bool,
    },
    /// Resolve addresses to names, confirmed by a forward lookup
    Reverse {
        #[arg(required = true)]
        addresses: Vec<IpAddr>,
    },
    /// Show the nameservers, their timeout counters and the default domain
    Servers,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        nameservers: cli.nameservers.clone(),
        domain: cli.domain.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);

    info!("stubres v{}", env!("CARGO_PKG_VERSION"));

    let outcome = match cli.command {
        Command::Lookup { names, aaaa } => {
            commands::lookup(&config, &names, aaaa, cli.stats).await?
        }
        Command::Reverse { addresses } => {
            commands::reverse(&config, &addresses, cli.stats).await?
        }
        Command::Servers => {
            commands::servers(&config)?;
            commands::Outcome::AllResolved
        }
    };

    Ok(outcome.exit_code())
}
