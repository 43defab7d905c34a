//! RBPortKiller CLI - Free ports held by stale processes
//!
//! A command-line tool for listing the processes that hold network ports
//! open and terminating them.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rbportkiller_core::{CancellationToken, ConfigStore, PortKillerService};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit code for an operation interrupted with Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(name = "rbportkiller")]
#[command(author, version, about = "Free ports held by stale processes")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List ports and the processes holding them
    #[command(alias = "ls")]
    List {
        /// Filter by port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Filter by process name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Match name, port, PID or address
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Terminate every process holding a port
    Kill {
        /// Port number to free
        port: u16,
    },

    /// Show current configuration
    Config,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ctrl-C received, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

fn config_store(path: Option<PathBuf>) -> anyhow::Result<ConfigStore> {
    Ok(match path {
        Some(path) => ConfigStore::with_path(path),
        None => ConfigStore::new()?,
    })
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = config_store(cli.config)?;
    let config = store.load().await?;

    if let Some(Commands::Config) = cli.command {
        return commands::config::show(&store, &config, cli.json);
    }

    let service = PortKillerService::for_current_platform(&config)?;
    let cancel = cancel_on_ctrl_c();

    match cli.command {
        Some(Commands::Kill { port }) => commands::kill::run(&service, &cancel, port, cli.json).await,
        Some(Commands::List { port, name, search }) => {
            let filter = commands::list::Filter { port, name, search };
            commands::list::run(&service, &cancel, &filter, cli.json).await
        }
        Some(Commands::Config) | None => {
            commands::list::run(&service, &cancel, &commands::list::Filter::default(), cli.json)
                .await
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let cancelled = e
                .downcast_ref::<rbportkiller_core::Error>()
                .is_some_and(|e| e.is_cancelled());
            if cancelled {
                eprintln!("Cancelled.");
                return ExitCode::from(EXIT_CANCELLED);
            }

            eprintln!("\x1b[31mError: {:#}\x1b[0m", e);
            ExitCode::FAILURE
        }
    }
}
