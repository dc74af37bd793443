// auth-probe/src/main.rs
//! Drives the session coordinator from a terminal.
//!
//! ```bash
//! # Verify the stored credential with four bindings mounted at once
//! auth-probe verify --consumers 4
//!
//! # Store a credential and verify it
//! auth-probe sign-in <credential>
//!
//! # Print every view change, refreshing every 10 seconds
//! auth-probe watch --interval 10
//! ```

mod commands;

use clap::{Parser, Subcommand};
use common::{setup_tracing, Config};

use commands::Probe;

#[derive(Parser)]
#[command(name = "auth-probe")]
#[command(author, version, about = "Session coordinator probe")]
struct Cli {
    /// Path the simulated client is showing when the session resolves
    #[arg(long, global = true, default_value = "/dashboard")]
    path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the stored credential
    Verify {
        /// Number of bindings mounted concurrently
        #[arg(short, long, default_value_t = 1)]
        consumers: usize,
    },
    /// Verify, bypassing the cache
    Refresh,
    /// Store a credential and verify it
    SignIn {
        credential: String,
    },
    /// Remove the stored credential
    Logout,
    /// Show configuration and stored credential without calling the network
    Status,
    /// Mount one binding and print every view change until interrupted
    Watch {
        /// Seconds between forced refreshes, 0 to never refresh
        #[arg(short, long, default_value_t = 0)]
        interval: u64,
    },
}

#[actix::main]
async fn main() {
    setup_tracing();

    let cli = Cli::parse();
    let config = Config::from_env();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> Result<(), commands::ProbeError> {
    if let Commands::Status = cli.command {
        return commands::status(&config);
    }

    let probe = Probe::build(&config, &cli.path)?;
    match cli.command {
        Commands::Verify { consumers } => probe.verify(consumers).await,
        Commands::Refresh => probe.refresh().await,
        Commands::SignIn { credential } => probe.sign_in(credential).await,
        Commands::Logout => probe.logout().await,
        Commands::Watch { interval } => probe.watch(interval).await,
        Commands::Status => Ok(()),
    }
}
