//! claimdesk CLI
//!
//! Entry point for the claimdesk command-line tool:
//! - `serve`: the signed-in table editor for `claims` and `user_profiles`
//! - `fetch` / `upsert`: read and write rows as JSON
//! - `whoami`: check a token or credentials against the auth service
//! - `config`: show the effective configuration

use anyhow::Result;
use clap::{Parser, Subcommand};

use claimdesk_core::DeskConfig;

mod commands;
mod tracing_setup;

use commands::config::ConfigArgs;
use commands::serve::ServeArgs;
use commands::tables::{FetchArgs, UpsertArgs, WhoamiArgs};

#[derive(Parser, Debug)]
#[command(
    name = "claimdesk",
    author,
    version,
    about = "Edit claims and user profiles stored in Supabase",
    long_about = "Serve a signed-in web editor for the claims and user_profiles tables, \
                  or read and upsert their rows from the command line."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web editor
    Serve(ServeArgs),
    /// Print a table's rows as JSON
    Fetch(FetchArgs),
    /// Upsert rows from a JSON file
    Upsert(UpsertArgs),
    /// Show the signed-in user
    Whoami(WhoamiArgs),
    /// Show the effective configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_setup::init_tracing(&tracing_setup::TracingConfig { debug: cli.debug })?;

    let config = DeskConfig::load()?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, &config).await,
        Commands::Fetch(args) => commands::run_fetch(args, &config).await,
        Commands::Upsert(args) => commands::run_upsert(args, &config).await,
        Commands::Whoami(args) => commands::run_whoami(args, &config).await,
        Commands::Config(args) => commands::run_config(args, &config),
    }
}
