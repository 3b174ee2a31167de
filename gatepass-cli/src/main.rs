// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Gatepass CLI - resilient fetching through anti-bot walls.
//!
//! # Examples
//!
//! ```bash
//! # Fetch a page, remediating blocks with cached credentials
//! gatepass get https://site.example/page
//!
//! # Query parameters, headers, cookies
//! gatepass get https://site.example/list --param page=2 --header "Accept=text/html"
//!
//! # Form POST
//! gatepass post https://site.example/search --form q=title
//!
//! # JSON POST
//! gatepass post https://site.example/api --json '{"q": "title"}'
//!
//! # Store a login credential for a domain (login namespace)
//! gatepass creds set site.example --login --cookie session=abc123
//!
//! # Inspect and clear cached credentials
//! gatepass creds show site.example
//! gatepass creds clear site.example
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

// ============================================================================
// CLI Definition
// ============================================================================

/// Gatepass CLI - resilient fetching through anti-bot walls.
#[derive(Parser)]
#[command(name = "gatepass")]
#[command(about = "Fetch URLs through anti-bot challenges with credential caching")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v: info, -vv: debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override the credentials file path.
    #[arg(long, global = true)]
    pub credentials: Option<std::path::PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a URL with GET.
    Get(commands::GetArgs),
    /// Fetch a URL with POST.
    Post(commands::PostArgs),
    /// Manage stored credentials.
    Creds {
        /// Credential operation.
        #[command(subcommand)]
        command: commands::CredsCommand,
    },
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Get(args) => commands::get(args, cli.credentials).await,
        Commands::Post(args) => commands::post(args, cli.credentials).await,
        Commands::Creds { command } => commands::creds(command, cli.credentials).await,
    }
}

/// Installs the tracing subscriber. `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gatepass={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
