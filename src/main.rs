mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kith")]
#[command(about = "Administer a kith instance: identities, circles and calendar views")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure a user exists and mint a session token for them
    Auth {
        email: String,

        /// Full name used when the user does not exist yet
        #[arg(long)]
        name: Option<String>,
    },
    /// List the circles a session's user owns or has joined
    Circles {
        /// Session token minted by `kith auth`
        #[arg(long)]
        token: String,
    },
    /// Render a month of events as a calendar grid
    Month {
        /// YYYY-MM; defaults to the current month
        month: Option<String>,

        /// Session token minted by `kith auth`
        #[arg(long)]
        token: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Auth { email, name } => commands::auth::run(&email, name.as_deref()),
        Commands::Circles { token } => commands::circles::run(&token),
        Commands::Month { month, token } => commands::month::run(month.as_deref(), &token),
    }
}
