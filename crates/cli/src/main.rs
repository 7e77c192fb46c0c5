//! Chatbot Admin CLI - sign in and inspect clients from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Dry-run the allow-list gate (offline)
//! cba check -e admin@example.com --answer1 rex --answer2 luna
//!
//! # Sign in, show the session, sign out
//! cba login -e admin@example.com --answer1 rex --answer2 luna
//! cba status
//! cba logout
//!
//! # Inspect clients (requires an authorized session)
//! cba clients list
//! cba clients quota acme-support
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `status` - Manage the stored session
//! - `check` - Evaluate the allow-list gate without any network call
//! - `clients list` / `clients quota` - Read client configurations

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cba")]
#[command(author, version, about = "Chatbot admin CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with an email and the two security answers
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show the stored session and whether it is authorized
    Status,
    /// Run the allow-list gate only, without contacting the backend
    Check {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Inspect client configurations
    Clients {
        #[command(subcommand)]
        action: ClientsAction,
    },
}

#[derive(clap::Args)]
struct Credentials {
    /// Admin email address
    #[arg(short, long)]
    email: String,

    /// Name of a dog
    #[arg(long)]
    answer1: String,

    /// Name of a mutual best friend
    #[arg(long)]
    answer2: String,
}

#[derive(Subcommand)]
enum ClientsAction {
    /// List every client with its status
    List,
    /// Show a client's message quota
    Quota {
        /// Client id
        client_id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing (info by default so command output is visible)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Login { credentials } => {
            commands::auth::login(
                &credentials.email,
                &credentials.answer1,
                &credentials.answer2,
            )
            .await?;
        }
        Commands::Logout => commands::auth::logout().await?,
        Commands::Status => commands::auth::status().await?,
        Commands::Check { credentials } => {
            commands::auth::check(
                &credentials.email,
                &credentials.answer1,
                &credentials.answer2,
            )?;
        }
        Commands::Clients { action } => match action {
            ClientsAction::List => commands::clients::list().await?,
            ClientsAction::Quota { client_id } => commands::clients::quota(&client_id).await?,
        },
    }
    Ok(())
}
