// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line driver for the shopfront session surface.

use clap::{Parser, Subcommand};
use tracing::error;

use shopfront::{ClientConfig, Session};

#[derive(Parser)]
#[command(name = "shopfront", about = "Storefront API client", version)]
struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the credential pair.
    Login {
        username: String,
        #[arg(long, env = "SHOPFRONT_PASSWORD")]
        password: String,
    },
    /// Create an account. Does not log in.
    Register {
        username: String,
        email: String,
        #[arg(long, env = "SHOPFRONT_PASSWORD")]
        password: String,
    },
    /// Fetch the authoritative profile.
    Whoami,
    /// Show local session state without a network call.
    Status,
    /// Drop stored credentials.
    Logout,
    /// GET an arbitrary API path (e.g. `/auth/me/`).
    Get { path: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // reqwest is built against the provider-less rustls backend; install the
    // ring provider once for the process.
    let _ = rustls::crypto::ring::default_provider().install_default();

    if let Err(e) = run(cli).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let session = Session::new(&cli.config);
    match cli.command {
        Command::Login { username, password } => {
            session.login(&username, &password).await?;
            println!("logged in as {username}");
        }
        Command::Register { username, email, password } => {
            let created = session.register(&username, &email, &password).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        Command::Whoami => match session.me().await {
            Ok(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
            Err(err) if err.requires_reauth() => {
                anyhow::bail!("session expired, log in again ({err})")
            }
            Err(err) => return Err(err.into()),
        },
        Command::Status => match session.current_user_hint() {
            Some(hint) => {
                let who = hint.username.or(hint.id).unwrap_or_else(|| "<unknown>".to_owned());
                match hint.exp {
                    Some(exp) => println!("logged in as {who} (access expires at epoch {exp})"),
                    None => println!("logged in as {who}"),
                }
            }
            None => println!("logged out"),
        },
        Command::Logout => {
            session.logout();
            println!("logged out");
        }
        Command::Get { path } => {
            let value = session.api().get_json(&path).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}
