use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use unitshell_api::ApiServer;
use unitshell_config::{ConfigManager, ServerConfig};
use unitshell_permissions::{Identity, JwtIdentityProvider, Permission};

/// Interactive shells on application units over WebSocket
#[derive(Parser, Debug)]
#[command(name = "unitshell-api")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the server
    Serve {
        /// Configuration file (default: ./unitshell.toml if present)
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Mint a bearer token for the JWT provider
    Token {
        /// HS256 secret shared with the server
        #[arg(long)]
        secret: String,

        /// Subject the token identifies
        #[arg(long)]
        subject: String,

        /// Granted permission, `scheme[@context]`; repeatable
        #[arg(long = "permission", value_name = "SCHEME[@CONTEXT]", required = true)]
        permissions: Vec<String>,

        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl_secs: i64,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Configuration file (default: ./unitshell.toml if present)
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    manager
        .load()
        .with_context(|| format!("loading {}", manager.config_path().display()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let config = load_config(config)?;

            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
                )
                .with_target(false)
                .init();

            let server = ApiServer::from_config(&config)?;
            let listener = TcpListener::bind(config.bind_addr()?)
                .await
                .with_context(|| format!("binding {}", config.bind))?;
            server.serve_with_shutdown(listener, shutdown_signal()).await?;
        }
        Commands::Token {
            secret,
            subject,
            permissions,
            ttl_secs,
        } => {
            let permissions = permissions
                .iter()
                .map(|p| p.parse::<Permission>())
                .collect::<Result<Vec<_>, _>>()?;
            let identity = Identity::new(subject, permissions);
            let token = JwtIdentityProvider::new(&secret)
                .issue(&identity, Utc::now() + Duration::seconds(ttl_secs))?;
            println!("{token}");
        }
        Commands::Config { config } => {
            print!("{}", load_config(config)?.to_toml()?);
        }
    }

    Ok(())
}
