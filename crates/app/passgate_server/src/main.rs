//! Passgate sign-in server binary.
//!
//! Serves local and OAuth sign-in, sliding session refresh and logout over
//! HTTP. Users come from a JSON file; OAuth providers from the environment.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use passgate_api::AppState;
use passgate_api::config::ApiConfig;
use passgate_core::auth::directory::{InMemoryDirectory, UnconfiguredExchange};
use passgate_core::auth::password::hash_password;
use passgate_core::auth::provider::ProviderRegistry;
use tracing::{info, warn};

/// CLI arguments for the sign-in server.
#[derive(Parser, Debug)]
#[command(name = "passgate_server", about = "Passgate sign-in server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:7000")]
    bind_addr: String,

    /// JSON array of user records (`email`, bcrypt `hash`, profile fields).
    #[arg(long, env = "USERS_FILE")]
    users_file: Option<PathBuf>,

    /// Token lifetime in seconds.
    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 1800)]
    token_ttl_secs: i64,

    /// Mark the session cookie `Secure` (serve behind HTTPS).
    #[arg(long, env = "COOKIE_SECURE", default_value_t = false)]
    cookie_secure: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the bcrypt hash of a password, for seeding the users file.
    HashPassword {
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Write logs to stderr so stdout stays clean for subcommand output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,passgate_api=debug,passgate_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    if let Some(Command::HashPassword { password }) = args.command {
        println!("{}", hash_password(&password)?);
        return Ok(());
    }

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        jwt_secret: passgate_core::auth::secret::resolve_signing_secret()?,
        token_ttl_secs: args.token_ttl_secs,
        cookie_secure: args.cookie_secure,
        users_file: args.users_file,
    };

    let directory = match &config.users_file {
        Some(path) => InMemoryDirectory::load(path)?,
        None => {
            warn!("no users file configured, local sign-in will reject everyone");
            InMemoryDirectory::new()
        }
    };
    info!(users = directory.len(), "loaded user directory");

    let providers = ProviderRegistry::from_env()?;
    let enabled: Vec<&str> = providers.providers().iter().map(|p| p.as_str()).collect();
    info!(?enabled, "OAuth providers");

    let state = AppState::new(
        config.clone(),
        providers,
        Arc::new(directory),
        Arc::new(UnconfiguredExchange),
    )?;
    let app = passgate_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, ttl_secs = config.token_ttl_secs, "sign-in API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
