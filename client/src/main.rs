//! Command-line front end for the Aerx session client.
//!
//! Each invocation restores the persisted wallet session from the data
//! directory, so a sign-in can be started with `login` and finished later with
//! `complete-sign-in` once the wallet redirects back.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aerx_client_lib::profile;
use aerx_client_lib::session::DEFAULT_CALLBACK_PATH;
use aerx_client_lib::{
    ClientConfig, ContractKind, LogNavigator, MemorySessionStore, NetworkEnvironment,
    ServiceSignerBinder, SessionManager, SessionOrchestrator, SessionStore,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network environment (production, development, betanet, local)
    #[arg(short, long)]
    env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Establish the session, bind all contracts and sync the profile
    Connect,
    /// Print the wallet URL that grants this client a key
    Login {
        #[arg(long, default_value = DEFAULT_CALLBACK_PATH)]
        callback: String,
    },
    /// Finish sign-in with the URL the wallet redirected to
    CompleteSignIn { url: String },
    /// Sign out and forget the delegated key
    Logout {
        #[arg(long, default_value = "/")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = ClientConfig::from_env().context("Failed to load configuration")?;
    if let Some(name) = &args.env {
        config = config.with_environment(name.parse::<NetworkEnvironment>()?);
    }
    let config = Arc::new(config);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level().to_lowercase().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let environment = config.environment_name();
    let store = Arc::new(MemorySessionStore::new());
    let navigator = Arc::new(LogNavigator::new());
    let manager = SessionManager::new(Arc::clone(&config), store.clone(), navigator.clone())?;

    match args.command {
        Command::Connect => {
            let binder =
                ServiceSignerBinder::new(Arc::clone(&config), manager.generation().clone());
            let orchestrator = SessionOrchestrator::new(manager, Arc::new(binder))?;
            let session = orchestrator
                .connect(&environment)
                .await
                .context("Session setup failed")?;

            println!("network:   {}", session.connection.network_id());
            match &session.account_id {
                Some(account_id) => println!("account:   {}", account_id),
                None => println!("account:   (not signed in; run `login`)"),
            }
            for kind in ContractKind::ALL {
                if let Some(handle) = store.contract(kind) {
                    println!("{:<9}  {}", format!("{}:", kind), handle.contract_id());
                }
            }

            match profile::sync(store.as_ref()).await {
                Ok(Some(view)) => println!("profile:   {}", serde_json::to_string_pretty(&view)?),
                Ok(None) => println!("profile:   none"),
                Err(err) => tracing::warn!("Profile sync failed: {}", err),
            }
        }
        Command::Login { callback } => {
            manager.establish(&environment).await?;
            let url = manager.request_sign_in(Some(&callback)).await?;
            println!("{}", url);
        }
        Command::CompleteSignIn { url } => {
            manager.establish(&environment).await?;
            let account_id = manager.complete_sign_in(&url)?;
            println!("Signed in as {}; run `connect` to bind contracts", account_id);
        }
        Command::Logout { path } => {
            manager.establish(&environment).await?;
            manager.sign_out(&path)?;
            if let Some(target) = navigator.last() {
                println!("Signed out; continue at {}", target);
            }
        }
    }

    Ok(())
}
