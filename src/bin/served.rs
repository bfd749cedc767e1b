use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use portfolio_store::config::Config;
use portfolio_store::engine::{LocalStorage, Persistence};
use portfolio_store::server::{self, ServerState};
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(author, version, about = "Reference HTTP content server", long_about = None)]
struct Args {
    /// Overrides PORTFOLIO_DATA_DIR.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Overrides PORTFOLIO_PORT.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = Config::from_env()?;

    let data_dir = args
        .data_dir
        .or(config.data_dir)
        .unwrap_or_else(|| PathBuf::from("data"));
    let port = args.port.unwrap_or(config.port);

    let persistence = Arc::new(Persistence::new(&data_dir)?);
    let initial_data = persistence.load_all()?;
    println!("Loaded {} storage keys from {}", initial_data.len(), data_dir.display());
    let storage = Arc::new(LocalStorage::new(initial_data, config.storage_quota, Some(persistence)));
    let state = ServerState::new(storage);

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        state.sessions.ensure_user("Admin", email, password)?;
        println!("Admin account {} is ready", email);
    }

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    println!("Portfolio content server listening on :{} (HTTP)", port);

    server::serve(listener, &state, async {
        let _ = signal::ctrl_c().await;
        println!("\nShutdown signal received. Exiting.");
    })
    .await?;

    Ok(())
}
