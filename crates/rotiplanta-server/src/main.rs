//! Roti Planta: nutrition and health assistant API server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rotiplanta_core::{RotiPlantaConfig, StoreConfig};
use rotiplanta_server::{build_router, AppState};
use rotiplanta_store::{FirestoreClient, ProfileStore};

fn resolve_data_dir() -> PathBuf {
    std::env::var("ROTIPLANTA_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_usage() {
    println!("Roti Planta — nutrition and health assistant API");
    println!();
    println!("Usage: rotiplanta [command]");
    println!();
    println!("Commands:");
    println!("  (none)            Start the server");
    println!("  lookup <email>    Print the stored profile for an email");
    println!("  help              Show this help message");
}

/// Print a profile summary; exits non-zero when there is none.
async fn lookup(email: &str) -> anyhow::Result<()> {
    let store = FirestoreClient::new(&StoreConfig::from_env()?);
    match store.find_by_email(email).await? {
        Some(profile) if !profile.is_empty() => {
            println!("Profile for {}", email);
            for line in rotiplanta_text::display_lines(&profile) {
                println!("  {}", line);
            }
            Ok(())
        }
        _ => {
            eprintln!("User not found: {}", email);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "lookup" => {
                let Some(email) = args.get(2) else {
                    eprintln!("Usage: rotiplanta lookup <email>");
                    std::process::exit(1);
                };
                return lookup(email).await;
            }
            "--help" | "-h" | "help" => {
                print_usage();
                return Ok(());
            }
            _ => {
                eprintln!(
                    "Unknown command: {}. Use 'rotiplanta help' for usage.",
                    args[1]
                );
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = RotiPlantaConfig::from_env(&data_dir)?;
    let port = config.port;
    if !config.cors_enabled {
        warn!("CORS disabled; browser clients on other origins will be refused");
    }

    let state = Arc::new(AppState::from_config(config));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Roti Planta server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
