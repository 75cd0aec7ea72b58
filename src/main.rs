//!
//! Demonstration runner for the ModFusion account directory.
//! Reads configuration from TOML file (~/.config/modfusion-accounts/config.toml).

use std::sync::Arc;

use tracing::{error, info};

use modfusion_accounts::{
    default_config_path, AccountStore, AppConfig, AuthService, JsonFileStorage,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("MODFUSION_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
                )
                .init();
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting ModFusion account directory...");
    info!("Data directory: {}", cfg.storage.data_dir.display());

    // ── Account store (seeds the protected administrator) ──────
    let storage = Arc::new(JsonFileStorage::new(cfg.storage.data_dir.clone()));
    let store = match AccountStore::open(storage, &cfg.admin).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open the account store: {}", e);
            return Err(e.into());
        }
    };
    info!(accounts = store.accounts().len(), "Directory ready");

    // ── Session resolution ─────────────────────────────────────
    let mut auth = AuthService::new(store);
    auth.initialize().await;

    match auth.current_account().await {
        Some(account) => {
            info!(email = %account.email, role = %account.role, "Active session restored")
        }
        None => info!("No active session"),
    }

    Ok(())
}
