//! invoiceweb main entry point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use invoiceweb_api::{start_server, AppState};
use invoiceweb_client::ApiClient;
use invoiceweb_config::{Config, ConfigError, SourceKind};
use invoiceweb_core::{Authenticator, MemoryStore, ResultCache, StaticAuthenticator};

#[derive(Parser, Debug)]
#[command(name = "invoiceweb")]
#[command(author = "invoiceweb Contributors")]
#[command(version = "0.1.0")]
#[command(about = "A lightweight invoicing administration web interface", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Write a default configuration file and exit
    #[arg(long)]
    init: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.init {
        std::fs::write(&args.config, Config::generate_default())
            .with_context(|| format!("Failed to write {}", args.config.display()))?;
        println!("Configuration written to {}", args.config.display());
        return Ok(());
    }

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&e);
            return Err(e.into());
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level)).init();
    log::info!(
        "Config loaded: data source={}, page size={}",
        config.data.source,
        config.page_size()
    );

    let rt = Runtime::new()?;
    rt.block_on(run(config))
}

async fn run(config: Config) -> anyhow::Result<()> {
    let cache = ResultCache::shared();
    cache.set_ttl(Duration::from_secs(config.cache.ttl_secs));

    let state = match config.data.source {
        SourceKind::Memory => {
            log::info!("Loading fixtures from {}", config.data.fixtures.display());
            let store = match MemoryStore::load(&config.data.fixtures).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    let details = e.to_details();
                    eprintln!("[ERROR] {}: {}", details.code, details.message);
                    for suggestion in &details.suggestions {
                        eprintln!("        hint: {}", suggestion);
                    }
                    return Err(e.into());
                }
            };
            let credentials = config
                .server
                .auth
                .as_ref()
                .map(|auth| (auth.username.clone(), auth.password.clone()));
            if credentials.is_none() {
                log::warn!("No credentials configured, private pages are open");
            }
            let auth: Arc<dyn Authenticator> = Arc::new(StaticAuthenticator::new(credentials));
            AppState::new(config, store.clone(), store, auth, cache)
        }
        SourceKind::Remote => {
            let client = Arc::new(ApiClient::new(&config.api)?);
            let auth: Arc<dyn Authenticator> = client.clone();
            AppState::new(config, client.clone(), client, auth, cache)
        }
    };

    start_server(state).await
}

fn report_config_error(error: &ConfigError) {
    let details = error.to_details();
    eprintln!("[ERROR] {}: {}", details.code, details.message);
    if let Some(field) = &details.field {
        eprintln!("        field: {}", field);
    }
    for suggestion in &details.suggestions {
        eprintln!("        hint: {}", suggestion);
    }
}
