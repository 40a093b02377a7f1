use anyhow::Result;
use dotenvy::dotenv;
use nowplaying::cli::{self, Command};
use nowplaying::config::Config;
use nowplaying::favourites::FavouritesStore;
use nowplaying::storage::FileStore;
use nowplaying::tmdb::TmdbClient;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_result = dotenv();
    init_tracing();
    match dotenv_result {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let command = Command::parse(env::args().skip(1))?;
    let config = Config::from_env()?;
    let catalog = TmdbClient::from_config(&config)?;
    info!("Favourites stored in {}", config.data_dir.display());
    let favourites = FavouritesStore::new(FileStore::new(config.data_dir.clone()));

    let mut stdout = std::io::stdout().lock();
    cli::run(command, &catalog, &favourites, &mut stdout).await
}
