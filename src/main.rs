mod api;
mod auth;
mod config;
mod error;
mod health;
mod item;
mod util;

use crate::{api::app, config::Config, util::db_connect};
use color_eyre::eyre;
use poem::{listener::TcpListener, Server};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "api_backend=info,poem=info";

fn main() -> Result<(), eyre::Error> {
    // Lets get pretty error reports
    color_eyre::install()?;

    // Use async-friendly logging for Poem
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env()?;

    // One runtime worker per configured worker
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> Result<(), eyre::Error> {
    // Connect to DB and upgrade if needed.
    let pool = db_connect(&config.database_url).await?;

    let route = app(pool, config.jwt_key.as_bytes(), config.token_config);

    tracing::info!(
        web_url = %config.web_url,
        workers = config.workers,
        "starting api backend"
    );

    // Lets run our service
    Server::new(TcpListener::bind(config.web_url))
        .run(route)
        .await?;

    Ok(())
}
