//! Backend entry-point: loads settings, selects the item store, and serves
//! the dispatcher over HTTP.

mod server;

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use ledger_backend::domain::LedgerServices;
use ledger_backend::domain::ports::ItemStore;
use ledger_backend::inbound::http::health::HealthState;
use ledger_backend::outbound::memory::InMemoryItemStore;
use ledger_backend::outbound::redis::RedisItemStore;
use ledger_backend::settings::LedgerSettings;
use server::{ServerConfig, create_server};

async fn build_item_store(settings: &LedgerSettings) -> Result<Arc<dyn ItemStore>> {
    match settings.redis_store() {
        Some(config) => {
            let store = RedisItemStore::connect(config)
                .await
                .wrap_err("failed to build Redis connection pool")?;
            info!(namespace = settings.redis_namespace(), "using Redis item store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("LEDGER_REDIS_URL unset; using in-memory item store");
            Ok(Arc::new(InMemoryItemStore::new()))
        }
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        LedgerSettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let bind_addr = settings
        .bind_addr()
        .wrap_err("LEDGER_BIND_ADDR is not a socket address")?;

    let items = build_item_store(&settings).await?;
    let services = LedgerServices::new(items, Arc::new(DefaultClock));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, ServerConfig::new(bind_addr, services))
        .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, "ledger backend listening");
    server.await.wrap_err("server terminated abnormally")
}
