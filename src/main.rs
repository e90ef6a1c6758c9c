//! ARFurniture storefront API server

use anyhow::Result;
use arfurniture::api::{self, AppState};
use arfurniture::auth;
use arfurniture::config::Config;
use arfurniture::store::{AccountStore, CatalogStore, MemoryStore, PgStore};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (catalog, accounts): (Arc<dyn CatalogStore>, Arc<dyn AccountStore>) = match &config.database_url {
        Some(url) => {
            let store = Arc::new(PgStore::connect(url).await?);
            store.migrate().await?;
            (store.clone() as Arc<dyn CatalogStore>, store as Arc<dyn AccountStore>)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn CatalogStore>, store as Arc<dyn AccountStore>)
        }
    };

    if let Some(seed) = &config.admin_seed {
        auth::seed_admin(accounts.as_ref(), seed).await?;
    }

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, %url, "NATS unavailable, domain events will only be logged");
                None
            }
        },
        None => None,
    };

    let state = AppState::new(catalog, accounts, config.shop.clone(), config.upload_dir.clone()).with_nats(nats);
    let app = api::router(state).layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    let addr = config.socket_addr();
    tracing::info!("ARFurniture API listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
