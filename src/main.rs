use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use perch::config::Config;
use perch::store::{DynStore, MemoryStore, MongoStore};
use perch::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("perch=info,tower_http=info")),
        )
        .init();

    let config = Config::load();

    let store: DynStore = match &config.mongo_uri {
        Some(uri) => {
            info!("connecting to MongoDB database {}", config.mongo_db);
            Arc::new(MongoStore::connect(uri, &config.mongo_db).await?)
        }
        None => {
            info!("PERCH_MONGO_URI not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    tokio::fs::create_dir_all(config.profile_image_dir()).await?;
    tokio::fs::create_dir_all(config.post_image_dir()).await?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    let state = AppState {
        store,
        config: Arc::new(config),
    };
    axum::serve(listener, app(state)).await?;
    Ok(())
}
