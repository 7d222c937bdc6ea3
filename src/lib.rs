pub mod api;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod ping;
pub mod state;
pub mod storage;
pub mod syndication;

use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use config::Settings;
use error::Result;
use state::AppState;

/// 数据库结构定义
pub const SCHEMA_FILE: &str = "sql/01-CREATE_TABLE.sql";

pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env("BLOGYALL_LOG"))
        .init();

    let settings = Settings::load()?;

    match settings.database_url.clone() {
        Some(url) => {
            let db = storage::init_db(&url).await?;
            storage::migrate(&db, SCHEMA_FILE).await?;
            tracing::info!("using postgres storage");

            api::run_server(AppState::new(db, settings)).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");

            api::run_server(AppState::new(storage::MemoryStore::new(), settings)).await
        }
    }
}
