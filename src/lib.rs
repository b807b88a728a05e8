use std::path::Path;
use std::sync::Arc;

use assets::AssetStore;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use setup::db_setup::CONNECTION_PRAGMAS;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Shared services handed to every handler alongside the pool and config.
pub struct AppState {
    pub asset_store: Arc<dyn AssetStore>,
    pub bcrypt_cost: u32,
    pub max_upload_bytes: u64,
}

/// Builds the connection pool. Every pooled connection gets the same pragmas,
/// so foreign keys and the busy timeout hold no matter which one a request draws.
pub fn build_pool(db_path: &Path) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));
    Pool::builder().build(manager)
}

pub mod assets;
pub mod config;
pub mod errors;
pub mod helper;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod setup;
