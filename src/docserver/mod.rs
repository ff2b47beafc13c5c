//! JSON document store served over HTTP, backed by SQLite.
//!
//! `RemoteStore` is its client. Documents live in named collections and are
//! addressed as `/v1/{collection}/{id}`.

pub mod handlers;
pub mod models;
pub mod routes;

use anyhow::Result;
use std::sync::Arc;

use crate::database::{self, setup::init_schema};
use handlers::AppState;

/// Opens (creating if needed) the SQLite file and prepares the schema
pub fn open_state(database_path: &str) -> Result<Arc<AppState>> {
    let pool = database::create_pool(database_path)?;
    let mut conn = database::get_connection(&pool)?;
    init_schema(&mut conn)?;

    Ok(Arc::new(AppState { pool }))
}
