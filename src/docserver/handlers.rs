use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use log::{debug, error, warn};
use serde_json::Value;
use std::sync::Arc;

use crate::database::{
    self, DbConn, DbPool, documents,
    models::{PutMode, PutOutcome},
};
use crate::docserver::models::{DocumentEntry, DocumentList};

pub struct AppState {
    pub pool: DbPool,
}

/// Runs a database call on the blocking pool
async fn with_connection<T, F>(state: &AppState, f: F) -> Result<T>
where
    F: FnOnce(&mut DbConn) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = database::get_connection(&pool)?;
        f(&mut conn)
    })
    .await
    .context("Database task panicked")?
}

fn storage_error(e: anyhow::Error) -> Response {
    error!("Document server error: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage Error: {:#}", e)).into_response()
}

fn header_is_wildcard(headers: &HeaderMap, name: header::HeaderName) -> bool {
    headers
        .get(name)
        .is_some_and(|value| value.as_bytes() == b"*")
}

fn put_mode(headers: &HeaderMap) -> PutMode {
    if header_is_wildcard(headers, header::IF_NONE_MATCH) {
        PutMode::CreateOnly
    } else if header_is_wildcard(headers, header::IF_MATCH) {
        PutMode::UpdateOnly
    } else {
        PutMode::Upsert
    }
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
) -> Response {
    let name = collection.clone();
    let rows = match with_connection(&state, move |conn| documents::list_documents(conn, &name)).await
    {
        Ok(rows) => rows,
        Err(e) => return storage_error(e),
    };

    let documents = rows
        .into_iter()
        .filter_map(|doc| match serde_json::from_str::<Value>(&doc.body) {
            Ok(data) => Some(DocumentEntry { id: doc.id, data }),
            Err(e) => {
                warn!("Skipping unparsable document {}/{}: {}", collection, doc.id, e);
                None
            }
        })
        .collect();

    Json(DocumentList { documents }).into_response()
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    match with_connection(&state, move |conn| documents::get_document(conn, &collection, &id)).await
    {
        Ok(Some(doc)) => ([(header::CONTENT_TYPE, "application/json")], doc.body).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Document not found").into_response(),
        Err(e) => storage_error(e),
    }
}

pub async fn put_document(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(data): Json<Value>,
) -> Response {
    let mode = put_mode(&headers);
    let body = data.to_string();
    let key = format!("{}/{}", collection, id);

    let outcome = with_connection(&state, move |conn| {
        documents::put_document(conn, &collection, &id, &body, mode)
    })
    .await;

    match outcome {
        Ok(PutOutcome::Created) => {
            debug!("Created document {}", key);
            StatusCode::CREATED.into_response()
        }
        Ok(PutOutcome::Replaced) => {
            debug!("Replaced document {}", key);
            StatusCode::OK.into_response()
        }
        Ok(PutOutcome::PreconditionFailed) => StatusCode::PRECONDITION_FAILED.into_response(),
        Err(e) => storage_error(e),
    }
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let key = format!("{}/{}", collection, id);
    match with_connection(&state, move |conn| documents::delete_document(conn, &collection, &id))
        .await
    {
        Ok(true) => {
            debug!("Deleted document {}", key);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => (StatusCode::NOT_FOUND, "Document not found").into_response(),
        Err(e) => storage_error(e),
    }
}
