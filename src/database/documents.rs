use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use super::connection::DbConn;
use super::models::{Document, PutMode, PutOutcome};

pub fn get_document(conn: &mut DbConn, collection: &str, id: &str) -> Result<Option<Document>> {
    let sql = "SELECT collection, id, body, updated_at FROM documents WHERE collection = ?1 AND id = ?2";

    conn.query_row(sql, params![collection, id], parse_document_row)
        .optional()
        .with_context(|| format!("Failed to query document {}/{}", collection, id))
}

pub fn list_documents(conn: &mut DbConn, collection: &str) -> Result<Vec<Document>> {
    let sql = "SELECT collection, id, body, updated_at FROM documents WHERE collection = ?1 ORDER BY id";

    let mut stmt = conn.prepare(sql).context("Failed to prepare document listing")?;
    let rows = stmt
        .query_map(params![collection], parse_document_row)
        .with_context(|| format!("Failed to list collection {}", collection))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("Failed to read documents of {}", collection))
}

/// Writes one document. The existence check and the write share an
/// immediate transaction, so two writers cannot both pass a `CreateOnly`
/// check.
pub fn put_document(
    conn: &mut DbConn,
    collection: &str,
    id: &str,
    body: &str,
    mode: PutMode,
) -> Result<PutOutcome> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("Failed to begin transaction")?;

    let exists: bool = tx
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE collection = ?1 AND id = ?2)",
            params![collection, id],
            |row| row.get(0),
        )
        .context("Failed to check document existence")?;

    let allowed = match mode {
        PutMode::Upsert => true,
        PutMode::CreateOnly => !exists,
        PutMode::UpdateOnly => exists,
    };
    if !allowed {
        return Ok(PutOutcome::PreconditionFailed);
    }

    tx.execute(
        "INSERT INTO documents (collection, id, body, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        params![collection, id, body, Utc::now()],
    )
    .with_context(|| format!("Failed to write document {}/{}", collection, id))?;
    tx.commit().context("Failed to commit document write")?;

    Ok(if exists {
        PutOutcome::Replaced
    } else {
        PutOutcome::Created
    })
}

/// `false` when there was no such document
pub fn delete_document(conn: &mut DbConn, collection: &str, id: &str) -> Result<bool> {
    let deleted = conn
        .execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )
        .with_context(|| format!("Failed to delete document {}/{}", collection, id))?;
    Ok(deleted > 0)
}

fn parse_document_row(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    Ok(Document {
        collection: row.get(0)?,
        id: row.get(1)?,
        body: row.get(2)?,
        updated_at: row.get(3)?,
    })
}
