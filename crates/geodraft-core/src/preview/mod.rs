//! Preview mounting: a record's payload mirrored into an external index,
//! keyed by the class id field, guarded by a duplicate-id check.
//!
//! The index itself lives outside the core; [`PreviewIndex`] is the port the
//! core calls through.

mod duplicate;

pub use duplicate::{DuplicateCheck, DuplicateOutcome, LookupTicket};

use crate::layers::Record;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Preview mounting errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreviewError {
    #[error("Preview already mounted: {0}")]
    Duplicate(String),
    #[error("Record has no preview id: {0}")]
    MissingId(String),
    #[error("A duplicate check is still pending")]
    LookupPending,
    #[error("Preview index unavailable: {0}")]
    Unavailable(String),
}

/// Result type for preview operations.
pub type PreviewResult<T> = Result<T, PreviewError>;

/// Boxed future returned by index calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// External index holding preview mirrors.
pub trait PreviewIndex {
    /// Whether a mirror with this id is already mounted.
    fn exists(&self, id: &str) -> BoxFuture<'_, PreviewResult<bool>>;

    /// Store a mirror under `id`.
    fn put(&self, id: &str, payload: &Value) -> BoxFuture<'_, PreviewResult<()>>;
}

/// Key a record's preview is stored under: the value of its class id field.
pub fn preview_id(record: &Record) -> Option<String> {
    let field = record.class.schema().id_field?;
    match record.payload.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Mirror a record's payload. Fails if a mirror with the same id exists.
pub async fn mount_preview<I: PreviewIndex + ?Sized>(
    index: &I,
    record: &Record,
) -> PreviewResult<String> {
    let id = preview_id(record).ok_or_else(|| PreviewError::MissingId(record.id.to_string()))?;
    if index.exists(&id).await? {
        return Err(PreviewError::Duplicate(id));
    }
    index.put(&id, &record.payload).await?;
    log::info!("Mounted preview {id} for record {}", record.id);
    Ok(id)
}
