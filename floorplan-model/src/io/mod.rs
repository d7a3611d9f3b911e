//! Dump/load of documents and entities.
//!
//! An entity dumps to an [`EntityRecord`]: its class tag, id, flags and
//! parent, plus one entry per field. State-backed fields are written as the
//! id of their StateField, whose value is written once into the document's
//! state table as a [`StateRecord`]. Two entities that shared a StateField
//! when dumped share one again after loading.
//!
//! Loading is best-effort: a record with an unknown class tag or malformed
//! shape is skipped and reported in the [`LoadReport`]; the rest of the
//! document still loads.

mod context;
mod dump;
mod load;
mod record;
mod restore;

pub use context::{LoadContext, LoadIssue, LoadOptions, LoadReport};
pub use dump::{DumpOptions, Dumper, dump_document, dump_entity};
pub use load::{Loader, load_document, load_entity, load_entity_value};
pub use record::{DocumentRecord, EntityRecord, FORMAT_VERSION, StateRecord};
pub use restore::{Snapshot, capture_snapshot, restore_snapshot};

use crate::document::Document;
use crate::error::ModelError;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Result type for dump/load operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur while dumping or loading.
#[derive(Debug, Error)]
pub enum IoError {
    /// Error from the model layer (unknown class, duplicate entity, ...).
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A record did not have the expected shape.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Dumps a document and writes it to `path` as pretty JSON.
pub fn save_document(doc: &Document, path: &Path, options: DumpOptions) -> IoResult<()> {
    let record = dump_document(doc, options)?;
    let json = serde_json::to_string_pretty(&record)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), entities = record.entities.len(), "Saved document");
    Ok(())
}

/// Reads a dumped document from `path` and loads it into `doc`.
pub fn load_document_file(
    doc: &mut Document,
    path: &Path,
    options: LoadOptions,
) -> IoResult<LoadReport> {
    let json = std::fs::read_to_string(path)?;
    let record: DocumentRecord = serde_json::from_str(&json)?;
    let report = load_document(doc, &record, options)?;
    info!(
        path = %path.display(),
        loaded = report.loaded.len(),
        issues = report.issues.len(),
        "Loaded document"
    );
    Ok(report)
}
