//! Document inspection behind the `floorplan-inspect` binary.

use anyhow::{Context, Result};
use floorplan_entities::builtin_registry;
use floorplan_model::Document;
use floorplan_model::io::{DumpOptions, LoadIssue, LoadOptions, LoadReport, load_document_file, save_document};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What `floorplan-inspect` found in one document.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct InspectReport {
    pub path: PathBuf,
    pub loaded: usize,
    pub live: usize,
    pub removed: usize,
    pub states: usize,
    /// Live entities per class tag.
    pub classes: BTreeMap<String, usize>,
    pub issues: Vec<LoadIssue>,
    pub failures: Vec<String>,
}

impl InspectReport {
    /// No skipped records and no verify failures.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.failures.is_empty()
    }
}

/// An empty document backed by the built-in entity classes.
pub fn new_document() -> Result<Document> {
    let registry = builtin_registry().context("Failed to register entity classes")?;
    Ok(Document::new(registry))
}

/// Loads the dump at `path` into a fresh document and verifies it.
pub fn inspect_file(path: &Path, options: LoadOptions) -> Result<(Document, InspectReport)> {
    let mut doc = new_document()?;
    let report = load_document_file(&mut doc, path, options)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    for issue in &report.issues {
        warn!(path = %path.display(), "{}", issue);
    }
    let summary = summarize(&doc, path, report);
    Ok((doc, summary))
}

/// Builds the report for an already loaded document.
#[must_use]
pub fn summarize(doc: &Document, path: &Path, report: LoadReport) -> InspectReport {
    let mut classes = BTreeMap::new();
    let mut removed = 0;
    for entity in doc.entities() {
        if entity.is_removed() {
            removed += 1;
        } else {
            *classes.entry(entity.class_tag().to_string()).or_insert(0) += 1;
        }
    }
    let failures = doc
        .verify_all()
        .iter()
        .map(ToString::to_string)
        .collect();

    InspectReport {
        path: path.to_path_buf(),
        loaded: report.loaded.len(),
        live: doc.len() - removed,
        removed,
        states: doc.states().len(),
        classes,
        issues: report.issues,
        failures,
    }
}

/// Writes `doc` back out to `out`.
pub fn redump(doc: &Document, out: &Path, options: DumpOptions) -> Result<()> {
    save_document(doc, out, options).with_context(|| format!("Failed to write {}", out.display()))?;
    info!(path = %out.display(), "Re-dumped document");
    Ok(())
}
