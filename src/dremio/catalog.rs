//! Catalog path resolution
//!
//! Walks the catalog one container at a time. At depth `n` the child whose
//! `path` equals the first `n` segments of the target is selected; no
//! partial or case-insensitive matching is done.

use super::client::DremioClient;
use super::error::{DremioError, Result};
use super::models::CatalogEntry;
use super::transport::Transport;
use crate::config::Settings;
use std::fmt;

pub const DATASET_ENTITY_TYPE: &str = "dataset";

/// Ordered catalog path, e.g. `space.folder.folder.dataset`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPath {
    segments: Vec<String>,
}

impl DatasetPath {
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(DremioError::Config("dataset path has no segments".into()));
        }
        Ok(DatasetPath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First `depth` segments
    pub fn prefix(&self, depth: usize) -> &[String] {
        &self.segments[..depth.min(self.segments.len())]
    }

    /// Double-quoted SQL reference: `"a"."b"."c"`
    pub fn to_sql_reference(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("\"{}\"", s.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// `SELECT *` over the whole dataset
    pub fn select_all_sql(&self) -> String {
        format!("SELECT * FROM {}", self.to_sql_reference())
    }
}

impl fmt::Display for DatasetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Resolve `target` to its dataset catalog entry (with `fields`)
pub async fn resolve_dataset<T: Transport>(
    client: &DremioClient<T>,
    settings: &Settings,
    target: &DatasetPath,
) -> Result<CatalogEntry> {
    let roots = client.list_catalog(settings).await?;
    let mut current_id = find_child(&roots, target.prefix(1))
        .ok_or_else(|| not_found(target, 1))?
        .id
        .clone();

    for depth in 2..=target.segments().len() {
        let container = client.get_catalog(settings, &current_id).await?;
        let children = container.children.unwrap_or_default();
        current_id = find_child(&children, target.prefix(depth))
            .ok_or_else(|| not_found(target, depth))?
            .id
            .clone();
        tracing::debug!("Resolved {} -> {}", target.prefix(depth).join("."), current_id);
    }

    let entry = client.get_catalog(settings, &current_id).await?;
    match entry.entity_type.as_deref() {
        Some(DATASET_ENTITY_TYPE) => Ok(entry),
        Some(other) => Err(DremioError::NotADataset {
            path: target.to_string(),
            entity_type: other.to_string(),
        }),
        None => Err(DremioError::Protocol(format!(
            "catalog entry for {} did not include entityType",
            target
        ))),
    }
}

fn find_child<'a>(entries: &'a [CatalogEntry], path: &[String]) -> Option<&'a CatalogEntry> {
    entries.iter().find(|entry| entry.path == path)
}

fn not_found(target: &DatasetPath, depth: usize) -> DremioError {
    DremioError::CatalogPathNotFound(target.prefix(depth).join("."))
}
