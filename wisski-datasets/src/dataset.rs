//! Per-bundle tabular datasets.
//!
//! A dataset is one CSV file named after its bundle. The header row is
//! mandatory; a `uri` column, when present, keys the rows. Multi-valued
//! cells hold values joined by an in-cell delimiter.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wisski_model::PathTree;

use crate::error::{DatasetError, DatasetResult};

/// Name of the column holding an entity's URI.
pub const URI_COLUMN: &str = "uri";

/// Default separator between values inside one cell.
pub const DEFAULT_DELIMITER: &str = "|";

/// What the column names of a CSV header refer to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderKind {
    /// Columns are named by field id.
    #[default]
    FieldId,
    /// Columns are named by path id and remapped to field ids.
    PathId,
}

/// One row of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularRow {
    pub uri: Option<String>,
    /// Field id to values, in column order.
    pub values: IndexMap<String, Vec<String>>,
}

impl TabularRow {
    pub fn new(uri: &str) -> Self {
        Self {
            uri: Some(uri.to_string()),
            values: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_values(mut self, field_id: &str, values: &[&str]) -> Self {
        self.values.insert(
            field_id.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn get(&self, field_id: &str) -> &[String] {
        self.values.get(field_id).map(Vec::as_slice).unwrap_or_default()
    }
}

/// The rows of one bundle.
#[derive(Debug, Clone, Default)]
pub struct TabularDataset {
    bundle_id: String,
    rows: Vec<TabularRow>,
    by_uri: HashMap<String, usize>,
}

impl TabularDataset {
    pub fn new(bundle_id: &str) -> Self {
        Self {
            bundle_id: bundle_id.to_string(),
            ..Self::default()
        }
    }

    /// Reads a dataset from a CSV file.
    ///
    /// With [`HeaderKind::PathId`] every column is renamed to the field id of
    /// its path; columns naming no path are skipped.
    pub fn read(
        path: &Path,
        bundle_id: &str,
        delimiter: &str,
        header_kind: HeaderKind,
        tree: &PathTree,
    ) -> DatasetResult<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

        let columns: Vec<Option<String>> = reader
            .headers()?
            .iter()
            .map(|header| column_field(header, header_kind, tree))
            .collect();

        let mut dataset = Self::new(bundle_id);
        for record in reader.records() {
            let record = record?;
            let mut row = TabularRow::default();
            for (column, cell) in columns.iter().zip(record.iter()) {
                let Some(column) = column else {
                    continue;
                };
                if column == URI_COLUMN {
                    row.uri = Some(cell.to_string()).filter(|uri| !uri.is_empty());
                } else {
                    row.values.insert(column.clone(), split_cell(cell, delimiter));
                }
            }
            dataset.insert(row);
        }

        debug!(
            bundle = %bundle_id,
            path = %path.display(),
            rows = dataset.len(),
            "read tabular dataset"
        );
        Ok(dataset)
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row. A row whose URI is already known does not replace the
    /// first one in URI lookups.
    pub fn insert(&mut self, row: TabularRow) {
        if let Some(uri) = &row.uri {
            self.by_uri.entry(uri.clone()).or_insert(self.rows.len());
        }
        self.rows.push(row);
    }

    pub fn row(&self, uri: &str) -> Option<&TabularRow> {
        self.by_uri.get(uri).map(|&i| &self.rows[i])
    }

    pub fn rows(&self) -> &[TabularRow] {
        &self.rows
    }

    /// Rows as flat `field_id -> values` maps, ready for `Entity::build`.
    pub fn flat_rows(&self) -> impl Iterator<Item = &IndexMap<String, Vec<String>>> + '_ {
        self.rows.iter().map(|row| &row.values)
    }
}

/// A set of datasets keyed by bundle id.
#[derive(Debug, Clone, Default)]
pub struct TabularDatasets {
    datasets: HashMap<String, TabularDataset>,
}

impl TabularDatasets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `<bundle>.csv` file of a directory.
    pub fn load_dir(
        dir: &Path,
        delimiter: &str,
        header_kind: HeaderKind,
        tree: &PathTree,
    ) -> DatasetResult<Self> {
        let mut datasets = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(bundle_id) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(path = %path.display(), "skipping CSV file with a non UTF-8 name");
                continue;
            };
            datasets.insert(TabularDataset::read(&path, bundle_id, delimiter, header_kind, tree)?);
        }
        Ok(datasets)
    }

    /// Adds a dataset, replacing any earlier one of the same bundle.
    pub fn insert(&mut self, dataset: TabularDataset) {
        self.datasets.insert(dataset.bundle_id.clone(), dataset);
    }

    pub fn get(&self, bundle_id: &str) -> Option<&TabularDataset> {
        self.datasets.get(bundle_id)
    }

    pub fn contains(&self, bundle_id: &str) -> bool {
        self.datasets.contains_key(bundle_id)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Looks up a dataset, failing with [`DatasetError::UnknownDataset`].
    pub fn require(&self, bundle_id: &str) -> DatasetResult<&TabularDataset> {
        self.get(bundle_id)
            .ok_or_else(|| DatasetError::UnknownDataset(bundle_id.to_string()))
    }
}

fn column_field(header: &str, header_kind: HeaderKind, tree: &PathTree) -> Option<String> {
    if header == URI_COLUMN {
        return Some(URI_COLUMN.to_string());
    }
    match header_kind {
        HeaderKind::FieldId => Some(header.to_string()),
        HeaderKind::PathId => {
            let field = tree.record(header).map(|record| record.field_id.clone());
            if field.is_none() {
                debug!(column = %header, "dropping column without a path");
            }
            field
        }
    }
}

/// Splits a cell into its values. An empty cell holds no values.
fn split_cell(cell: &str, delimiter: &str) -> Vec<String> {
    if cell.is_empty() {
        return Vec::new();
    }
    if delimiter.is_empty() {
        return vec![cell.to_string()];
    }
    cell.split(delimiter).map(str::to_string).collect()
}
