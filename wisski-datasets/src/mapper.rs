//! Mapping between entity graphs and per-bundle tabular files.

use std::fs::OpenOptions;
use std::path::Path;

use tracing::{debug, warn};
use wisski_model::{Entity, FieldValue, ModelError, PathRecord, PathTree};

use crate::dataset::{DEFAULT_DELIMITER, TabularDatasets, URI_COLUMN};
use crate::error::{DatasetError, DatasetResult};

/// Builds entities from tabular datasets and flattens them back into rows.
///
/// The path tree decides which columns reference sub-entities: a column of
/// a group path holds URIs into the dataset of the group's bundle.
#[derive(Debug, Clone)]
pub struct TabularMapper<'a> {
    tree: &'a PathTree,
    delimiter: String,
}

impl<'a> TabularMapper<'a> {
    pub fn new(tree: &'a PathTree) -> Self {
        Self::with_delimiter(tree, DEFAULT_DELIMITER)
    }

    pub fn with_delimiter(tree: &'a PathTree, delimiter: &str) -> Self {
        Self {
            tree,
            delimiter: delimiter.to_string(),
        }
    }

    pub fn tree(&self) -> &'a PathTree {
        self.tree
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Builds the entity of `bundle_id` stored under `uri`, with every
    /// referenced sub-entity built from its own dataset.
    pub fn build(&self, datasets: &TabularDatasets, bundle_id: &str, uri: &str) -> DatasetResult<Entity> {
        self.build_row(datasets, bundle_id, bundle_id, uri)
    }

    fn build_row(
        &self,
        datasets: &TabularDatasets,
        dataset: &str,
        bundle_id: &str,
        uri: &str,
    ) -> DatasetResult<Entity> {
        let row = datasets.require(dataset)?.row(uri).ok_or_else(|| {
            ModelError::MissingIdentifier(format!("no row `{uri}` in dataset `{dataset}`"))
        })?;

        let mut entity = Entity::new(bundle_id).with_uri(uri);
        for (field_id, values) in &row.values {
            let group = self.tree.get_path_for_id(field_id).filter(|path| path.is_group);
            let target = group.and_then(|path| sub_dataset(datasets, path).map(|name| (name, path)));

            match target {
                Some((dataset_name, path)) => {
                    let mut children = Vec::with_capacity(values.len());
                    for child_uri in values {
                        children.push(self.build_row(datasets, dataset_name, &path.bundle_id, child_uri)?);
                    }
                    entity.set_field(field_id, children);
                }
                None => entity.set_field(field_id, values.iter().cloned()),
            }
        }
        Ok(entity)
    }

    /// Builds one entity per row of the `bundle_id` dataset, in row order.
    pub fn build_all(&self, datasets: &TabularDatasets, bundle_id: &str) -> DatasetResult<Vec<Entity>> {
        let dataset = datasets.require(bundle_id)?;
        dataset
            .rows()
            .iter()
            .map(|row| {
                let uri = row.uri.as_deref().ok_or_else(|| {
                    ModelError::MissingIdentifier(format!("row without uri in dataset `{bundle_id}`"))
                })?;
                self.build(datasets, bundle_id, uri)
            })
            .collect()
    }

    /// Appends `entity` and its sub-entities to the bundle files in `dir`.
    ///
    /// Sub-entities are written before the row that references them. An
    /// existing file keeps its header; fields without a column are dropped.
    /// Returns the number of rows written.
    pub fn flatten(&self, entity: &Entity, dir: &Path) -> DatasetResult<usize> {
        let uri = entity.uri.as_deref().ok_or_else(|| {
            ModelError::MissingIdentifier(format!(
                "entity of bundle `{}` has no uri and cannot be flattened",
                entity.bundle_id
            ))
        })?;

        let mut written = 0;
        let mut cells: Vec<(&str, String)> = Vec::with_capacity(entity.fields.len());
        for (field_id, values) in &entity.fields {
            let path = self.tree.get_path_for_id(field_id);
            let cell = if path.is_some_and(|p| p.is_group) {
                let mut uris = Vec::with_capacity(values.len());
                for value in values {
                    let FieldValue::Entity(child) = value else {
                        return Err(mismatch(field_id, "sub-entities"));
                    };
                    written += self.flatten(child, dir)?;
                    uris.push(child.uri.as_deref().unwrap_or_default());
                }
                uris.join(self.delimiter.as_str())
            } else {
                let mut scalars = Vec::with_capacity(values.len());
                for value in values {
                    let FieldValue::Scalar(s) = value else {
                        return Err(mismatch(field_id, "a scalar value"));
                    };
                    scalars.push(s.as_str());
                }
                scalars.join(self.delimiter.as_str())
            };
            cells.push((field_id.as_str(), cell));
        }

        let file = dir.join(format!("{}.csv", entity.bundle_id));
        let existing_header = read_header(&file)?;
        let header: Vec<String> = match &existing_header {
            Some(header) => header.clone(),
            None => std::iter::once(URI_COLUMN.to_string())
                .chain(cells.iter().map(|(field_id, _)| field_id.to_string()))
                .collect(),
        };

        for (field_id, cell) in &cells {
            if !header.iter().any(|column| column.as_str() == *field_id) {
                warn!(
                    bundle = %entity.bundle_id,
                    field = %field_id,
                    dropped = %cell,
                    "field has no column in the existing file header"
                );
            }
        }

        let row: Vec<&str> = header
            .iter()
            .map(|column| {
                if column == URI_COLUMN {
                    uri
                } else {
                    cells
                        .iter()
                        .find(|(field_id, _)| *field_id == column.as_str())
                        .map(|(_, cell)| cell.as_str())
                        .unwrap_or_default()
                }
            })
            .collect();

        let handle = OpenOptions::new().create(true).append(true).open(&file)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(handle);
        if existing_header.is_none() {
            writer.write_record(&header)?;
        }
        writer.write_record(&row)?;
        writer.flush()?;

        debug!(bundle = %entity.bundle_id, uri = %uri, file = %file.display(), "wrote tabular row");
        Ok(written + 1)
    }
}

/// Header of an existing, non-empty bundle file.
fn read_header(file: &Path) -> DatasetResult<Option<Vec<String>>> {
    if !file.exists() {
        return Ok(None);
    }
    let mut reader = csv::Reader::from_path(file)?;
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    Ok(Some(header).filter(|h| !h.is_empty()))
}

/// The dataset a group column points into: named by the group's bundle,
/// or failing that by its field id.
fn sub_dataset<'p>(datasets: &TabularDatasets, path: &'p PathRecord) -> Option<&'p str> {
    [path.bundle_id.as_str(), path.field_id.as_str()]
        .into_iter()
        .find(|name| datasets.contains(name))
}

fn mismatch(field_id: &str, expected: &str) -> DatasetError {
    ModelError::SchemaTypeMismatch {
        field_id: field_id.to_string(),
        expected: expected.to_string(),
    }
    .into()
}
