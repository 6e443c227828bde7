//! Tabular (CSV) storage of WissKI entities.
//!
//! Each bundle lives in its own `<bundle>.csv` file with a `uri` column first
//! and one column per field. Multi-valued cells join their values with an
//! in-cell delimiter (`|` by default). Columns of sub-bundle fields hold the
//! URIs of the referenced rows in the sub-bundle's file.
//!
//! [`TabularMapper`] builds entity graphs from loaded [`TabularDatasets`] and
//! flattens entity graphs back into appended rows.

mod dataset;
mod error;
mod mapper;

pub use dataset::{
    DEFAULT_DELIMITER, HeaderKind, TabularDataset, TabularDatasets, TabularRow, URI_COLUMN,
};
pub use error::{DatasetError, DatasetResult};
pub use mapper::TabularMapper;
