//! Blocking client for the WissKI pathbuilder and entity API.
//!
//! [`WisskiClient`] keeps the path tree combined from the active
//! pathbuilders and acts as the [`EntityPersister`](wisski_model::EntityPersister)
//! of entities mapped against it.

mod client;
mod config;
mod error;

pub use client::{COMBINED_TREE_ID, ImportMode, PathbuilderExport, WisskiClient};
pub use config::WisskiConfig;
pub use error::{ApiError, ApiResult};
