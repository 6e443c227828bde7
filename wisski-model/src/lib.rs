//! Schema and entity model for WissKI clients.
//!
//! Defines the types every other crate of the workspace builds on:
//! - [`PathRecord`]: one path of a pathbuilder (a bundle group or a field)
//! - [`PathTree`]: the hierarchical schema index built from path records
//! - [`codec`]: field-type keyed conversion between scalars and wire values
//! - [`Entity`]: a bundle instance with nested sub-entities, serialized and
//!   loaded against a [`PathTree`], with modification tracking
//! - [`EntityPersister`]: the collaborator that stores entities remotely
//!
//! Everything here is synchronous and performs no I/O.

pub mod codec;
mod entity;
mod error;
mod pathbuilder;
mod persist;
mod record;
mod tree;

pub use codec::WISSKI_INDIVIDUAL;
pub use entity::{BUNDLE_KEY, ENTITY_KEY, Entity, FieldValue, URI_KEY, WISSKI_BUNDLE};
pub use error::{ModelError, ModelResult};
pub use pathbuilder::{PathbuilderRecord, flatten_paths};
pub use persist::EntityPersister;
pub use record::{FieldType, PathRecord, ROOT_ID, is_root_id};
pub use tree::{InsertReport, PathTree, TreeNode};
