use crate::{Entity, PathTree};

/// The collaborator that owns persistence of entities.
///
/// Implementors transmit the serialized batch and, once the remote confirms
/// it, reload every entity from the returned representation with
/// `modified = false` so that server-assigned URIs and values become the
/// new persisted state.
pub trait EntityPersister {
    type Error;

    /// The schema entities are serialized against.
    fn tree(&self) -> &PathTree;

    /// Persists `entities` as a single batch. Either the whole batch
    /// succeeds or the call fails.
    fn persist(&self, entities: &mut [Entity], create_if_new: bool) -> Result<(), Self::Error>;
}
