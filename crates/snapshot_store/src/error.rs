use thiserror::Error;

use crate::schema::VersionId;

#[derive(Debug, Error)]
pub enum SnapshotStoreError {
    #[error("no code version recorded with id {id}")]
    VersionNotFound { id: VersionId },
}
