mod error;
mod schema;
mod store;

pub use error::SnapshotStoreError;
pub use schema::{CodeOrigin, CodeVersion, VersionId};
pub use store::SnapshotStore;
