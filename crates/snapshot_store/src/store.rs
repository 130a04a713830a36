use time::OffsetDateTime;

use crate::error::SnapshotStoreError;
use crate::schema::{CodeOrigin, CodeVersion, VersionId};

/// Ordered, append-only, in-memory store of immutable code versions.
///
/// There is no deletion or mutation operation; the only way state leaves the
/// store is [`SnapshotStore::clear`] on session reset. Callers never need
/// ordering guarantees beyond append order matching the causal order of
/// authoring actions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    versions: Vec<CodeVersion>,
    next_id: VersionId,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new immutable code version and returns its id.
    pub fn record(&mut self, origin: CodeOrigin, code: impl Into<String>) -> VersionId {
        let id = self.next_id;
        self.next_id += 1;

        self.versions.push(CodeVersion {
            id,
            origin,
            code: code.into(),
            created_at: OffsetDateTime::now_utc(),
        });

        id
    }

    /// Looks up a recorded version by id.
    pub fn get(&self, id: VersionId) -> Result<&CodeVersion, SnapshotStoreError> {
        self.versions
            .iter()
            .find(|version| version.id == id)
            .ok_or(SnapshotStoreError::VersionNotFound { id })
    }

    /// Returns all recorded versions in append order.
    #[must_use]
    pub fn versions(&self) -> &[CodeVersion] {
        &self.versions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Discards every recorded version. Ids are not reused within a process
    /// session, so stale references cannot resolve to a later recording.
    pub fn clear(&mut self) {
        self.versions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_assigns_unique_monotonic_ids() {
        let mut store = SnapshotStore::new();

        let first = store.record(CodeOrigin::AiResponse, "a");
        let second = store.record(CodeOrigin::UserEdit, "b");
        let third = store.record(CodeOrigin::AiFix, "c");

        assert!(first < second && second < third);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn get_round_trips_code_byte_for_byte() {
        let mut store = SnapshotStore::new();
        let code = "const sketch = (p) => {\n  p.setup = () => {};\n};\nnew p5(sketch);\n";

        let id = store.record(CodeOrigin::AiResponse, code);

        let version = store.get(id).expect("recorded version should resolve");
        assert_eq!(version.code, code);
        assert_eq!(version.origin, CodeOrigin::AiResponse);
    }

    #[test]
    fn get_unknown_id_reports_not_found() {
        let store = SnapshotStore::new();

        let error = store.get(99).expect_err("empty store has no versions");
        assert!(matches!(
            error,
            SnapshotStoreError::VersionNotFound { id: 99 }
        ));
    }

    #[test]
    fn clear_does_not_reuse_ids() {
        let mut store = SnapshotStore::new();
        let before = store.record(CodeOrigin::AiResponse, "a");
        store.clear();

        assert!(store.is_empty());
        let after = store.record(CodeOrigin::AiResponse, "b");
        assert!(after > before);
        assert!(store.get(before).is_err());
    }
}
