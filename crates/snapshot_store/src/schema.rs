use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Identifier of one recorded code version.
///
/// Ids are unique within a store and monotonically increasing in append
/// order, so they double as a causal ordering of authoring actions.
pub type VersionId = u64;

/// Where a recorded code version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeOrigin {
    /// Snapshot promoted from a manually edited draft.
    UserEdit,
    /// Code extracted from an ordinary assistant response.
    AiResponse,
    /// Code extracted from an assistant turn that was asked to fix a
    /// sandbox-reported fault.
    AiFix,
}

/// One immutable recorded code artifact.
///
/// Versions are created, never mutated, and live for the process session
/// only; resetting the session discards them all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeVersion {
    pub id: VersionId,
    pub origin: CodeOrigin,
    pub code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{CodeOrigin, CodeVersion};

    #[test]
    fn version_serializes_with_snake_case_origin_and_rfc3339_timestamp() {
        let version = CodeVersion {
            id: 3,
            origin: CodeOrigin::AiFix,
            code: "new p5();".to_string(),
            created_at: datetime!(2026-02-14 00:00:00 UTC),
        };

        let json = serde_json::to_value(&version).expect("version should serialize");
        assert_eq!(json["origin"], "ai_fix");
        assert_eq!(json["created_at"], "2026-02-14T00:00:00Z");
        assert_eq!(json["code"], "new p5();");
    }
}
