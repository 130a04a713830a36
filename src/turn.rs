use snapshot_store::VersionId;

pub type TurnId = u64;

/// Role of one chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
    /// Runtime fault reported by the sandboxed sketch.
    SystemFault,
    /// The AI call itself failed.
    Error,
    /// Snapshot of the draft taken automatically before a user message.
    ManualSnapshot,
}

/// One chat entry. `id`, `role` and (once set) `linked_version` are fixed;
/// text fields are patched incrementally while `streaming`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub id: TurnId,
    pub role: TurnRole,
    pub display_text: String,
    pub thinking_text: String,
    pub rendered_html: String,
    pub rendered_thinking_html: String,
    pub linked_version: Option<VersionId>,
    pub streaming: bool,
}

impl Turn {
    #[must_use]
    pub fn new(id: TurnId, role: TurnRole, display_text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            display_text: display_text.into(),
            thinking_text: String::new(),
            rendered_html: String::new(),
            rendered_thinking_html: String::new(),
            linked_version: None,
            streaming: false,
        }
    }

    #[must_use]
    pub fn streaming_assistant(id: TurnId) -> Self {
        Self {
            streaming: true,
            ..Self::new(id, TurnRole::Assistant, "")
        }
    }

    #[must_use]
    pub fn with_linked_version(mut self, version: VersionId) -> Self {
        self.linked_version = Some(version);
        self
    }
}
