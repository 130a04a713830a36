use serde::{Deserialize, Serialize};

/// Terminal candidate state mapped from Gemini responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Blocklist,
    MalformedFunctionCall,
}

impl FinishReason {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "STOP" => Self::Stop,
            "MAX_TOKENS" => Self::MaxTokens,
            "SAFETY" => Self::Safety,
            "RECITATION" => Self::Recitation,
            "BLOCKLIST" => Self::Blocklist,
            "MALFORMED_FUNCTION_CALL" => Self::MalformedFunctionCall,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "STOP",
            Self::MaxTokens => "MAX_TOKENS",
            Self::Safety => "SAFETY",
            Self::Recitation => "RECITATION",
            Self::Blocklist => "BLOCKLIST",
            Self::MalformedFunctionCall => "MALFORMED_FUNCTION_CALL",
        }
    }

    /// True when the reason marks an ordinary, complete response.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// Stream event emitted by the parser after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeminiStreamEvent {
    /// Reasoning text delta (`parts[].thought == true`).
    ThoughtDelta { delta: String },
    /// Response text delta.
    TextDelta { delta: String },
    /// Candidate finished with an optional reason.
    Finished { reason: Option<FinishReason> },
    /// Structured in-stream error frame.
    Error {
        code: Option<i64>,
        message: Option<String>,
    },
}
