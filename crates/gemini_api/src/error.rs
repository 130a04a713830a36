use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum GeminiApiError {
    MissingApiKey,
    InvalidBaseUrl(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    RetryExhausted {
        status: Option<StatusCode>,
        last_error: Option<String>,
    },
    StreamFailed {
        code: Option<i64>,
        message: String,
    },
    Unknown(String),
}

/// Structured error body returned by the Generative Language API:
/// `{"error": {"code": 429, "message": "...", "status": "RESOURCE_EXHAUSTED"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(rename = "error")]
    pub value: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub status: Option<String>,
}

impl ErrorPayloadFields {
    fn display_message(&self) -> Option<String> {
        let message = self.message.as_deref().and_then(non_empty_string)?;
        match self.status.as_deref().and_then(non_empty_string) {
            Some(status) => Some(format!("{message} ({status})")),
            None => Some(message.to_owned()),
        }
    }
}

impl fmt::Display for GeminiApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "API key is required"),
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::RetryExhausted { status, last_error } => {
                let status = status
                    .map(|status| status.as_u16().to_string())
                    .unwrap_or_else(|| "n/a".to_owned());
                write!(
                    f,
                    "retry exhausted after max attempts (status: {status}, last_error: {last_error:?})"
                )
            }
            Self::StreamFailed { code, message } => match code {
                Some(code) => write!(f, "stream failed ({code}): {message}"),
                None => write!(f, "stream failed: {message}"),
            },
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for GeminiApiError {}

impl From<reqwest::Error> for GeminiApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for GeminiApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Best-effort extraction of a human-readable message from an HTTP error body.
///
/// Unparsable bodies fall back to the raw body, and empty bodies fall back to
/// the status line's canonical reason.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let parsed = match serde_json::from_str::<ErrorPayload>(body) {
        Ok(payload) => payload,
        Err(_) => return fallback_message(status, body),
    };

    if let Some(message) = parsed.value.and_then(|error| error.display_message()) {
        return message;
    }

    fallback_message(status, body)
}

/// Best-effort extraction of a structured error payload embedded inside a
/// fault string, as SDK-style errors stringify the response body into their
/// message. Unparsable input returns the raw text unchanged.
pub fn extract_embedded_error_message(text: &str) -> String {
    for candidate in embedded_json_candidates(text) {
        if let Ok(payload) = serde_json::from_str::<ErrorPayload>(candidate) {
            if let Some(message) = payload.value.and_then(|error| error.display_message()) {
                return message;
            }
        }
    }

    text.to_string()
}

fn embedded_json_candidates(text: &str) -> Vec<&str> {
    let mut candidates = vec![text];
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            candidates.push(&text[start..=end]);
        }
    }
    candidates
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
