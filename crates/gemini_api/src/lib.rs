//! Streaming transport for the Gemini `streamGenerateContent` SSE endpoint.
//!
//! This crate owns the wire shapes and the stream loop only; translating
//! stream events into session semantics belongs to the provider adapter.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod payload;
pub mod retry;
pub mod sse;
pub mod url;

pub use client::{GeminiApiClient, StreamResult};
pub use config::GeminiApiConfig;
pub use error::{extract_embedded_error_message, parse_error_message, GeminiApiError};
pub use events::{FinishReason, GeminiStreamEvent};
pub use payload::{
    Content, GenerateContentRequest, GenerationConfig, Part, ThinkingConfig,
};
pub use retry::{is_retryable_http_error, retry_delay_ms, MAX_RETRIES};
pub use sse::SseStreamParser;
pub use url::{stream_generate_content_url, DEFAULT_GEMINI_BASE_URL};
