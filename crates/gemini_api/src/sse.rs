use serde_json::Value;

use crate::events::{FinishReason, GeminiStreamEvent};

/// Incremental parser for `alt=sse` response streams.
///
/// Each SSE frame's `data:` payload is one complete JSON
/// `GenerateContentResponse`; a single frame can yield several normalized
/// events (thought parts, text parts, a finish reason). Malformed payloads
/// are dropped rather than surfaced; the transport treats the stream as
/// best-effort and the caller's terminal-state tracking covers gaps.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: String,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<GeminiStreamEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut events = Vec::new();

        while let Some(split) = self.buffer.find("\n\n") {
            let frame = self.buffer[..split].to_string();
            self.buffer.drain(0..split + 2);

            if let Some(payload) = extract_data_payload(&frame) {
                if payload.is_empty() {
                    continue;
                }

                if let Ok(value) = serde_json::from_str::<Value>(&payload) {
                    map_events(&value, &mut events);
                }
            }
        }

        events
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<GeminiStreamEvent> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

fn map_events(value: &Value, events: &mut Vec<GeminiStreamEvent>) {
    if let Some(error) = value.get("error") {
        events.push(GeminiStreamEvent::Error {
            code: error.get("code").and_then(Value::as_i64),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .map(ToString::to_string),
        });
        return;
    }

    let Some(candidate) = value
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
    else {
        return;
    };

    if let Some(parts) = candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
    {
        for part in parts {
            let Some(text) = part.get("text").and_then(Value::as_str) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }

            let is_thought = part
                .get("thought")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if is_thought {
                events.push(GeminiStreamEvent::ThoughtDelta {
                    delta: text.to_owned(),
                });
            } else {
                events.push(GeminiStreamEvent::TextDelta {
                    delta: text.to_owned(),
                });
            }
        }
    }

    if let Some(reason) = candidate.get("finishReason").and_then(Value::as_str) {
        events.push(GeminiStreamEvent::Finished {
            reason: FinishReason::parse(reason),
        });
    }
}
