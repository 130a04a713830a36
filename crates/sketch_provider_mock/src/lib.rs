//! Deterministic mock implementation of the shared `sketch_provider` contract.
//!
//! This crate contains no transport/protocol logic and is intended for local
//! development and contract-level integration testing.

use sketch_provider::{ProviderProfile, RunEvent, RunRequest, SketchProvider, StreamPart};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// One scripted fragment replayed by [`MockProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptPart {
    Thought(String),
    Text(String),
}

impl ScriptPart {
    #[must_use]
    pub fn thought(text: impl Into<String>) -> Self {
        Self::Thought(text.into())
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Deterministic scripted provider used by `sketch_studio` tests and local runs.
///
/// Script fragments are re-emitted token-by-token on whitespace boundaries so
/// hosts exercise their incremental-accumulation paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProvider {
    script: Vec<ScriptPart>,
}

impl MockProvider {
    #[must_use]
    pub fn new(script: Vec<ScriptPart>) -> Self {
        Self { script }
    }

    /// A provider whose single turn starts and then fails with the given
    /// error, for exercising the error path.
    #[must_use]
    pub fn failing(error: impl Into<String>) -> FailingProvider {
        FailingProvider {
            error: error.into(),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(vec![
            ScriptPart::thought("The user wants a small sketch. A centered shape with a plain background keeps the code short.\n"),
            ScriptPart::thought("Instance mode keeps the sketch out of the global scope, so construct the program object explicitly.\n"),
            ScriptPart::text("Here is a sketch that draws a red circle in the middle of the canvas.\n\n"),
            ScriptPart::text("```javascript\nconst sketch = (p) => {\n  p.setup = () => {\n    p.createCanvas(400, 400);\n  };\n  p.draw = () => {\n    p.background(240);\n    p.fill(255, 0, 0);\n    p.noStroke();\n    p.circle(p.width / 2, p.height / 2, 120);\n  };\n};\n\nnew p5(sketch);\n```\n\n"),
            ScriptPart::text("The circle is redrawn every frame, so you can ask for animation next.\n"),
        ])
    }
}

impl SketchProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: "mock".to_string(),
        }
    }

    fn run(&self, req: RunRequest, emit: &mut dyn FnMut(RunEvent)) -> Result<(), String> {
        let run_id = req.run_id;
        let _ = req.messages;
        let _ = req.instructions;

        emit(RunEvent::Started { run_id });

        for part in &self.script {
            let (text, build): (&str, fn(String) -> StreamPart) = match part {
                ScriptPart::Thought(text) => (text, StreamPart::Thought),
                ScriptPart::Text(text) => (text, StreamPart::Text),
            };

            for token in split_on_whitespace_boundaries(text) {
                emit(RunEvent::Part {
                    run_id,
                    part: build(token),
                });
            }
        }

        emit(RunEvent::Finished { run_id });
        Ok(())
    }
}

/// Provider whose single turn always fails, for error-path testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailingProvider {
    error: String,
}

impl SketchProvider for FailingProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: "mock-failing".to_string(),
        }
    }

    fn run(&self, req: RunRequest, emit: &mut dyn FnMut(RunEvent)) -> Result<(), String> {
        emit(RunEvent::Started { run_id: req.run_id });
        emit(RunEvent::Failed {
            run_id: req.run_id,
            error: self.error.clone(),
        });
        Ok(())
    }
}

fn split_on_whitespace_boundaries(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut pending = String::new();

    for ch in text.chars() {
        pending.push(ch);
        if matches!(ch, ' ' | '\n') {
            tokens.push(std::mem::take(&mut pending));
        }
    }

    if !pending.is_empty() {
        tokens.push(pending);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_events(provider: &dyn SketchProvider) -> Vec<RunEvent> {
        let mut events = Vec::new();
        provider
            .run(
                RunRequest {
                    run_id: 7,
                    messages: vec![sketch_provider::ChatMessage::user("make a red circle")],
                    instructions: "system instructions".to_string(),
                },
                &mut |event| events.push(event),
            )
            .expect("mock run should succeed");
        events
    }

    fn joined(events: &[RunEvent], want_thought: bool) -> String {
        events
            .iter()
            .filter_map(|event| match event {
                RunEvent::Part {
                    part: StreamPart::Thought(text),
                    ..
                } if want_thought => Some(text.as_str()),
                RunEvent::Part {
                    part: StreamPart::Text(text),
                    ..
                } if !want_thought => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn profile_exposes_explicit_mock_provider_identity() {
        let profile = MockProvider::default().profile();

        assert_eq!(profile.provider_id, MOCK_PROVIDER_ID);
        assert_eq!(profile.model_id, "mock");
    }

    #[test]
    fn run_emits_started_parts_and_finished() {
        let provider = MockProvider::new(vec![
            ScriptPart::thought("one two"),
            ScriptPart::text("three four"),
        ]);

        let events = collect_events(&provider);

        assert!(matches!(events.first(), Some(RunEvent::Started { run_id: 7 })));
        assert!(matches!(events.last(), Some(RunEvent::Finished { run_id: 7 })));
        assert!(events.iter().any(|event| matches!(
            event,
            RunEvent::Part {
                part: StreamPart::Thought(text),
                ..
            } if !text.is_empty()
        )));
    }

    #[test]
    fn token_splitting_preserves_text_byte_for_byte() {
        let provider = MockProvider::new(vec![
            ScriptPart::thought("weighing two\napproaches "),
            ScriptPart::text("chose the simpler\none"),
        ]);

        let events = collect_events(&provider);

        assert_eq!(joined(&events, true), "weighing two\napproaches ");
        assert_eq!(joined(&events, false), "chose the simpler\none");
    }

    #[test]
    fn default_script_contains_a_fenced_sketch() {
        let events = collect_events(&MockProvider::default());
        let text = joined(&events, false);

        assert!(text.contains("```javascript\n"));
        assert!(text.contains("new p5(sketch);"));
        assert!(text.contains("\n```"));
    }

    #[test]
    fn failing_provider_ends_with_failed_event() {
        let events = collect_events(&MockProvider::failing("quota exhausted"));

        assert!(matches!(events.first(), Some(RunEvent::Started { run_id: 7 })));
        assert!(matches!(
            events.last(),
            Some(RunEvent::Failed { run_id: 7, error }) if error == "quota exhausted"
        ));
    }
}
