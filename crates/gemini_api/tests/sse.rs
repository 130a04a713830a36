use gemini_api::{FinishReason, GeminiStreamEvent, SseStreamParser};

#[test]
fn sse_framing_parses_thought_and_text_deltas() {
    let payload = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"I should draw\",\"thought\":true}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Here is the sketch\"}]}}]}\n\n"
    );

    let events = SseStreamParser::parse_frames(payload);
    assert_eq!(
        events,
        vec![
            GeminiStreamEvent::ThoughtDelta {
                delta: "I should draw".to_string(),
            },
            GeminiStreamEvent::TextDelta {
                delta: "Here is the sketch".to_string(),
            },
        ]
    );
}

#[test]
fn sse_parser_emits_finished_after_the_final_parts() {
    let payload = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"done\"}]},",
        "\"finishReason\":\"STOP\"}]}\n\n"
    );

    let events = SseStreamParser::parse_frames(payload);
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        GeminiStreamEvent::TextDelta {
            delta: "done".to_string(),
        }
    );
    assert_eq!(
        events[1],
        GeminiStreamEvent::Finished {
            reason: Some(FinishReason::Stop),
        }
    );
}

#[test]
fn sse_parser_ignores_malformed_and_empty_frames() {
    let payload = concat!(
        "data: {broken-json\n\n",
        "data: \n\n",
        ": keepalive comment\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"x\"}]}}]}\n\n"
    );

    let events = SseStreamParser::parse_frames(payload);
    assert_eq!(
        events,
        vec![GeminiStreamEvent::TextDelta {
            delta: "x".to_string(),
        }]
    );
}

#[test]
fn sse_parser_buffers_across_chunk_boundaries() {
    let mut parser = SseStreamParser::default();

    let first = parser.feed(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"te");
    assert!(first.is_empty());
    assert!(!parser.is_empty_buffer());

    let second = parser.feed(b"xt\":\"split\"}]}}]}\n\n");
    assert_eq!(
        second,
        vec![GeminiStreamEvent::TextDelta {
            delta: "split".to_string(),
        }]
    );
    assert!(parser.is_empty_buffer());
}

#[test]
fn sse_parser_surfaces_in_stream_error_frames() {
    let payload = concat!(
        "data: {\"error\":{\"code\":429,\"message\":\"Resource has been exhausted\",",
        "\"status\":\"RESOURCE_EXHAUSTED\"}}\n\n"
    );

    let events = SseStreamParser::parse_frames(payload);
    assert_eq!(events.len(), 1);
    match &events[0] {
        GeminiStreamEvent::Error { code, message } => {
            assert_eq!(*code, Some(429));
            assert_eq!(message.as_deref(), Some("Resource has been exhausted"));
        }
        other => panic!("expected an error frame, got {other:?}"),
    }
}

#[test]
fn unknown_finish_reasons_become_none() {
    let payload =
        "data: {\"candidates\":[{\"content\":{\"parts\":[]},\"finishReason\":\"OTHER\"}]}\n\n";

    let events = SseStreamParser::parse_frames(payload);
    assert_eq!(events, vec![GeminiStreamEvent::Finished { reason: None }]);
}
