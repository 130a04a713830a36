use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};

use crate::config::GeminiApiConfig;
use crate::error::{parse_error_message, GeminiApiError};
use crate::events::{FinishReason, GeminiStreamEvent};
use crate::payload::GenerateContentRequest;
use crate::retry::{is_retryable_http_error, retry_delay_ms, MAX_RETRIES};
use crate::sse::SseStreamParser;
use crate::url::stream_generate_content_url;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug)]
pub struct GeminiApiClient {
    http: Client,
    config: GeminiApiConfig,
}

/// Fully drained stream: every normalized event plus the final candidate
/// finish reason, when one arrived.
#[derive(Debug, Clone)]
pub struct StreamResult {
    pub events: Vec<GeminiStreamEvent>,
    pub finish: Option<FinishReason>,
}

impl GeminiApiClient {
    pub fn new(config: GeminiApiConfig) -> Result<Self, GeminiApiError> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiApiError::MissingApiKey);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(GeminiApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiApiConfig {
        &self.config
    }

    pub fn endpoint_for_model(&self, model: &str) -> String {
        stream_generate_content_url(&self.config.base_url, model)
    }

    fn build_headers(&self) -> Result<HeaderMap, GeminiApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(self.config.api_key.trim()).map_err(|_| {
                GeminiApiError::Unknown("API key contains non-header-safe bytes".to_string())
            })?,
        );

        if let Some(user_agent) = self.config.user_agent.as_deref() {
            headers.insert(
                reqwest::header::USER_AGENT,
                HeaderValue::from_str(user_agent).map_err(|_| {
                    GeminiApiError::Unknown("User-Agent contains non-header-safe bytes".to_string())
                })?,
            );
        }

        Ok(headers)
    }

    pub fn build_request(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<reqwest::RequestBuilder, GeminiApiError> {
        Ok(self
            .http
            .post(self.endpoint_for_model(model))
            .headers(self.build_headers()?)
            .json(request))
    }

    pub async fn send_with_retry(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<Response, GeminiApiError> {
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            let response = self
                .build_request(model, request)?
                .send()
                .await
                .map_err(GeminiApiError::from);

            match response {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let status = response.status();
                    last_status = Some(status);
                    let body = response.text().await.unwrap_or_else(|_| {
                        status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string()
                    });
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if attempt < MAX_RETRIES && is_retryable_http_error(status.as_u16(), &body) {
                        tokio::time::sleep(retry_delay_ms(attempt)).await;
                        continue;
                    }

                    return Err(GeminiApiError::Status(status, message));
                }
                Err(error) => {
                    last_error = Some(error.to_string());
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(retry_delay_ms(attempt)).await;
                        continue;
                    }
                    return Err(GeminiApiError::RetryExhausted {
                        status: last_status,
                        last_error,
                    });
                }
            }
        }

        Err(GeminiApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    pub async fn stream_with_handler<F>(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        mut on_event: F,
    ) -> Result<Option<FinishReason>, GeminiApiError>
    where
        F: FnMut(GeminiStreamEvent),
    {
        let response = self.send_with_retry(model, request).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();
        let mut finish: Option<FinishReason> = None;

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(GeminiApiError::from)?;
            for event in parser.feed(&chunk) {
                process_stream_event(event, &mut finish, &mut on_event)?;
            }
        }

        Ok(finish)
    }

    pub async fn stream(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<StreamResult, GeminiApiError> {
        let mut events = Vec::new();
        let finish = self
            .stream_with_handler(model, request, |event| {
                events.push(event);
            })
            .await?;

        Ok(StreamResult { events, finish })
    }
}

fn process_stream_event<F>(
    event: GeminiStreamEvent,
    finish: &mut Option<FinishReason>,
    on_event: &mut F,
) -> Result<(), GeminiApiError>
where
    F: FnMut(GeminiStreamEvent),
{
    if let GeminiStreamEvent::Error { code, message } = &event {
        return Err(GeminiApiError::StreamFailed {
            code: *code,
            message: message
                .clone()
                .unwrap_or_else(|| "Gemini stream reported an error".to_owned()),
        });
    }

    if let GeminiStreamEvent::Finished { reason } = &event {
        *finish = *reason;
    }

    on_event(event);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::process_stream_event;
    use crate::events::{FinishReason, GeminiStreamEvent};
    use crate::sse::SseStreamParser;

    #[test]
    fn process_stream_event_tracks_terminal_finish_reason() {
        let frames = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"A\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"B\"}]},\"finishReason\":\"STOP\"}]}\n\n",
        );
        let parsed = SseStreamParser::parse_frames(frames);

        let mut finish = None;
        let mut observed = Vec::new();
        for event in parsed {
            process_stream_event(event, &mut finish, &mut |event| observed.push(event))
                .expect("text deltas should process successfully");
        }

        assert_eq!(finish, Some(FinishReason::Stop));
        assert_eq!(observed.len(), 3);
        assert_eq!(
            observed[0],
            GeminiStreamEvent::TextDelta {
                delta: "A".to_string(),
            }
        );
    }

    #[test]
    fn process_stream_event_turns_error_frames_into_stream_failures() {
        let mut finish = None;
        let error = process_stream_event(
            GeminiStreamEvent::Error {
                code: Some(429),
                message: Some("quota".to_string()),
            },
            &mut finish,
            &mut |_event| panic!("error frames must not reach the handler"),
        )
        .expect_err("error frames fail the stream");

        assert!(error.to_string().contains("quota"));
        assert!(finish.is_none());
    }
}
