//! Gemini-backed implementation of the shared `sketch_provider` contract.
//!
//! This adapter translates `gemini_api` stream semantics into deterministic
//! `RunEvent` lifecycle events expected by the session layer.

use std::sync::Arc;
use std::time::Duration;

use gemini_api::{
    extract_embedded_error_message, Content, FinishReason, GeminiApiClient, GeminiApiConfig,
    GeminiApiError, GeminiStreamEvent, GenerateContentRequest, StreamResult,
};
use sketch_provider::{
    ChatRole, ProviderInitError, ProviderProfile, RunEvent, RunRequest, SketchProvider,
    StreamPart,
};

/// Stable provider identifier used by session startup selection.
pub const GEMINI_API_PROVIDER_ID: &str = "gemini-api";

const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash";

/// Runtime configuration for the Gemini API provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiApiProviderConfig {
    pub api_key: String,
    pub model_id: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl GeminiApiProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: model_id.into(),
            base_url: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_gemini_api_config(self) -> GeminiApiConfig {
        let mut config = GeminiApiConfig::new(self.api_key);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait StreamClient: Send + Sync {
    fn stream(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<StreamResult, GeminiApiError>;
}

#[derive(Debug)]
struct DefaultStreamClient {
    client: GeminiApiClient,
}

impl StreamClient for DefaultStreamClient {
    fn stream(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<StreamResult, GeminiApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                GeminiApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(self.client.stream(model, request))
    }
}

/// `SketchProvider` adapter backed by `gemini_api` transport primitives.
pub struct GeminiApiProvider {
    model_id: String,
    stream_client: Arc<dyn StreamClient>,
}

impl GeminiApiProvider {
    /// Creates a provider using real Gemini API transport.
    pub fn new(config: GeminiApiProviderConfig) -> Result<Self, ProviderInitError> {
        let model_id = sanitize_model_id(&config.model_id);
        let stream_client = Arc::new(DefaultStreamClient {
            client: GeminiApiClient::new(config.into_gemini_api_config())
                .map_err(map_init_error)?,
        });

        Ok(Self {
            model_id,
            stream_client,
        })
    }

    fn build_request(&self, req: &RunRequest) -> GenerateContentRequest {
        let contents = req
            .messages
            .iter()
            .map(|message| match message.role {
                ChatRole::User => Content::user(&message.text),
                ChatRole::Model => Content::model(&message.text),
            })
            .collect();

        let mut request = GenerateContentRequest::new(contents).with_thoughts();
        if !req.instructions.trim().is_empty() {
            request = request.with_system_instruction(&req.instructions);
        }
        request
    }

    fn emit_stream_parts(
        &self,
        run_id: u64,
        stream_events: Vec<GeminiStreamEvent>,
        emit: &mut dyn FnMut(RunEvent),
    ) {
        for stream_event in stream_events {
            let part = match stream_event {
                GeminiStreamEvent::ThoughtDelta { delta } => StreamPart::Thought(delta),
                GeminiStreamEvent::TextDelta { delta } => StreamPart::Text(delta),
                GeminiStreamEvent::Finished { .. } | GeminiStreamEvent::Error { .. } => continue,
            };

            if !part.text().is_empty() {
                emit(RunEvent::Part { run_id, part });
            }
        }
    }

    fn emit_terminal_event(
        &self,
        run_id: u64,
        finish: Option<FinishReason>,
        emit: &mut dyn FnMut(RunEvent),
    ) {
        match finish {
            Some(reason) if reason.is_complete() => emit(RunEvent::Finished { run_id }),
            Some(reason) => emit(RunEvent::Failed {
                run_id,
                error: format!(
                    "Gemini API response ended with non-complete finish reason '{}'",
                    reason.as_str()
                ),
            }),
            None => emit(RunEvent::Failed {
                run_id,
                error: "Gemini API stream ended without a finish reason".to_string(),
            }),
        }
    }

    #[cfg(test)]
    fn with_stream_client_for_tests(
        model_id: impl Into<String>,
        stream_client: Arc<dyn StreamClient>,
    ) -> Self {
        Self {
            model_id: sanitize_model_id(&model_id.into()),
            stream_client,
        }
    }
}

impl SketchProvider for GeminiApiProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: GEMINI_API_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    fn run(&self, req: RunRequest, emit: &mut dyn FnMut(RunEvent)) -> Result<(), String> {
        let run_id = req.run_id;

        emit(RunEvent::Started { run_id });

        let request = self.build_request(&req);
        match self.stream_client.stream(&self.model_id, &request) {
            Ok(result) => {
                self.emit_stream_parts(run_id, result.events, emit);
                self.emit_terminal_event(run_id, result.finish, emit);
            }
            // Transport errors sometimes stringify the response body into
            // their message; pull the structured message back out before it
            // becomes the error turn text.
            Err(error) => emit(RunEvent::Failed {
                run_id,
                error: format!(
                    "Gemini API request failed: {}",
                    extract_embedded_error_message(&error.to_string())
                ),
            }),
        }

        Ok(())
    }
}

fn sanitize_model_id(model_id: &str) -> String {
    let trimmed = model_id.trim();
    if trimmed.is_empty() {
        DEFAULT_MODEL_ID.to_string()
    } else {
        trimmed.to_string()
    }
}

fn map_init_error(error: GeminiApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize gemini-api provider: {error}"))
}
