//! Provider selection.

use std::sync::Arc;
use std::time::Duration;

use sketch_provider::SketchProvider;
use sketch_provider_gemini_api::{GeminiApiProvider, GeminiApiProviderConfig};
use sketch_provider_mock::MockProvider;

pub const DEFAULT_PROVIDER_ID: &str = "mock";
pub const PROVIDER_ENV_VAR: &str = "SKETCH_STUDIO_PROVIDER";
pub const GEMINI_API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_ENV_VAR: &str = "SKETCH_STUDIO_MODEL";

const GEMINI_TIMEOUT: Duration = Duration::from_secs(120);

pub fn provider_from_env() -> Result<Arc<dyn SketchProvider>, String> {
    let provider_id = std::env::var(PROVIDER_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    provider_for_id(provider_id.as_deref().unwrap_or(DEFAULT_PROVIDER_ID))
}

pub fn provider_for_id(provider_id: &str) -> Result<Arc<dyn SketchProvider>, String> {
    match provider_id {
        DEFAULT_PROVIDER_ID => Ok(Arc::new(MockProvider::default())),
        sketch_provider_gemini_api::GEMINI_API_PROVIDER_ID => {
            let api_key = std::env::var(GEMINI_API_KEY_ENV_VAR)
                .map_err(|_| format!("{GEMINI_API_KEY_ENV_VAR} is required for the gemini-api provider"))?;
            let model = std::env::var(MODEL_ENV_VAR).unwrap_or_default();
            let config =
                GeminiApiProviderConfig::new(api_key, model).with_timeout(GEMINI_TIMEOUT);
            let provider = GeminiApiProvider::new(config).map_err(|error| error.to_string())?;
            Ok(Arc::new(provider))
        }
        unknown => Err(format!(
            "Unsupported provider '{unknown}'. Available providers: {DEFAULT_PROVIDER_ID}, {}",
            sketch_provider_gemini_api::GEMINI_API_PROVIDER_ID
        )),
    }
}
