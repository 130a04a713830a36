//! Session configuration.

use std::env;

pub const SYSTEM_INSTRUCTIONS_ENV_VAR: &str = "SKETCH_STUDIO_SYSTEM_INSTRUCTIONS";

pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str = "You are a creative-coding assistant writing p5.js sketches. Reply with a short explanation and exactly one fenced javascript code block containing a complete sketch that ends by constructing its p5 instance. When given a runtime error, return a corrected full sketch rather than a patch.";

pub const DEFAULT_SKETCH: &str = "function setup() {\n  createCanvas(400, 400);\n}\n\nfunction draw() {\n  background(220);\n}\n\nnew p5();\n";

/// Static knobs for one authoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    /// Draft code a fresh or reset session starts from.
    pub default_sketch: String,
    /// System instructions sent with every provider turn.
    pub system_instructions: String,
    /// Language tag that marks extractable fenced code in responses.
    pub fence_language: String,
    /// Filename prefix for exported sketches.
    pub export_prefix: String,
    /// Filename extension for exported sketches.
    pub export_extension: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            default_sketch: DEFAULT_SKETCH.to_string(),
            system_instructions: DEFAULT_SYSTEM_INSTRUCTIONS.to_string(),
            fence_language: "javascript".to_string(),
            export_prefix: "sketch".to_string(),
            export_extension: "js".to_string(),
        }
    }
}

impl StudioConfig {
    /// Builds the default config with system instructions taken from the
    /// environment when set.
    pub fn from_env() -> Self {
        Self {
            system_instructions: system_instructions_from_env(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_default_sketch(mut self, code: impl Into<String>) -> Self {
        self.default_sketch = code.into();
        self
    }

    #[must_use]
    pub fn with_system_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.system_instructions = sanitize_system_instructions(Some(instructions.into()));
        self
    }
}

pub fn system_instructions_from_env() -> String {
    let from_env = env::var(SYSTEM_INSTRUCTIONS_ENV_VAR).ok();
    sanitize_system_instructions(from_env)
}

fn sanitize_system_instructions(raw: Option<String>) -> String {
    let Some(value) = raw else {
        return DEFAULT_SYSTEM_INSTRUCTIONS.to_string();
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        DEFAULT_SYSTEM_INSTRUCTIONS.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    use super::{
        system_instructions_from_env, StudioConfig, DEFAULT_SYSTEM_INSTRUCTIONS,
        SYSTEM_INSTRUCTIONS_ENV_VAR,
    };

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn default_config_has_a_runnable_default_sketch() {
        let config = StudioConfig::default();
        assert!(config.default_sketch.contains("new p5()"));
        assert_eq!(config.fence_language, "javascript");
        assert_eq!(config.export_prefix, "sketch");
        assert_eq!(config.export_extension, "js");
    }

    #[test]
    fn missing_env_falls_back_to_default_instructions() {
        let _lock = env_lock();
        let _guard = set_env_guard(SYSTEM_INSTRUCTIONS_ENV_VAR, None);
        assert_eq!(system_instructions_from_env(), DEFAULT_SYSTEM_INSTRUCTIONS);
    }

    #[test]
    fn env_instructions_are_trimmed_and_empty_ignored() {
        let _lock = env_lock();

        let _guard = set_env_guard(SYSTEM_INSTRUCTIONS_ENV_VAR, Some("  be terse  "));
        assert_eq!(system_instructions_from_env(), "be terse");

        let _guard = set_env_guard(SYSTEM_INSTRUCTIONS_ENV_VAR, Some("   "));
        assert_eq!(system_instructions_from_env(), DEFAULT_SYSTEM_INSTRUCTIONS);
    }

    #[test]
    fn with_system_instructions_sanitizes_blank_values() {
        let config = StudioConfig::default().with_system_instructions("   ");
        assert_eq!(config.system_instructions, DEFAULT_SYSTEM_INSTRUCTIONS);
    }
}
