/// Default base URL for the Generative Language API.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Builds the streaming endpoint URL for a model.
///
/// Trailing slashes on the base are collapsed so caller-configured bases and
/// the default compose identically. `alt=sse` selects the SSE framing the
/// parser in this crate expects.
pub fn stream_generate_content_url(base_url: &str, model: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let model = model.trim().trim_matches('/');
    format!("{base}/v1beta/models/{model}:streamGenerateContent?alt=sse")
}

#[cfg(test)]
mod tests {
    use super::{stream_generate_content_url, DEFAULT_GEMINI_BASE_URL};

    #[test]
    fn url_is_built_from_default_base_and_model() {
        assert_eq!(
            stream_generate_content_url(DEFAULT_GEMINI_BASE_URL, "gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn trailing_slashes_and_padding_are_normalized() {
        assert_eq!(
            stream_generate_content_url("https://example.test///", " gemini-2.5-pro "),
            "https://example.test/v1beta/models/gemini-2.5-pro:streamGenerateContent?alt=sse"
        );
    }
}
