use serde::{Deserialize, Serialize};

/// Canonical request payload shape for the `streamGenerateContent` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            system_instruction: None,
            generation_config: None,
        }
    }

    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(Content {
            role: None,
            parts: vec![Part::text(text)],
        });
        self
    }

    /// Requests interleaved thought parts alongside response text.
    pub fn with_thoughts(mut self) -> Self {
        self.generation_config = Some(GenerationConfig {
            thinking_config: Some(ThinkingConfig {
                include_thoughts: true,
            }),
        });
        self
    }
}

/// One chat history entry on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`; absent on system instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Some("model".to_string()),
            parts: vec![Part::text(text)],
        }
    }
}

/// One text part of a content entry. `thought` is set on streamed reasoning
/// parts in responses and is never sent on requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub include_thoughts: bool,
}

#[cfg(test)]
mod tests {
    use super::{Content, GenerateContentRequest};

    #[test]
    fn request_serializes_camel_case_and_omits_absent_sections() {
        let request = GenerateContentRequest::new(vec![Content::user("make a red circle")]);
        let json = serde_json::to_value(&request).expect("request should serialize");

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "make a red circle");
        assert!(json.get("systemInstruction").is_none());
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn thoughts_and_system_instruction_round_trip() {
        let request = GenerateContentRequest::new(vec![
            Content::user("make a red circle"),
            Content::model("```javascript\nnew p5();\n```"),
        ])
        .with_system_instruction("You write p5.js sketches.")
        .with_thoughts();

        let json = serde_json::to_value(&request).expect("request should serialize");
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            "You write p5.js sketches."
        );
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(
            json["generationConfig"]["thinkingConfig"]["includeThoughts"],
            true
        );
        assert_eq!(json["contents"][1]["role"], "model");
    }
}
