//! Fenced-code extraction from assistant responses.

use markdown::{mdast, to_mdast, ParseOptions};

/// Extracts the first fenced code block tagged with `language`.
///
/// Fence matching is best-effort CommonMark: a block is closed by the nearest
/// later fence marker, and an unclosed fence runs to the end of the text.
/// Returns `None` when the text carries no matching block.
#[must_use]
pub fn extract_fenced_code(text: &str, language: &str) -> Option<String> {
    let tree = to_mdast(text, &ParseOptions::default()).ok()?;
    find_code_block(&tree, language).map(ToString::to_string)
}

fn find_code_block<'a>(node: &'a mdast::Node, language: &str) -> Option<&'a str> {
    if let mdast::Node::Code(code) = node {
        if code
            .lang
            .as_deref()
            .is_some_and(|lang| lang.eq_ignore_ascii_case(language))
        {
            return Some(&code.value);
        }
    }

    node.children()?
        .iter()
        .find_map(|child| find_code_block(child, language))
}

#[cfg(test)]
mod tests {
    use super::extract_fenced_code;

    #[test]
    fn extracts_the_first_matching_block() {
        let text = "Here is the sketch:\n\n```javascript\nnew p5(sketch);\n```\n\nEnjoy!";
        assert_eq!(
            extract_fenced_code(text, "javascript"),
            Some("new p5(sketch);".to_string())
        );
    }

    #[test]
    fn ignores_blocks_with_other_languages() {
        let text = "```python\nprint('hi')\n```\n";
        assert_eq!(extract_fenced_code(text, "javascript"), None);
    }

    #[test]
    fn returns_none_without_any_fence() {
        assert_eq!(extract_fenced_code("just prose, no code", "javascript"), None);
    }

    #[test]
    fn unclosed_fence_runs_to_end_of_text() {
        let text = "Partial reply:\n\n```javascript\nlet x = 1;\nlet y = 2;";
        assert_eq!(
            extract_fenced_code(text, "javascript"),
            Some("let x = 1;\nlet y = 2;".to_string())
        );
    }

    #[test]
    fn language_tag_match_is_case_insensitive() {
        let text = "```JavaScript\nnew p5();\n```";
        assert_eq!(
            extract_fenced_code(text, "javascript"),
            Some("new p5();".to_string())
        );
    }

    #[test]
    fn skips_untagged_blocks_and_finds_nested_ones() {
        let text = "```\nuntagged\n```\n\n> quoted reply\n>\n> ```javascript\n> circle(200, 200, 50);\n> ```\n";
        assert_eq!(
            extract_fenced_code(text, "javascript"),
            Some("circle(200, 200, 50);".to_string())
        );
    }
}
