//! Markdown rendering seam.
//!
//! Display text and thinking traces are rendered to HTML for the embedding
//! surface. Code never goes through this path.

/// Renders markdown to sanitized HTML.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// Renderer backed by the `markdown` crate with default (safe) options:
/// raw HTML in the input is escaped, not passed through.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMarkdownRenderer;

impl MarkdownRenderer for DefaultMarkdownRenderer {
    fn render(&self, markdown: &str) -> String {
        markdown::to_html(markdown)
    }
}
