//! Markdown rendering for formatted posts.

use pulldown_cmark::{Options, Parser, html};

/// Turns Markdown into the HTML body of a formatted message.
pub trait MarkupRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// CommonMark renderer with tables and strikethrough enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonMarkRenderer;

impl MarkupRenderer for CommonMarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let parser = Parser::new_ext(markdown, options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out.trim_end().to_string()
    }
}
