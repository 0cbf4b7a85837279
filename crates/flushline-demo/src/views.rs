//! View types for the demo's askama templates.
//!
//! Fields are pre-formatted so the templates stay logic-free.

use askama::Template;
use flushline::{RenderError, RenderResult};

pub struct PostView {
    pub title: String,
    pub author: String,
    pub published: String,
    pub summary: String,
}

impl PostView {
    fn new(title: &str, author: &str, published: &str, summary: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            published: published.to_string(),
            summary: summary.to_string(),
        }
    }
}

/// Stand-in for a slow database query.
pub fn recent_posts() -> Vec<PostView> {
    vec![
        PostView::new(
            "Flushing early",
            "ada",
            "2026-09-30",
            "Send the document head first so the browser can fetch styles while the page renders.",
        ),
        PostView::new(
            "Layouts, inside out",
            "grace",
            "2026-10-04",
            "Render the layout first and call back into the page when it reaches the content slot.",
        ),
        PostView::new(
            "One flash, read once",
            "linus",
            "2026-10-11",
            "Why request state must be captured before the first byte leaves.",
        ),
    ]
}

pub fn tags() -> Vec<String> {
    ["rust", "http", "streaming", "templates"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Render an askama template, reporting failures under `name`.
pub fn render<T: Template>(name: &str, tmpl: &T) -> RenderResult<String> {
    tmpl.render()
        .map_err(|e| RenderError::template(name, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_data_is_populated() {
        assert_eq!(recent_posts().len(), 3);
        assert!(tags().contains(&"rust".to_string()));
    }
}
