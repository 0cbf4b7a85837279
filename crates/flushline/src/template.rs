//! A minimal text template format.
//!
//! Literal text with `{{ ... }}` tags:
//!
//! | tag | emits |
//! |---|---|
//! | `{{ yield }}` | the layout's inner content |
//! | `{{ yield name }}` | the named content region `name` |
//! | `{{ partial name }}` | the partial `name`, with the current locals |
//! | `{{ local key }}` | the local `key`, HTML-escaped |
//! | `{{ flash key }}` | the flash message `key`, HTML-escaped |
//! | `{{ csrf_token }}` | the request's CSRF token |

use serde_json::Value;

use crate::error::{RenderError, RenderResult};
use crate::options::Locals;
use crate::view::{Template, ViewContext};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Yield,
    YieldNamed(String),
    Partial(String),
    Local(String),
    Flash(String),
    CsrfToken,
}

#[derive(Debug, Clone)]
pub struct TextTemplate {
    name: String,
    segments: Vec<Segment>,
}

impl TextTemplate {
    pub fn parse(name: impl Into<String>, source: &str) -> RenderResult<Self> {
        let name = name.into();
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| RenderError::template(&name, "unclosed tag"))?;
            segments.push(parse_tag(&name, after[..end].trim())?);
            rest = &after[end + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn parse_tag(template: &str, tag: &str) -> RenderResult<Segment> {
    let words: Vec<&str> = tag.split_whitespace().collect();
    let segment = match words.as_slice() {
        ["yield"] => Segment::Yield,
        ["yield", name] => Segment::YieldNamed((*name).to_string()),
        ["partial", name] => Segment::Partial((*name).to_string()),
        ["local", key] => Segment::Local((*key).to_string()),
        ["flash", key] => Segment::Flash((*key).to_string()),
        ["csrf_token"] => Segment::CsrfToken,
        _ => return Err(RenderError::template(template, format!("unknown tag `{tag}`"))),
    };
    Ok(segment)
}

impl Template for TextTemplate {
    fn render(&self, view: &mut ViewContext<'_>, locals: &Locals) -> RenderResult<()> {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => view.write(text),
                Segment::Yield => view.yield_content()?,
                Segment::YieldNamed(name) => view.yield_named(name)?,
                Segment::Partial(name) => view.render_partial(name, locals.clone())?,
                Segment::Local(key) => {
                    let value = locals
                        .get(key)
                        .ok_or_else(|| RenderError::MissingLocal(key.clone()))?;
                    view.write(&escape(&display(value)));
                }
                Segment::Flash(key) => {
                    if let Some(message) = view.flash().get(key) {
                        view.write(&escape(message));
                    }
                }
                Segment::CsrfToken => {
                    let token = view.csrf_token()?;
                    view.write(&token);
                }
            }
        }
        Ok(())
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Escape text for inclusion in HTML.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literals_and_tags() {
        let tmpl = TextTemplate::parse("layouts/app", "<body>{{ yield }}{{yield sidebar}}</body>").unwrap();
        assert_eq!(
            tmpl.segments,
            vec![
                Segment::Literal("<body>".into()),
                Segment::Yield,
                Segment::YieldNamed("sidebar".into()),
                Segment::Literal("</body>".into()),
            ]
        );
    }

    #[test]
    fn unclosed_tag_is_an_error() {
        let err = TextTemplate::parse("broken", "<p>{{ local name</p>").unwrap_err();
        assert!(matches!(err, RenderError::Template { .. }));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let err = TextTemplate::parse("broken", "{{ include header }}").unwrap_err();
        assert_eq!(err.to_string(), "template error in broken: unknown tag `include header`");
    }

    #[test]
    fn plain_text_is_one_literal() {
        let tmpl = TextTemplate::parse("plain", "no tags here").unwrap();
        assert_eq!(tmpl.segments, vec![Segment::Literal("no tags here".into())]);
    }

    #[test]
    fn escape_html() {
        assert_eq!(escape(r#"<a href="x">Tom & 'Jerry'</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
    }
}
