//! First-flush padding thresholds.
//!
//! Browsers differ in how many bytes they want before they start painting
//! an inline HTML response. Rules are checked in order and the first one
//! whose pattern occurs in the client's user agent wins, so a more specific
//! pattern must come before any pattern it can co-occur with ("Chrome"
//! user agents also mention "Safari").

use serde::{Deserialize, Serialize};

/// One row of the padding table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddingRule {
    pub pattern: String,
    pub bytes: usize,
}

impl PaddingRule {
    pub fn new(pattern: impl Into<String>, bytes: usize) -> Self {
        Self {
            pattern: pattern.into(),
            bytes,
        }
    }
}

/// The built-in padding table.
pub fn default_rules() -> Vec<PaddingRule> {
    vec![
        PaddingRule::new("MSIE", 255),
        PaddingRule::new("Chrome", 2048),
        PaddingRule::new("Safari", 1024),
    ]
}

/// Returns `true` for `text/html`, ignoring parameters and case.
pub fn is_html(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("text/html"))
}

/// Bytes the first chunk must reach for this response.
///
/// Non-HTML responses and unknown clients get zero.
pub fn threshold_for(rules: &[PaddingRule], content_type: &str, user_agent: Option<&str>) -> usize {
    if !is_html(content_type) {
        return 0;
    }
    let Some(agent) = user_agent else {
        return 0;
    };
    rules
        .iter()
        .find(|rule| agent.contains(rule.pattern.as_str()))
        .map_or(0, |rule| rule.bytes)
}
