//! Render call arguments.
//!
//! [`RenderArgs`] is what a handler passes to `render`: nothing (render the
//! current action), a bare action name, or a full [`RenderOptions`].
//! Loosely typed arguments (e.g. decoded from JSON by a router) convert via
//! `From<serde_json::Value>`; anything that is not a recognisable options
//! object is treated as if no options were given.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Template locals.
pub type Locals = BTreeMap<String, Value>;

/// What a render call produces.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderTarget {
    /// The template for the named action of the current handler.
    Action(String),
    Template(String),
    File(String),
    Inline(String),
    Partial(String),
    Text(String),
    Xml(String),
    Json(Value),
    Script(String),
    Update(String),
    Nothing,
}

impl RenderTarget {
    /// Targets that produce a non-template response and never stream.
    pub fn is_raw(&self) -> bool {
        matches!(
            self,
            Self::Text(_)
                | Self::Xml(_)
                | Self::Json(_)
                | Self::Script(_)
                | Self::Update(_)
                | Self::Nothing
        )
    }

    /// Content type implied by the target, if it is not a template.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Json(_) => Some("application/json"),
            Self::Xml(_) => Some("application/xml"),
            Self::Script(_) | Self::Update(_) => Some("text/javascript"),
            _ => None,
        }
    }
}

/// Layout selection for a render call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LayoutChoice {
    /// The handler's layout for action and template renders, none otherwise.
    #[default]
    Default,
    None,
    Named(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub target: RenderTarget,
    pub layout: LayoutChoice,
    /// `Some(false)` opts a top-level call out of streaming; `Some(true)`
    /// asks a nested call to render its layout progressively.
    pub progressive: Option<bool>,
    pub locals: Locals,
    pub content_type: Option<String>,
    pub status: Option<u16>,
}

impl RenderOptions {
    pub fn new(target: RenderTarget) -> Self {
        Self {
            target,
            layout: LayoutChoice::Default,
            progressive: None,
            locals: Locals::new(),
            content_type: None,
            status: None,
        }
    }

    pub fn action(name: impl Into<String>) -> Self {
        Self::new(RenderTarget::Action(name.into()))
    }

    pub fn template(name: impl Into<String>) -> Self {
        Self::new(RenderTarget::Template(name.into()))
    }

    pub fn partial(name: impl Into<String>) -> Self {
        Self::new(RenderTarget::Partial(name.into()))
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::new(RenderTarget::Text(body.into()))
    }

    pub fn json(value: Value) -> Self {
        Self::new(RenderTarget::Json(value))
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = LayoutChoice::Named(layout.into());
        self
    }

    pub fn without_layout(mut self) -> Self {
        self.layout = LayoutChoice::None;
        self
    }

    pub fn progressive(mut self, progressive: bool) -> Self {
        self.progressive = Some(progressive);
        self
    }

    pub fn local(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.locals.insert(key.into(), value.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Parse a JSON options object. Returns `None` when no recognised
    /// target key is present or a recognised key has the wrong type.
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        let string = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);

        let target = if let Some(body) = map.get("json") {
            RenderTarget::Json(body.clone())
        } else if map.get("nothing").and_then(Value::as_bool) == Some(true) {
            RenderTarget::Nothing
        } else if let Some(body) = string("text") {
            RenderTarget::Text(body)
        } else if let Some(body) = string("xml") {
            RenderTarget::Xml(body)
        } else if let Some(body) = string("script") {
            RenderTarget::Script(body)
        } else if let Some(body) = string("update") {
            RenderTarget::Update(body)
        } else if let Some(name) = string("partial") {
            RenderTarget::Partial(name)
        } else if let Some(name) = string("template") {
            RenderTarget::Template(name)
        } else if let Some(path) = string("file") {
            RenderTarget::File(path)
        } else if let Some(source) = string("inline") {
            RenderTarget::Inline(source)
        } else if let Some(name) = string("action") {
            RenderTarget::Action(name)
        } else {
            return None;
        };

        let mut options = Self::new(target);
        options.layout = match map.get("layout") {
            Some(Value::String(name)) => LayoutChoice::Named(name.clone()),
            Some(Value::Bool(false)) | Some(Value::Null) => LayoutChoice::None,
            _ => LayoutChoice::Default,
        };
        options.progressive = map.get("progressive").and_then(Value::as_bool);
        if let Some(Value::Object(locals)) = map.get("locals") {
            options.locals = locals.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        }
        options.content_type = string("content_type");
        options.status = map
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok());
        Some(options)
    }
}

/// Arguments to a render entry point.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RenderArgs {
    /// Render the current action's template.
    #[default]
    Default,
    /// Render the named action's template.
    Action(String),
    Options(RenderOptions),
}

impl RenderArgs {
    /// Whether these arguments may produce a streaming response.
    ///
    /// Raw targets never stream, an explicit `progressive: false` opts
    /// out, and a bare `update` action is treated like an update render.
    pub fn may_stream(&self) -> bool {
        match self {
            Self::Default => true,
            Self::Action(name) => name != "update",
            Self::Options(options) => {
                !options.target.is_raw() && options.progressive != Some(false)
            }
        }
    }

    /// Resolve to concrete options for the current action.
    pub fn into_options(self, current_action: &str) -> RenderOptions {
        match self {
            Self::Default => RenderOptions::action(current_action),
            Self::Action(name) => RenderOptions::action(name),
            Self::Options(options) => options,
        }
    }
}

impl From<RenderOptions> for RenderArgs {
    fn from(options: RenderOptions) -> Self {
        Self::Options(options)
    }
}

impl From<&str> for RenderArgs {
    fn from(action: &str) -> Self {
        Self::Action(action.to_string())
    }
}

impl From<Value> for RenderArgs {
    fn from(value: Value) -> Self {
        match value {
            Value::String(action) => Self::Action(action),
            Value::Object(map) => RenderOptions::from_map(&map).map_or(Self::Default, Self::Options),
            _ => Self::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn raw_targets_never_stream() {
        for options in [
            RenderOptions::text("hi"),
            RenderOptions::json(json!({"ok": true})),
            RenderOptions::new(RenderTarget::Xml("<a/>".into())),
            RenderOptions::new(RenderTarget::Script("alert(1)".into())),
            RenderOptions::new(RenderTarget::Update("$('x')".into())),
            RenderOptions::new(RenderTarget::Nothing),
        ] {
            assert!(!RenderArgs::from(options).may_stream());
        }
    }

    #[test]
    fn template_targets_may_stream() {
        assert!(RenderArgs::Default.may_stream());
        assert!(RenderArgs::from("show").may_stream());
        assert!(RenderArgs::from(RenderOptions::template("posts/index")).may_stream());
        assert!(RenderArgs::from(RenderOptions::partial("row")).may_stream());
    }

    #[test]
    fn update_action_and_opt_out() {
        assert!(!RenderArgs::from("update").may_stream());
        let opted_out = RenderOptions::template("posts/index").progressive(false);
        assert!(!RenderArgs::from(opted_out).may_stream());
    }

    #[test]
    fn json_value_options() {
        let args = RenderArgs::from(json!({
            "template": "posts/show",
            "layout": false,
            "locals": {"id": 7},
            "status": 201
        }));
        let RenderArgs::Options(options) = args else {
            panic!("expected options");
        };
        assert_eq!(options.target, RenderTarget::Template("posts/show".into()));
        assert_eq!(options.layout, LayoutChoice::None);
        assert_eq!(options.locals.get("id"), Some(&json!(7)));
        assert_eq!(options.status, Some(201));
    }

    #[test]
    fn json_exclusions_are_recognised() {
        assert!(!RenderArgs::from(json!({"json": [1, 2]})).may_stream());
        assert!(!RenderArgs::from(json!({"nothing": true})).may_stream());
        assert!(!RenderArgs::from(json!({"text": "plain"})).may_stream());
    }

    #[test]
    fn unrecognised_values_are_absent_options() {
        assert_eq!(RenderArgs::from(json!({"bogus": 1})), RenderArgs::Default);
        assert_eq!(RenderArgs::from(json!({"text": 5})), RenderArgs::Default);
        assert_eq!(RenderArgs::from(json!(42)), RenderArgs::Default);
        assert_eq!(RenderArgs::from(json!("update")), RenderArgs::Action("update".into()));
    }

    #[test]
    fn default_resolves_to_current_action() {
        let options = RenderArgs::Default.into_options("index");
        assert_eq!(options.target, RenderTarget::Action("index".into()));
    }
}
