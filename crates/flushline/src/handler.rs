//! Per-handler render configuration.
//!
//! A handler declares its layout and whether that layout renders
//! progressively. Child handlers inherit both settings from their parent
//! unless they override them.

use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct HandlerConfig {
    name: String,
    layout: Option<String>,
    progressive: Option<bool>,
    parent: Option<Arc<HandlerConfig>>,
}

impl HandlerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A handler that inherits layout and progressive settings from `parent`.
    pub fn inherit(parent: &Arc<HandlerConfig>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(Arc::clone(parent)),
            ..Self::default()
        }
    }

    /// Declare the layout and whether it streams.
    pub fn layout(mut self, layout: impl Into<String>, progressive: bool) -> Self {
        self.layout = Some(layout.into());
        self.progressive = Some(progressive);
        self
    }

    /// Override only the progressive flag.
    pub fn progressive(mut self, progressive: bool) -> Self {
        self.progressive = Some(progressive);
        self
    }

    /// Template path prefix for this handler's actions.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout_name(&self) -> Option<&str> {
        self.layout
            .as_deref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.layout_name()))
    }

    pub fn renders_progressively(&self) -> bool {
        self.progressive
            .or_else(|| self.parent.as_ref().map(|p| p.renders_progressively()))
            .unwrap_or(false)
    }
}
