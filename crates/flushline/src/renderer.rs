//! The rendering capability the progressive layer decorates.
//!
//! A [`Renderer`] knows how to evaluate a render target on its own and how
//! to evaluate a named layout. Wrapping content in a layout is left to
//! [`ProgressiveRenderer`](crate::ProgressiveRenderer), which decides
//! whether the content is rendered first (buffered) or on demand from
//! inside the layout (progressive).

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{RenderError, RenderResult};
use crate::options::{Locals, RenderOptions, RenderTarget};
use crate::template::TextTemplate;
use crate::view::{Template, ViewContext};

pub trait Renderer: Send + Sync {
    /// Write the output for `options` without any layout.
    fn render_body(&self, view: &mut ViewContext<'_>, options: &RenderOptions) -> RenderResult<()>;

    /// Evaluate the layout `name`. The layout reaches its content through
    /// [`ViewContext::yield_content`].
    fn render_layout(&self, view: &mut ViewContext<'_>, name: &str, locals: &Locals) -> RenderResult<()>;
}

/// Named templates.
#[derive(Default, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, Arc<dyn Template>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, template: impl Template + 'static) {
        self.templates.insert(name.into(), Arc::new(template));
    }

    /// Parse `source` as a [`TextTemplate`] and register it.
    pub fn insert_text(&mut self, name: impl Into<String>, source: &str) -> RenderResult<()> {
        let name = name.into();
        let template = TextTemplate::parse(name.clone(), source)?;
        self.templates.insert(name, Arc::new(template));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Template>> {
        self.templates.get(name).cloned()
    }
}

/// [`Renderer`] over a [`TemplateRegistry`].
///
/// Lookup conventions: actions resolve to `{handler}/{action}`, partials
/// to `{dir}/_{name}` (`{handler}/_{name}` when `name` has no directory),
/// layouts to `layouts/{name}`. Templates and files use their name as is.
pub struct TemplateRenderer {
    registry: TemplateRegistry,
}

impl TemplateRenderer {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    fn lookup(&self, name: &str) -> RenderResult<Arc<dyn Template>> {
        self.registry
            .get(name)
            .ok_or_else(|| RenderError::TemplateNotFound(name.to_string()))
    }
}

pub fn partial_path(handler: &str, name: &str) -> String {
    match name.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_{file}"),
        None => format!("{handler}/_{name}"),
    }
}

pub fn layout_path(name: &str) -> String {
    format!("layouts/{name}")
}

impl Renderer for TemplateRenderer {
    fn render_body(&self, view: &mut ViewContext<'_>, options: &RenderOptions) -> RenderResult<()> {
        let template = match &options.target {
            RenderTarget::Text(body)
            | RenderTarget::Xml(body)
            | RenderTarget::Script(body)
            | RenderTarget::Update(body) => {
                view.write(body);
                return Ok(());
            }
            RenderTarget::Json(value) => {
                view.write(&value.to_string());
                return Ok(());
            }
            RenderTarget::Nothing => return Ok(()),
            RenderTarget::Inline(source) => {
                let template = TextTemplate::parse("inline", source)?;
                return template.render(view, &options.locals);
            }
            RenderTarget::Action(action) => {
                let name = format!("{}/{action}", view.session().handler().name());
                self.lookup(&name)?
            }
            RenderTarget::Partial(partial) => {
                self.lookup(&partial_path(view.session().handler().name(), partial))?
            }
            RenderTarget::Template(name) | RenderTarget::File(name) => self.lookup(name)?,
        };
        template.render(view, &options.locals)
    }

    fn render_layout(&self, view: &mut ViewContext<'_>, name: &str, locals: &Locals) -> RenderResult<()> {
        let path = layout_path(name);
        let layout = self
            .registry
            .get(&path)
            .ok_or(RenderError::LayoutNotFound(path))?;
        layout.render(view, locals)
    }
}
