//! flushline — progressive HTML rendering.
//!
//! Lets a page start transmitting before its templates finish rendering:
//! the layout shell (and the assets it references) reaches the browser
//! while slower page sections are still being computed.
//!
//! # Pieces
//!
//! - [`StreamingBody`]: single-pass, push-based response body with
//!   first-flush padding for browsers that buffer small responses.
//! - [`ProgressiveRenderer`]: wraps a [`Renderer`] and decides per
//!   top-level render whether the response streams.
//! - Layout inversion: a streaming render evaluates the layout first and
//!   renders inner content from a callback at the layout's content slot.
//! - Snapshots: flash and CSRF token are read once, before streaming
//!   starts, and view code sees the saved values afterwards.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use flushline::{
//!     HandlerConfig, ProgressiveRenderer, RenderArgs, RequestScope, ResponseBody,
//!     TemplateRegistry, TemplateRenderer,
//! };
//!
//! let mut templates = TemplateRegistry::new();
//! templates.insert_text("layouts/application", "<html><body>{{ yield }}</body></html>").unwrap();
//! templates.insert_text("posts/index", "<h1>Posts</h1>").unwrap();
//!
//! let renderer = ProgressiveRenderer::builder(TemplateRenderer::new(templates)).build();
//! let handler = Arc::new(HandlerConfig::new("posts").layout("application", true));
//!
//! let mut scope = RequestScope::new(handler, "index");
//! renderer.render(&mut scope, RenderArgs::Default).unwrap();
//!
//! let (_, _, body) = scope.into_response().into_parts();
//! let ResponseBody::Streaming(mut body) = body else { unreachable!() };
//! let mut chunks = Vec::new();
//! body.consume(&mut chunks).unwrap();
//! assert_eq!(chunks.concat(), b"<html><body><h1>Posts</h1></body></html>");
//! ```

pub mod body;
mod config;
mod error;
mod guard;
mod handler;
mod header;
mod layout;
mod options;
mod output;
mod policy;
mod renderer;
mod request;
mod response;
mod session;
mod snapshot;
pub mod template;
pub mod threshold;
mod view;

pub use body::{BodyWriter, ChunkSink, StreamingBody};
pub use config::{DEFAULT_CHANNEL_CAPACITY, ProgressiveConfig};
pub use error::{BoxError, ConfigError, RenderError, RenderResult, StreamError};
pub use handler::HandlerConfig;
pub use header::{Header, HeaderMap};
pub use options::{LayoutChoice, Locals, RenderArgs, RenderOptions, RenderTarget};
pub use output::{Output, StreamOutput};
pub use policy::{ProgressiveRenderer, ProgressiveRendererBuilder, StreamHook, StreamStart};
pub use renderer::{Renderer, TemplateRegistry, TemplateRenderer};
pub use request::RequestScope;
pub use response::{DEFAULT_CONTENT_TYPE, Response, ResponseBody, ResponseFinalizer, StandardHeaders};
pub use session::{ContentProc, ContentRequest, RenderSession};
pub use snapshot::{Flash, FlashAccess, FlashStore, MemoryFlash, SessionTokens, TokenAccess, TokenStore};
pub use template::TextTemplate;
pub use threshold::{PaddingRule, threshold_for};
pub use view::{Template, ViewContext};
