//! Error types for progressive rendering.

use thiserror::Error;

/// Result type alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Boxed error carried out of a failed producer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while consuming a [`StreamingBody`](crate::StreamingBody).
#[derive(Debug, Error)]
pub enum StreamError {
    /// The body's producer already ran. Bodies are single-pass.
    #[error("streaming body already consumed")]
    AlreadyConsumed,

    /// The transport stopped accepting chunks (client went away).
    #[error("client disconnected")]
    Disconnected,

    /// The producer failed after zero or more chunks were sent.
    #[error("producer failed: {0}")]
    Producer(#[source] BoxError),
}

/// Errors that can occur while rendering a view.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("layout not found: {0}")]
    LayoutNotFound(String),

    #[error("render called more than once for this request")]
    DoubleRender,

    #[error("missing local: {0}")]
    MissingLocal(String),

    #[error("template error in {template}: {message}")]
    Template { template: String, message: String },

    #[error("token store error: {0}")]
    Token(#[source] BoxError),

    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
}

impl RenderError {
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }
}

impl From<RenderError> for StreamError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Stream(inner) => inner,
            other => StreamError::Producer(Box::new(other)),
        }
    }
}

/// Errors that can occur while loading [`ProgressiveConfig`](crate::ProgressiveConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
