//! Overlay content sources.
//!
//! # Responsibility
//! - Describe what an overlay shows without choosing a rendering technology.
//!
//! # Invariants
//! - The core matches on the `ContentSource` tag; it never inspects shapes.
//! - View adapters own their own drawing; the core only hands them a container.

use crate::host::{ElementId, HostError};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

/// External view that can mount itself into a host container.
pub trait ViewAdapter {
    fn mount(&self, container: ElementId) -> Result<(), RenderError>;
    fn unmount(&self) -> Result<(), RenderError>;
}

/// What to render inside a tooltip or modal.
#[derive(Clone)]
pub enum ContentSource {
    /// Plain text written into the container.
    Text(String),
    /// Host-owned node moved into the container and detached on close.
    Node(ElementId),
    /// Framework view mounted and unmounted through its adapter.
    View(Rc<dyn ViewAdapter>),
}

impl ContentSource {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn view(adapter: impl ViewAdapter + 'static) -> Self {
        Self::View(Rc::new(adapter))
    }

    /// Short tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Node(_) => "node",
            Self::View(_) => "view",
        }
    }
}

impl Debug for ContentSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Self::View(_) => f.write_str("View(..)"),
        }
    }
}

impl From<&str> for ContentSource {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ContentSource {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Default for ContentSource {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// Content renderer failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The view adapter reported a failure.
    Mount(String),
    /// The host refused a content operation.
    Host(HostError),
}

impl RenderError {
    pub fn mount(message: impl Into<String>) -> Self {
        Self::Mount(message.into())
    }
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mount(message) => write!(f, "content mount failed: {message}"),
            Self::Host(err) => write!(f, "content host operation failed: {err}"),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Host(err) => Some(err),
            Self::Mount(_) => None,
        }
    }
}

impl From<HostError> for RenderError {
    fn from(value: HostError) -> Self {
        Self::Host(value)
    }
}
