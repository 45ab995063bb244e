//! Mounting content sources into overlay containers.

use crate::host::{ElementId, Host};
use crate::model::content::{ContentSource, RenderError, ViewAdapter};
use log::warn;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Undo action returned by a successful mount.
pub(crate) enum Disposer {
    ClearText(ElementId),
    DetachNode(ElementId),
    Unmount(Rc<dyn ViewAdapter>),
}

impl Debug for Disposer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClearText(container) => f.debug_tuple("ClearText").field(container).finish(),
            Self::DetachNode(node) => f.debug_tuple("DetachNode").field(node).finish(),
            Self::Unmount(_) => f.write_str("Unmount(..)"),
        }
    }
}

impl Disposer {
    /// Releases mounted content. Adapter failures are logged and swallowed.
    pub(crate) fn dispose(self, host: &mut dyn Host) {
        match self {
            Self::ClearText(container) => host.set_text(container, ""),
            Self::DetachNode(node) => {
                host.detach_node(node);
            }
            Self::Unmount(view) => {
                if let Err(err) = view.unmount() {
                    warn!("event=content_unmount module=overlay status=error error={err}");
                }
            }
        }
    }
}

/// Renders `source` into `container` and returns how to undo it.
pub(crate) fn mount_content(
    host: &mut dyn Host,
    container: ElementId,
    source: &ContentSource,
) -> Result<Disposer, RenderError> {
    match source {
        ContentSource::Text(text) => {
            host.set_text(container, text);
            Ok(Disposer::ClearText(container))
        }
        ContentSource::Node(node) => {
            host.attach_node(container, *node)?;
            Ok(Disposer::DetachNode(*node))
        }
        ContentSource::View(view) => {
            view.mount(container)?;
            Ok(Disposer::Unmount(Rc::clone(view)))
        }
    }
}
