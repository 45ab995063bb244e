//! Overlay lifecycle: hover intent, coordination and resource tracking.
//!
//! # Responsibility
//! - Keep at most one tooltip and at most one modal on screen.
//! - Make every overlay and timer releasable from one teardown call.
//!
//! # Invariants
//! - Competing overlays are closed before a new one is mounted.
//! - A failed mount leaves no container, backdrop or timer behind.

use crate::host::HostError;
use crate::model::content::RenderError;
use crate::model::note::NoteId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub(crate) mod content;
pub mod coordinator;
pub mod hover_intent;
pub mod tracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    Tooltip,
    Modal,
}

impl OverlayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tooltip => "tooltip",
            Self::Modal => "modal",
        }
    }
}

/// Why an overlay was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Hover grace period ran out.
    Elapsed,
    /// Another overlay of the same kind took its place.
    Superseded,
    /// A marker was activated and the modal took over.
    Activation,
    /// The marker it was anchored to no longer exists.
    MarkerRemoved,
    /// The modal backdrop was clicked.
    Backdrop,
    /// The host asked for it explicitly.
    Requested,
    /// The session was disposed.
    Teardown,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Elapsed => "elapsed",
            Self::Superseded => "superseded",
            Self::Activation => "activation",
            Self::MarkerRemoved => "marker_removed",
            Self::Backdrop => "backdrop",
            Self::Requested => "requested",
            Self::Teardown => "teardown",
        }
    }
}

/// Overlay open failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// The session was already disposed.
    Disposed,
    /// The host has no root container to attach overlays to.
    MissingRoot,
    /// No note with this id is registered.
    UnknownNote(NoteId),
    /// The marker the tooltip should hang from cannot be measured.
    AnchorUnavailable(NoteId),
    /// Container or backdrop creation failed.
    Host(HostError),
    /// The content renderer failed; the overlay was rolled back.
    Render {
        kind: OverlayKind,
        source: RenderError,
    },
}

impl Display for OverlayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disposed => write!(f, "notes session already disposed"),
            Self::MissingRoot => write!(f, "host has no root container"),
            Self::UnknownNote(id) => write!(f, "note not found: {id}"),
            Self::AnchorUnavailable(id) => write!(f, "marker anchor unavailable for note {id}"),
            Self::Host(err) => write!(f, "{err}"),
            Self::Render { kind, source } => {
                write!(f, "{} content failed to render: {source}", kind.as_str())
            }
        }
    }
}

impl Error for OverlayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Host(err) => Some(err),
            Self::Render { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<HostError> for OverlayError {
    fn from(value: HostError) -> Self {
        Self::Host(value)
    }
}
