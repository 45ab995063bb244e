//! Host collaborator contracts.
//!
//! # Responsibility
//! - Describe the minimal element tree the core needs from a player host.
//! - Keep every rendering technology behind opaque `ElementId` handles.
//!
//! # Invariants
//! - The core never assumes an element still exists; every host call that
//!   touches an element tolerates a stale handle.
//! - Layout queries are answered fresh on every call (no caching in core).
//!
//! # See also
//! - `memory::MemoryHost` for the in-process implementation used by tests.

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;

pub use memory::{MemElement, MemoryHost};

/// Opaque handle to one host element.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ElementId(pub u64);

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "el#{}", self.0)
    }
}

/// Semantic role of an element created by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementRole {
    /// Timeline marker attached to the marker track.
    Marker,
    /// Tooltip surface attached to the host root.
    Tooltip,
    /// Full-size click catcher behind the modal.
    ModalBackdrop,
    /// Modal surface attached to the host root.
    Modal,
    /// Host-owned content node (never created by the core).
    Content,
}

/// Creation request for one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    pub role: ElementRole,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
}

/// Class applied to every marker element.
pub const MARKER_CLASS: &str = "note-marker";
/// Class applied to the tooltip surface.
pub const TOOLTIP_CLASS: &str = "note-tooltip";
/// Class applied to the modal backdrop.
pub const MODAL_BACKDROP_CLASS: &str = "note-modal-backdrop";
/// Class applied to the modal surface.
pub const MODAL_CLASS: &str = "note-modal";
/// Attribute carrying the note id on marker elements.
pub const NOTE_ID_ATTRIBUTE: &str = "data-note-id";

impl ElementSpec {
    /// Keyboard-reachable marker for one note.
    pub fn marker(note_id: impl Display, extra_class: Option<&str>) -> Self {
        let mut classes = vec![MARKER_CLASS.to_string()];
        if let Some(extra) = extra_class {
            classes.extend(extra.split_whitespace().map(str::to_string));
        }
        Self {
            role: ElementRole::Marker,
            classes,
            attributes: vec![
                (NOTE_ID_ATTRIBUTE.to_string(), note_id.to_string()),
                ("role".to_string(), "button".to_string()),
                ("tabindex".to_string(), "0".to_string()),
                ("aria-label".to_string(), "Note marker".to_string()),
            ],
        }
    }

    pub fn tooltip() -> Self {
        Self {
            role: ElementRole::Tooltip,
            classes: vec![TOOLTIP_CLASS.to_string()],
            attributes: vec![("role".to_string(), "tooltip".to_string())],
        }
    }

    pub fn modal_backdrop() -> Self {
        Self {
            role: ElementRole::ModalBackdrop,
            classes: vec![MODAL_BACKDROP_CLASS.to_string()],
            attributes: vec![],
        }
    }

    pub fn modal() -> Self {
        Self {
            role: ElementRole::Modal,
            classes: vec![MODAL_CLASS.to_string()],
            attributes: vec![
                ("role".to_string(), "dialog".to_string()),
                ("aria-modal".to_string(), "true".to_string()),
            ],
        }
    }
}

/// Where an element is placed inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Horizontal percentage of the parent width (markers).
    Percent { left: f64 },
    /// Bottom-centre point in pixels relative to the host root (tooltips).
    ///
    /// The host centres the surface horizontally on `left` and places its
    /// bottom edge at `top`.
    Pixels { left: f64, top: f64 },
}

/// Host-side element operation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The handle does not name a live element.
    UnknownElement(ElementId),
    /// The host refused to create an element of this role.
    CreateRejected(ElementRole),
    /// Attaching `node` under `container` would nest it inside itself.
    AttachCycle { container: ElementId, node: ElementId },
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownElement(id) => write!(f, "unknown host element: {id}"),
            Self::CreateRejected(role) => write!(f, "host rejected element creation: {role:?}"),
            Self::AttachCycle { container, node } => {
                write!(f, "cannot attach {node} inside its own descendant {container}")
            }
        }
    }
}

impl Error for HostError {}

/// Read-only layout queries.
pub trait Layout {
    /// Element rectangle in viewport coordinates, `None` when detached.
    fn bounding_rect(&self, element: ElementId) -> Option<Rect>;
    /// Current viewport width in pixels.
    fn viewport_width(&self) -> f64;
}

/// Player host consumed by the core.
///
/// Implementations own playback state and the element tree. The core only
/// creates, positions and removes elements it asked for, and attaches host
/// content nodes into containers it created.
pub trait Host: Layout {
    /// Media duration in seconds; NaN, infinite or non-positive means unknown.
    fn duration(&self) -> f64;
    fn is_paused(&self) -> bool;
    fn pause(&mut self);

    /// Player root; overlays are appended here.
    fn root(&self) -> Option<ElementId>;
    /// Progress track; markers are appended here.
    fn marker_track(&self) -> Option<ElementId>;

    fn create_element(
        &mut self,
        parent: ElementId,
        spec: ElementSpec,
    ) -> Result<ElementId, HostError>;
    /// Best-effort removal; returns `false` when the element was already gone.
    fn remove_element(&mut self, element: ElementId) -> bool;
    fn set_placement(&mut self, element: ElementId, placement: Placement);
    fn set_visible(&mut self, element: ElementId, visible: bool);
    fn set_text(&mut self, element: ElementId, text: &str);
    /// Moves a host content node into `container`.
    fn attach_node(&mut self, container: ElementId, node: ElementId) -> Result<(), HostError>;
    /// Detaches a content node without destroying it.
    fn detach_node(&mut self, node: ElementId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::{ElementRole, ElementSpec, MARKER_CLASS, NOTE_ID_ATTRIBUTE};

    #[test]
    fn marker_spec_is_keyboard_reachable_and_tagged() {
        let spec = ElementSpec::marker("n-1", Some("chapter  highlight"));
        assert_eq!(spec.role, ElementRole::Marker);
        assert_eq!(
            spec.classes,
            vec![
                MARKER_CLASS.to_string(),
                "chapter".to_string(),
                "highlight".to_string()
            ]
        );
        assert!(spec
            .attributes
            .contains(&(NOTE_ID_ATTRIBUTE.to_string(), "n-1".to_string())));
        assert!(spec
            .attributes
            .contains(&("tabindex".to_string(), "0".to_string())));
    }
}
