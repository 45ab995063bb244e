//! In-process host with a computed layout.
//!
//! Element rectangles are derived from placements the same way a browser
//! skin would lay them out: markers are centred on their percentage of the
//! track, tooltips hang centred above their pixel point, modal surfaces cover
//! the root. Tests can override any rectangle with `set_rect`.

use crate::geometry::Rect;
use crate::host::{ElementId, ElementRole, ElementSpec, Host, HostError, Layout, Placement};
use std::collections::{BTreeMap, HashSet};

const DEFAULT_ROOT_RECT: Rect = Rect::new(0.0, 0.0, 800.0, 450.0);
const DEFAULT_TRACK_RECT: Rect = Rect::new(10.0, 410.0, 780.0, 10.0);
const DEFAULT_MARKER_SIZE: (f64, f64) = (6.0, 10.0);
const DEFAULT_TOOLTIP_SIZE: (f64, f64) = (200.0, 60.0);

/// One element in the in-memory tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MemElement {
    pub role: ElementRole,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub parent: Option<ElementId>,
    pub placement: Option<Placement>,
    pub visible: bool,
    pub text: String,
    rect_override: Option<Rect>,
}

impl MemElement {
    fn new(spec: ElementSpec, parent: Option<ElementId>) -> Self {
        Self {
            role: spec.role,
            classes: spec.classes,
            attributes: spec.attributes,
            parent,
            placement: None,
            visible: true,
            text: String::new(),
            rect_override: None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Deterministic host for tests, demos and headless embedding.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    duration: f64,
    paused: bool,
    pause_calls: usize,
    viewport_width: f64,
    root: Option<ElementId>,
    track: Option<ElementId>,
    root_rect: Rect,
    track_rect: Rect,
    marker_size: (f64, f64),
    tooltip_size: (f64, f64),
    elements: BTreeMap<ElementId, MemElement>,
    next_id: u64,
    rejected_role: Option<ElementRole>,
}

impl MemoryHost {
    /// Creates a paused host with a root container and a marker track.
    pub fn new(duration: f64) -> Self {
        let mut host = Self {
            duration,
            paused: true,
            pause_calls: 0,
            viewport_width: DEFAULT_ROOT_RECT.width,
            root: None,
            track: None,
            root_rect: DEFAULT_ROOT_RECT,
            track_rect: DEFAULT_TRACK_RECT,
            marker_size: DEFAULT_MARKER_SIZE,
            tooltip_size: DEFAULT_TOOLTIP_SIZE,
            elements: BTreeMap::new(),
            next_id: 1,
            rejected_role: None,
        };
        let root = host.insert(
            ElementSpec {
                role: ElementRole::Content,
                classes: vec!["player".to_string()],
                attributes: vec![],
            },
            None,
        );
        host.root = Some(root);
        host.rebuild_track();
        host
    }

    pub fn with_root_rect(mut self, rect: Rect) -> Self {
        self.root_rect = rect;
        self
    }

    pub fn with_track_rect(mut self, rect: Rect) -> Self {
        self.track_rect = rect;
        self
    }

    pub fn with_viewport_width(mut self, width: f64) -> Self {
        self.viewport_width = width;
        self
    }

    pub fn with_tooltip_size(mut self, width: f64, height: f64) -> Self {
        self.tooltip_size = (width, height);
        self
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
    }

    pub fn play(&mut self) {
        self.paused = false;
    }

    /// Number of times the core asked the host to pause.
    pub fn pause_calls(&self) -> usize {
        self.pause_calls
    }

    /// Drops the marker track and everything on it.
    pub fn remove_track(&mut self) {
        if let Some(track) = self.track.take() {
            self.remove_element(track);
        }
    }

    /// Replaces the marker track, as a skin does when it rebuilds its controls.
    pub fn rebuild_track(&mut self) -> ElementId {
        self.remove_track();
        let parent = self.root;
        let track = self.insert(
            ElementSpec {
                role: ElementRole::Content,
                classes: vec!["progress-holder".to_string()],
                attributes: vec![],
            },
            parent,
        );
        self.track = Some(track);
        track
    }

    /// Makes the next creations of `role` fail until cleared.
    pub fn reject_role(&mut self, role: Option<ElementRole>) {
        self.rejected_role = role;
    }

    /// Creates a detached host content node.
    pub fn create_content_node(&mut self, text: &str) -> ElementId {
        let id = self.insert(
            ElementSpec {
                role: ElementRole::Content,
                classes: vec![],
                attributes: vec![],
            },
            None,
        );
        if let Some(element) = self.elements.get_mut(&id) {
            element.text = text.to_string();
        }
        id
    }

    pub fn set_rect(&mut self, element: ElementId, rect: Rect) {
        if let Some(element) = self.elements.get_mut(&element) {
            element.rect_override = Some(rect);
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&MemElement> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Live elements of `role`, in creation order.
    pub fn elements_with_role(&self, role: ElementRole) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|(_, element)| element.role == role)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn children_of(&self, parent: ElementId) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|(_, element)| element.parent == Some(parent))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Marker percentages keyed by the marker's note id attribute.
    pub fn marker_positions(&self) -> Vec<(String, f64)> {
        self.elements
            .values()
            .filter(|element| element.role == ElementRole::Marker)
            .filter_map(|element| {
                let id = element.attribute(crate::host::NOTE_ID_ATTRIBUTE)?;
                match element.placement {
                    Some(Placement::Percent { left }) => Some((id.to_string(), left)),
                    _ => None,
                }
            })
            .collect()
    }

    fn insert(&mut self, spec: ElementSpec, parent: Option<ElementId>) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, MemElement::new(spec, parent));
        id
    }

    fn is_connected(&self, id: ElementId) -> bool {
        self.ancestors(id).any(|cursor| Some(cursor) == self.root)
    }

    /// `id` followed by its parents, stopping at the first repeated element.
    fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut seen = HashSet::new();
        let mut current = Some(id);
        std::iter::from_fn(move || {
            let cursor = current?;
            if !seen.insert(cursor) {
                return None;
            }
            current = self.elements.get(&cursor).and_then(|element| element.parent);
            Some(cursor)
        })
    }

    fn computed_rect(&self, id: ElementId, element: &MemElement) -> Option<Rect> {
        if let Some(rect) = element.rect_override {
            return Some(rect);
        }
        if Some(id) == self.root {
            return Some(self.root_rect);
        }
        if Some(id) == self.track {
            return Some(self.track_rect);
        }
        match (element.role, element.placement) {
            (ElementRole::Marker, Some(Placement::Percent { left })) => {
                let parent = self.bounding_rect(element.parent?)?;
                let (width, height) = self.marker_size;
                Some(Rect::new(
                    parent.left + parent.width * left / 100.0 - width / 2.0,
                    parent.top + (parent.height - height) / 2.0,
                    width,
                    height,
                ))
            }
            (ElementRole::Tooltip, Some(Placement::Pixels { left, top })) => {
                let (width, height) = self.tooltip_size;
                Some(Rect::new(
                    self.root_rect.left + left - width / 2.0,
                    self.root_rect.top + top - height,
                    width,
                    height,
                ))
            }
            (ElementRole::Modal | ElementRole::ModalBackdrop, _) => Some(self.root_rect),
            _ => element
                .parent
                .and_then(|parent| self.bounding_rect(parent)),
        }
    }
}

impl Layout for MemoryHost {
    fn bounding_rect(&self, element: ElementId) -> Option<Rect> {
        if !self.is_connected(element) {
            return None;
        }
        let node = self.elements.get(&element)?;
        self.computed_rect(element, node)
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }
}

impl Host for MemoryHost {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn pause(&mut self) {
        self.pause_calls += 1;
        self.paused = true;
    }

    fn root(&self) -> Option<ElementId> {
        self.root
    }

    fn marker_track(&self) -> Option<ElementId> {
        self.track
    }

    fn create_element(
        &mut self,
        parent: ElementId,
        spec: ElementSpec,
    ) -> Result<ElementId, HostError> {
        if self.rejected_role == Some(spec.role) {
            return Err(HostError::CreateRejected(spec.role));
        }
        if !self.elements.contains_key(&parent) {
            return Err(HostError::UnknownElement(parent));
        }
        Ok(self.insert(spec, Some(parent)))
    }

    fn remove_element(&mut self, element: ElementId) -> bool {
        if self.elements.remove(&element).is_none() {
            return false;
        }
        let children = self.children_of(element);
        for child in children {
            self.remove_element(child);
        }
        true
    }

    fn set_placement(&mut self, element: ElementId, placement: Placement) {
        if let Some(element) = self.elements.get_mut(&element) {
            element.placement = Some(placement);
        }
    }

    fn set_visible(&mut self, element: ElementId, visible: bool) {
        if let Some(element) = self.elements.get_mut(&element) {
            element.visible = visible;
        }
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        if let Some(element) = self.elements.get_mut(&element) {
            element.text = text.to_string();
        }
    }

    fn attach_node(&mut self, container: ElementId, node: ElementId) -> Result<(), HostError> {
        if !self.elements.contains_key(&container) {
            return Err(HostError::UnknownElement(container));
        }
        if self.ancestors(container).any(|ancestor| ancestor == node) {
            return Err(HostError::AttachCycle { container, node });
        }
        match self.elements.get_mut(&node) {
            Some(element) => {
                element.parent = Some(container);
                Ok(())
            }
            None => Err(HostError::UnknownElement(node)),
        }
    }

    fn detach_node(&mut self, node: ElementId) -> bool {
        match self.elements.get_mut(&node) {
            Some(element) => element.parent.take().is_some(),
            None => false,
        }
    }
}
