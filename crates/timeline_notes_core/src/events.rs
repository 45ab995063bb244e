//! Host-observable session events.
//!
//! Subscribers run synchronously, in subscription order, inside the session
//! call that produced the event.

use crate::geometry::Anchor;
use crate::host::ElementId;
use crate::model::note::{Note, NoteId};
use crate::overlay::{CloseReason, OverlayKind};

/// Context delivered with marker interaction events.
#[derive(Debug, Clone)]
pub struct MarkerEventPayload {
    pub id: NoteId,
    pub note: Note,
    pub time: f64,
    /// Marker rectangle relative to the host root, measured at emit time.
    pub anchor: Option<Anchor>,
    pub marker: ElementId,
    pub root: Option<ElementId>,
}

#[derive(Debug, Clone)]
pub enum NotesEvent {
    HoverStart(MarkerEventPayload),
    HoverEnd(MarkerEventPayload),
    Activated(MarkerEventPayload),
    MarkersChanged { rendered: usize, total: usize },
    TooltipClosed { id: NoteId, reason: CloseReason },
    ModalClosed { id: NoteId, reason: CloseReason },
    RenderFailed {
        id: NoteId,
        kind: OverlayKind,
        message: String,
    },
}

impl NotesEvent {
    /// Stable event name for logs and host-side routing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HoverStart(_) => "hover_start",
            Self::HoverEnd(_) => "hover_end",
            Self::Activated(_) => "activated",
            Self::MarkersChanged { .. } => "markers_changed",
            Self::TooltipClosed { .. } => "tooltip_closed",
            Self::ModalClosed { .. } => "modal_closed",
            Self::RenderFailed { .. } => "render_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&NotesEvent)>;

/// Synchronous fan-out to subscribed listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&NotesEvent) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn emit(&mut self, event: &NotesEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, NotesEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn delivers_in_order_until_unsubscribed() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first_log = Rc::clone(&log);
        let first = bus.subscribe(move |event| {
            first_log.borrow_mut().push(format!("1:{}", event.name()))
        });
        let second_log = Rc::clone(&log);
        bus.subscribe(move |event| {
            second_log.borrow_mut().push(format!("2:{}", event.name()))
        });

        let event = NotesEvent::MarkersChanged {
            rendered: 1,
            total: 2,
        };
        bus.emit(&event);
        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        bus.emit(&event);

        assert_eq!(
            *log.borrow(),
            vec![
                "1:markers_changed".to_string(),
                "2:markers_changed".to_string(),
                "2:markers_changed".to_string()
            ]
        );
    }
}
