//! Tooltip and modal coordinator.
//!
//! # Responsibility
//! - Open, position, correct and close the single tooltip.
//! - Open and close the single modal with its backdrop.
//!
//! # Invariants
//! - `tooltip` and `modal` each hold at most one overlay.
//! - Any previous overlay of the same kind is released before a new one is
//!   created; opening a modal releases the tooltip as well.
//! - On mount failure the partially built overlay is released before the
//!   error is returned.

use crate::config::NotesConfig;
use crate::geometry::{anchor_of, edge_shift};
use crate::host::{ElementId, ElementSpec, Host, Placement};
use crate::model::content::ContentSource;
use crate::model::note::NoteId;
use crate::overlay::content::mount_content;
use crate::overlay::tracker::{OverlayId, ResourceTracker, TimerAction, TimerId};
use crate::overlay::{OverlayError, OverlayKind};
use log::{debug, info};
use std::fmt::{Debug, Formatter};

/// Called with the modal's note after a backdrop click closed it.
pub type BackdropCallback = Box<dyn FnMut(NoteId)>;

/// Per-open modal options.
#[derive(Default)]
pub struct ModalOptions {
    pub on_backdrop_click: Option<BackdropCallback>,
}

impl ModalOptions {
    pub fn on_backdrop_click(callback: impl FnMut(NoteId) + 'static) -> Self {
        Self {
            on_backdrop_click: Some(Box::new(callback)),
        }
    }
}

impl Debug for ModalOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalOptions")
            .field("on_backdrop_click", &self.on_backdrop_click.is_some())
            .finish()
    }
}

/// Positioning and playback policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorSettings {
    pub tooltip_offset_px: f64,
    pub edge_buffer_px: f64,
    pub pause_on_modal: bool,
}

impl From<&NotesConfig> for CoordinatorSettings {
    fn from(value: &NotesConfig) -> Self {
        Self {
            tooltip_offset_px: value.tooltip_offset_px,
            edge_buffer_px: value.edge_buffer_px,
            pause_on_modal: value.pause_on_modal,
        }
    }
}

#[derive(Debug)]
struct ActiveTooltip {
    note_id: NoteId,
    overlay: OverlayId,
    container: ElementId,
    left: f64,
    top: f64,
    frame: Option<TimerId>,
}

struct ActiveModal {
    note_id: NoteId,
    overlay: OverlayId,
    backdrop: ElementId,
    container: ElementId,
    on_backdrop_click: Option<BackdropCallback>,
}

/// Side effects of a successful `open_modal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalOpened {
    /// Modal that was open before and got replaced.
    pub replaced: Option<NoteId>,
    /// Tooltip that was closed to make room.
    pub closed_tooltip: Option<NoteId>,
    /// Whether playback was paused.
    pub paused: bool,
}

/// Owner of the active tooltip and modal for one timeline.
pub struct OverlayCoordinator {
    settings: CoordinatorSettings,
    tooltip: Option<ActiveTooltip>,
    modal: Option<ActiveModal>,
}

impl OverlayCoordinator {
    pub fn new(settings: CoordinatorSettings) -> Self {
        Self {
            settings,
            tooltip: None,
            modal: None,
        }
    }

    pub fn tooltip_note(&self) -> Option<NoteId> {
        self.tooltip.as_ref().map(|tooltip| tooltip.note_id)
    }

    pub fn tooltip_container(&self) -> Option<ElementId> {
        self.tooltip.as_ref().map(|tooltip| tooltip.container)
    }

    pub fn modal_note(&self) -> Option<NoteId> {
        self.modal.as_ref().map(|modal| modal.note_id)
    }

    pub fn modal_elements(&self) -> Option<(ElementId, ElementId)> {
        self.modal
            .as_ref()
            .map(|modal| (modal.backdrop, modal.container))
    }

    /// Opens the tooltip for `note_id` under `marker`.
    ///
    /// Returns the note whose tooltip was superseded, if any.
    pub fn show_tooltip(
        &mut self,
        host: &mut dyn Host,
        tracker: &mut ResourceTracker,
        note_id: NoteId,
        marker: ElementId,
        content: &ContentSource,
    ) -> Result<Option<NoteId>, OverlayError> {
        let superseded = self.hide_tooltip(host, tracker);

        let root = host.root().ok_or(OverlayError::MissingRoot)?;
        let anchor = anchor_of(&*host, Some(marker), Some(root))
            .ok_or(OverlayError::AnchorUnavailable(note_id))?;
        let container = host.create_element(root, ElementSpec::tooltip())?;
        let overlay = tracker.track_overlay(OverlayKind::Tooltip, vec![container]);

        let left = anchor.center_x();
        let top = anchor.y - self.settings.tooltip_offset_px;
        host.set_placement(container, Placement::Pixels { left, top });
        host.set_visible(container, true);

        match mount_content(host, container, content) {
            Ok(disposer) => tracker.set_disposer(overlay, disposer),
            Err(source) => {
                tracker.release_overlay(overlay, host);
                return Err(OverlayError::Render {
                    kind: OverlayKind::Tooltip,
                    source,
                });
            }
        }

        let frame = tracker.request_frame(TimerAction::CorrectTooltip(overlay));
        self.tooltip = Some(ActiveTooltip {
            note_id,
            overlay,
            container,
            left,
            top,
            frame: Some(frame),
        });
        debug!(
            "event=tooltip_open module=overlay status=ok note_id={note_id} content={} left={left:.1} top={top:.1}",
            content.kind()
        );
        Ok(superseded)
    }

    /// Closes the tooltip. Returns the note it belonged to.
    pub fn hide_tooltip(
        &mut self,
        host: &mut dyn Host,
        tracker: &mut ResourceTracker,
    ) -> Option<NoteId> {
        let tooltip = self.tooltip.take()?;
        if let Some(frame) = tooltip.frame {
            tracker.cancel_timer(frame);
        }
        tracker.release_overlay(tooltip.overlay, host);
        debug!(
            "event=tooltip_close module=overlay status=ok note_id={}",
            tooltip.note_id
        );
        Some(tooltip.note_id)
    }

    /// Post-layout correction keeping the tooltip inside the viewport.
    ///
    /// Returns the applied horizontal shift.
    pub fn correct_tooltip(
        &mut self,
        host: &mut dyn Host,
        frame: TimerId,
        overlay: OverlayId,
    ) -> f64 {
        let Some(tooltip) = self.tooltip.as_mut() else {
            return 0.0;
        };
        if tooltip.overlay != overlay || tooltip.frame != Some(frame) {
            return 0.0;
        }
        tooltip.frame = None;

        let Some(rect) = host.bounding_rect(tooltip.container) else {
            return 0.0;
        };
        let shift = edge_shift(rect, host.viewport_width(), self.settings.edge_buffer_px);
        if shift != 0.0 {
            tooltip.left += shift;
            host.set_placement(
                tooltip.container,
                Placement::Pixels {
                    left: tooltip.left,
                    top: tooltip.top,
                },
            );
            debug!(
                "event=tooltip_edge_correct module=overlay status=ok note_id={} shift={shift:.1}",
                tooltip.note_id
            );
        }
        shift
    }

    /// Recomputes the tooltip anchor from `marker`, e.g. after a resize.
    ///
    /// Returns `false` when the marker cannot be measured any more.
    pub fn reposition_tooltip(
        &mut self,
        host: &mut dyn Host,
        tracker: &mut ResourceTracker,
        marker: ElementId,
    ) -> bool {
        let Some(tooltip) = self.tooltip.as_mut() else {
            return true;
        };
        let Some(anchor) = anchor_of(&*host, Some(marker), host.root()) else {
            return false;
        };
        tooltip.left = anchor.center_x();
        tooltip.top = anchor.y - self.settings.tooltip_offset_px;
        host.set_placement(
            tooltip.container,
            Placement::Pixels {
                left: tooltip.left,
                top: tooltip.top,
            },
        );
        if let Some(frame) = tooltip.frame.take() {
            tracker.cancel_timer(frame);
        }
        tooltip.frame = Some(tracker.request_frame(TimerAction::CorrectTooltip(tooltip.overlay)));
        true
    }

    /// Opens the modal for `note_id`, replacing any open modal and tooltip.
    pub fn open_modal(
        &mut self,
        host: &mut dyn Host,
        tracker: &mut ResourceTracker,
        note_id: NoteId,
        content: &ContentSource,
        options: ModalOptions,
    ) -> Result<ModalOpened, OverlayError> {
        let replaced = self.close_modal(host, tracker);
        let closed_tooltip = self.hide_tooltip(host, tracker);

        let root = host.root().ok_or(OverlayError::MissingRoot)?;
        let backdrop = host.create_element(root, ElementSpec::modal_backdrop())?;
        let container = match host.create_element(root, ElementSpec::modal()) {
            Ok(container) => container,
            Err(err) => {
                host.remove_element(backdrop);
                return Err(err.into());
            }
        };
        let overlay = tracker.track_overlay(OverlayKind::Modal, vec![backdrop, container]);

        match mount_content(host, container, content) {
            Ok(disposer) => tracker.set_disposer(overlay, disposer),
            Err(source) => {
                tracker.release_overlay(overlay, host);
                return Err(OverlayError::Render {
                    kind: OverlayKind::Modal,
                    source,
                });
            }
        }

        let paused = self.settings.pause_on_modal && !host.is_paused();
        if paused {
            host.pause();
        }

        self.modal = Some(ActiveModal {
            note_id,
            overlay,
            backdrop,
            container,
            on_backdrop_click: options.on_backdrop_click,
        });
        info!(
            "event=modal_open module=overlay status=ok note_id={note_id} content={} paused={paused}",
            content.kind()
        );
        Ok(ModalOpened {
            replaced,
            closed_tooltip,
            paused,
        })
    }

    /// Closes the modal; a no-op without one. Returns the note it belonged to.
    pub fn close_modal(
        &mut self,
        host: &mut dyn Host,
        tracker: &mut ResourceTracker,
    ) -> Option<NoteId> {
        let modal = self.modal.take()?;
        tracker.release_overlay(modal.overlay, host);
        info!(
            "event=modal_close module=overlay status=ok note_id={}",
            modal.note_id
        );
        Some(modal.note_id)
    }

    /// Closes the modal from its backdrop and notifies the open-time callback.
    pub fn backdrop_clicked(
        &mut self,
        host: &mut dyn Host,
        tracker: &mut ResourceTracker,
    ) -> Option<NoteId> {
        let callback = self
            .modal
            .as_mut()
            .and_then(|modal| modal.on_backdrop_click.take());
        let note_id = self.close_modal(host, tracker)?;
        if let Some(mut callback) = callback {
            callback(note_id);
        }
        Some(note_id)
    }

    /// Drops references to overlays the tracker already released.
    ///
    /// Returns `(tooltip, modal)` notes that were open.
    pub fn forget_all(&mut self) -> (Option<NoteId>, Option<NoteId>) {
        let tooltip = self.tooltip.take().map(|tooltip| tooltip.note_id);
        let modal = self.modal.take().map(|modal| modal.note_id);
        (tooltip, modal)
    }
}

#[cfg(test)]
mod tests {
    use super::{CoordinatorSettings, ModalOptions, OverlayCoordinator};
    use crate::geometry::Rect;
    use crate::host::{ElementId, ElementRole, ElementSpec, Host, Layout, MemoryHost, Placement};
    use crate::model::content::{ContentSource, RenderError, ViewAdapter};
    use crate::overlay::tracker::{ResourceTracker, TimerAction};
    use crate::overlay::{OverlayError, OverlayKind};
    use std::cell::RefCell;
    use std::rc::Rc;
    use uuid::Uuid;

    struct FailingView;

    impl ViewAdapter for FailingView {
        fn mount(&self, _container: ElementId) -> Result<(), RenderError> {
            Err(RenderError::mount("boom"))
        }

        fn unmount(&self) -> Result<(), RenderError> {
            Ok(())
        }
    }

    fn settings() -> CoordinatorSettings {
        CoordinatorSettings {
            tooltip_offset_px: 12.0,
            edge_buffer_px: 24.0,
            pause_on_modal: true,
        }
    }

    fn marker_at(host: &mut MemoryHost, percent: f64) -> ElementId {
        let track = host.marker_track().expect("track");
        let marker = host
            .create_element(track, ElementSpec::marker("m", None))
            .expect("marker");
        host.set_placement(marker, Placement::Percent { left: percent });
        marker
    }

    #[test]
    fn tooltip_hangs_above_marker_centre() {
        let mut host = MemoryHost::new(100.0);
        let mut tracker = ResourceTracker::new();
        let mut coordinator = OverlayCoordinator::new(settings());
        let marker = marker_at(&mut host, 50.0);
        let note = Uuid::new_v4();

        coordinator
            .show_tooltip(&mut host, &mut tracker, note, marker, &"hello".into())
            .expect("tooltip opens");

        let container = coordinator.tooltip_container().expect("container");
        let element = host.element(container).expect("tooltip element");
        assert_eq!(element.text, "hello");
        assert_eq!(
            element.placement,
            Some(Placement::Pixels {
                left: 400.0,
                top: 398.0
            })
        );
    }

    #[test]
    fn second_tooltip_supersedes_first() {
        let mut host = MemoryHost::new(100.0);
        let mut tracker = ResourceTracker::new();
        let mut coordinator = OverlayCoordinator::new(settings());
        let first_marker = marker_at(&mut host, 20.0);
        let second_marker = marker_at(&mut host, 60.0);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        coordinator
            .show_tooltip(&mut host, &mut tracker, first, first_marker, &"a".into())
            .expect("first tooltip");
        let superseded = coordinator
            .show_tooltip(&mut host, &mut tracker, second, second_marker, &"b".into())
            .expect("second tooltip");

        assert_eq!(superseded, Some(first));
        assert_eq!(coordinator.tooltip_note(), Some(second));
        assert_eq!(host.elements_with_role(ElementRole::Tooltip).len(), 1);
        assert_eq!(tracker.live_overlay_count_of(OverlayKind::Tooltip), 1);
        assert_eq!(tracker.pending_timer_count(), 1);
    }

    #[test]
    fn edge_correction_shifts_tooltip_inside_viewport() {
        let mut host = MemoryHost::new(100.0).with_track_rect(Rect::new(0.0, 410.0, 800.0, 10.0));
        let mut tracker = ResourceTracker::new();
        let mut coordinator = OverlayCoordinator::new(settings());
        let marker = marker_at(&mut host, 1.0);

        coordinator
            .show_tooltip(&mut host, &mut tracker, Uuid::new_v4(), marker, &"edge".into())
            .expect("tooltip opens");
        let frames = tracker.take_frame_requests();
        let (frame, action) = frames[0];
        let TimerAction::CorrectTooltip(overlay) = action else {
            panic!("expected a correction frame");
        };

        let shift = coordinator.correct_tooltip(&mut host, frame, overlay);
        // Tooltip is 200px wide, centred on x=8: left edge at -92.
        assert_eq!(shift, 24.0 + 92.0);
        let container = coordinator.tooltip_container().expect("container");
        let rect = host.bounding_rect(container).expect("rect");
        assert_eq!(rect.left, 24.0);

        assert_eq!(coordinator.correct_tooltip(&mut host, frame, overlay), 0.0);
    }

    #[test]
    fn failed_tooltip_mount_leaves_nothing_behind() {
        let mut host = MemoryHost::new(100.0);
        let mut tracker = ResourceTracker::new();
        let mut coordinator = OverlayCoordinator::new(settings());
        let marker = marker_at(&mut host, 50.0);

        let err = coordinator
            .show_tooltip(
                &mut host,
                &mut tracker,
                Uuid::new_v4(),
                marker,
                &ContentSource::view(FailingView),
            )
            .expect_err("mount must fail");
        assert!(matches!(
            err,
            OverlayError::Render {
                kind: OverlayKind::Tooltip,
                ..
            }
        ));
        assert!(coordinator.tooltip_note().is_none());
        assert!(host.elements_with_role(ElementRole::Tooltip).is_empty());
        assert_eq!(tracker.live_overlay_count(), 0);
        assert_eq!(tracker.pending_timer_count(), 0);
    }

    #[test]
    fn modal_replaces_tooltip_and_pauses_playback() {
        let mut host = MemoryHost::new(100.0);
        host.play();
        let mut tracker = ResourceTracker::new();
        let mut coordinator = OverlayCoordinator::new(settings());
        let marker = marker_at(&mut host, 50.0);
        let tooltip_note = Uuid::new_v4();
        let modal_note = Uuid::new_v4();

        coordinator
            .show_tooltip(&mut host, &mut tracker, tooltip_note, marker, &"tip".into())
            .expect("tooltip");
        let opened = coordinator
            .open_modal(
                &mut host,
                &mut tracker,
                modal_note,
                &"body".into(),
                ModalOptions::default(),
            )
            .expect("modal");

        assert_eq!(opened.closed_tooltip, Some(tooltip_note));
        assert!(opened.paused);
        assert!(host.is_paused());
        assert!(coordinator.tooltip_note().is_none());
        let (backdrop, container) = coordinator.modal_elements().expect("modal elements");
        assert_eq!(host.elements_with_role(ElementRole::Modal), vec![container]);
        assert_eq!(
            host.elements_with_role(ElementRole::ModalBackdrop),
            vec![backdrop]
        );
        assert_eq!(host.element(container).expect("modal").text, "body");
    }

    #[test]
    fn modal_respects_pause_policy() {
        let mut host = MemoryHost::new(100.0);
        host.play();
        let mut tracker = ResourceTracker::new();
        let mut coordinator = OverlayCoordinator::new(CoordinatorSettings {
            pause_on_modal: false,
            ..settings()
        });

        let opened = coordinator
            .open_modal(
                &mut host,
                &mut tracker,
                Uuid::new_v4(),
                &"body".into(),
                ModalOptions::default(),
            )
            .expect("modal");
        assert!(!opened.paused);
        assert!(!host.is_paused());
    }

    #[test]
    fn failed_modal_mount_removes_backdrop_and_container() {
        let mut host = MemoryHost::new(100.0);
        let mut tracker = ResourceTracker::new();
        let mut coordinator = OverlayCoordinator::new(settings());

        let err = coordinator
            .open_modal(
                &mut host,
                &mut tracker,
                Uuid::new_v4(),
                &ContentSource::view(FailingView),
                ModalOptions::default(),
            )
            .expect_err("mount must fail");
        assert!(matches!(
            err,
            OverlayError::Render {
                kind: OverlayKind::Modal,
                ..
            }
        ));
        assert!(coordinator.modal_note().is_none());
        assert!(host.elements_with_role(ElementRole::Modal).is_empty());
        assert!(host.elements_with_role(ElementRole::ModalBackdrop).is_empty());
        assert_eq!(tracker.live_overlay_count(), 0);
    }

    #[test]
    fn backdrop_click_closes_then_notifies() {
        let mut host = MemoryHost::new(100.0);
        let mut tracker = ResourceTracker::new();
        let mut coordinator = OverlayCoordinator::new(settings());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let note = Uuid::new_v4();

        coordinator
            .open_modal(
                &mut host,
                &mut tracker,
                note,
                &"body".into(),
                ModalOptions::on_backdrop_click(move |id| sink.borrow_mut().push(id)),
            )
            .expect("modal");

        assert_eq!(coordinator.backdrop_clicked(&mut host, &mut tracker), Some(note));
        assert_eq!(*seen.borrow(), vec![note]);
        assert!(coordinator.modal_note().is_none());
        assert!(coordinator.close_modal(&mut host, &mut tracker).is_none());
        assert!(coordinator.backdrop_clicked(&mut host, &mut tracker).is_none());
    }
}
