//! Host-facing notes session.
//!
//! # Responsibility
//! - Wire the marker registry, hover intents, overlay coordinator and
//!   resource tracker to one host player.
//! - Translate host input (pointer, focus, keys, clock, frames) into
//!   overlay transitions and session events.
//!
//! # Invariants
//! - At most one tooltip and at most one modal are open at any time.
//! - After `dispose`, no marker, overlay or timer created by the session
//!   remains, and further input and CRUD calls are ignored.
//! - Overlays never outlive the marker they belong to across a render.
//!
//! # See also
//! - `overlay::coordinator` for overlay placement rules.
//! - `registry::marker_registry` for the marker projection.

use crate::config::{ConfigError, NotesConfig};
use crate::events::{EventBus, MarkerEventPayload, NotesEvent, SubscriptionId};
use crate::geometry::{anchor_of, Anchor};
use crate::host::Host;
use crate::model::note::{Note, NoteId, NotePatch};
use crate::overlay::coordinator::{CoordinatorSettings, ModalOptions, OverlayCoordinator};
use crate::overlay::hover_intent::{HoverIntents, HoverOutcome, HoverState};
use crate::overlay::tracker::{DisposeReport, ResourceTracker, TimerAction, TimerId};
use crate::overlay::{CloseReason, OverlayError, OverlayKind};
use crate::registry::marker_registry::{Marker, MarkerRegistry, RenderOutcome};
use log::{debug, error, info};

/// Keys a focused marker can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Enter,
    Space,
    Other,
}

/// Interaction delivered to a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerInput {
    PointerEnter,
    PointerLeave,
    Focus,
    Blur,
    Click,
    Key(KeyInput),
}

/// Pointer interaction delivered to the open tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipInput {
    PointerEnter,
    PointerLeave,
}

/// Timeline notes bound to one host player.
pub struct NotesSession<H: Host> {
    host: H,
    config: NotesConfig,
    registry: MarkerRegistry,
    intents: HoverIntents,
    coordinator: OverlayCoordinator,
    tracker: ResourceTracker,
    events: EventBus,
    disposed: bool,
}

impl<H: Host> NotesSession<H> {
    /// Creates a session. Markers are not rendered until `on_ready`.
    pub fn new(host: H, config: NotesConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "event=session_init module=session status=ok hide_delay_ms={} pause_on_modal={}",
            config.hide_delay_ms, config.pause_on_modal
        );
        Ok(Self {
            registry: MarkerRegistry::new(config.marker_class()),
            coordinator: OverlayCoordinator::new(CoordinatorSettings::from(&config)),
            host,
            config,
            intents: HoverIntents::new(),
            tracker: ResourceTracker::new(),
            events: EventBus::new(),
            disposed: false,
        })
    }

    pub fn with_notes(
        host: H,
        config: NotesConfig,
        notes: impl IntoIterator<Item = Note>,
    ) -> Result<Self, ConfigError> {
        let mut session = Self::new(host, config)?;
        session.registry.set_notes(notes);
        Ok(session)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access, e.g. for a host reporting its duration.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &NotesConfig {
        &self.config
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&NotesEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Player reported metadata/ready.
    pub fn on_ready(&mut self) {
        if self.accepts("on_ready") {
            self.render_markers();
        }
    }

    /// Player or container resized.
    pub fn on_resize(&mut self) {
        if self.accepts("on_resize") {
            self.render_markers();
        }
    }

    /// Re-renders markers from the current note set.
    pub fn refresh(&mut self) {
        if self.accepts("refresh") {
            self.render_markers();
        }
    }

    pub fn notes(&self) -> &[Note] {
        self.registry.notes()
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.registry.markers()
    }

    pub fn set_notes(&mut self, notes: impl IntoIterator<Item = Note>) {
        if !self.accepts("set_notes") {
            return;
        }
        self.registry.set_notes(notes);
        self.render_markers();
    }

    /// Adds a note, replacing one with the same id. Returns `false` when ignored.
    pub fn add_note(&mut self, note: Note) -> bool {
        if !self.accepts("add_note") {
            return false;
        }
        let id = note.id;
        if !self.registry.add_note(note) {
            debug!("event=note_add module=session status=ignored reason=missing_id");
            return false;
        }
        debug!("event=note_add module=session status=ok note_id={id}");
        self.render_markers();
        self.remount_tooltip(id);
        true
    }

    pub fn remove_note(&mut self, id: NoteId) -> bool {
        if !self.accepts("remove_note") || !self.registry.remove_note(id) {
            return false;
        }
        debug!("event=note_remove module=session status=ok note_id={id}");
        self.render_markers();
        true
    }

    /// Patches a note. Unknown ids are a no-op.
    pub fn update_note(&mut self, id: NoteId, patch: NotePatch) -> bool {
        if !self.accepts("update_note") {
            return false;
        }
        let content_patched = patch.content.is_some();
        let Some(changed) = self.registry.update_note(id, patch) else {
            debug!("event=note_update module=session status=ignored note_id={id} reason=unknown_note");
            return false;
        };
        self.render_markers();
        if changed && content_patched {
            self.remount_tooltip(id);
        }
        true
    }

    /// Marker rectangle of a note relative to the host root.
    pub fn get_anchor_by_id(&self, id: NoteId) -> Option<Anchor> {
        self.registry.anchor(&self.host, self.host.root(), id)
    }

    pub fn tooltip_note(&self) -> Option<NoteId> {
        self.coordinator.tooltip_note()
    }

    pub fn modal_note(&self) -> Option<NoteId> {
        self.coordinator.modal_note()
    }

    pub fn hover_state(&self, id: NoteId) -> HoverState {
        self.intents.state_of(id)
    }

    pub fn pending_timer_count(&self) -> usize {
        self.tracker.pending_timer_count()
    }

    pub fn live_overlay_count(&self) -> usize {
        self.tracker.live_overlay_count()
    }

    /// Virtual session clock in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.tracker.now_ms()
    }

    pub fn handle_marker(&mut self, id: NoteId, input: MarkerInput) {
        if !self.accepts("marker_input") {
            return;
        }
        let Some(payload) = self.marker_payload(id) else {
            debug!("event=marker_input module=session status=ignored note_id={id} reason=no_marker");
            return;
        };
        match input {
            MarkerInput::PointerEnter | MarkerInput::Focus => {
                self.emit(NotesEvent::HoverStart(payload));
                self.begin_hover(id);
            }
            MarkerInput::PointerLeave | MarkerInput::Blur => {
                self.emit(NotesEvent::HoverEnd(payload));
                let delay = self.config.hide_delay_ms;
                if let Some(intent) = self.intents.get_mut(id) {
                    intent.leave(&mut self.tracker, delay);
                }
            }
            MarkerInput::Click | MarkerInput::Key(KeyInput::Enter | KeyInput::Space) => {
                self.emit(NotesEvent::Activated(payload));
                if let Err(err) = self.open_modal_for(id, ModalOptions::default()) {
                    self.surface_error(id, OverlayKind::Modal, &err);
                }
            }
            MarkerInput::Key(KeyInput::Other) => {}
        }
    }

    /// Pointer moving onto or off the open tooltip.
    pub fn handle_tooltip(&mut self, input: TooltipInput) {
        if !self.accepts("tooltip_input") {
            return;
        }
        let Some(id) = self.coordinator.tooltip_note() else {
            return;
        };
        let delay = self.config.hide_delay_ms;
        let Some(intent) = self.intents.get_mut(id) else {
            return;
        };
        match input {
            TooltipInput::PointerEnter => intent.tooltip_enter(&mut self.tracker),
            TooltipInput::PointerLeave => intent.leave(&mut self.tracker, delay),
        };
    }

    /// Closes the modal from its backdrop. Returns whether one was open.
    pub fn handle_backdrop_click(&mut self) -> bool {
        if !self.accepts("backdrop_click") {
            return false;
        }
        match self
            .coordinator
            .backdrop_clicked(&mut self.host, &mut self.tracker)
        {
            Some(id) => {
                self.emit(NotesEvent::ModalClosed {
                    id,
                    reason: CloseReason::Backdrop,
                });
                true
            }
            None => false,
        }
    }

    /// Opens the modal for a note, closing any tooltip or other modal first.
    pub fn open_modal(&mut self, id: NoteId, options: ModalOptions) -> Result<(), OverlayError> {
        if !self.accepts("open_modal") {
            return Err(OverlayError::Disposed);
        }
        let result = self.open_modal_for(id, options);
        if let Err(err) = &result {
            self.surface_error(id, OverlayKind::Modal, err);
        }
        result
    }

    pub fn close_modal(&mut self) -> bool {
        if !self.accepts("close_modal") {
            return false;
        }
        self.close_modal_with(CloseReason::Requested)
    }

    pub fn hide_all_tooltips(&mut self) {
        if !self.accepts("hide_all_tooltips") {
            return;
        }
        self.intents.force_hide_all(&mut self.tracker);
        self.hide_tooltip_with(CloseReason::Requested);
    }

    /// Advances the session clock, firing every timer that comes due.
    pub fn advance(&mut self, elapsed_ms: u64) {
        if !self.accepts("advance") {
            return;
        }
        let until = self.tracker.now_ms().saturating_add(elapsed_ms);
        while let Some((timer, action)) = self.tracker.pop_due(until) {
            self.fire(timer, action);
        }
        self.tracker.settle_clock(until);
    }

    /// Runs the callbacks requested for the next animation frame.
    pub fn animation_frame(&mut self) {
        if !self.accepts("animation_frame") {
            return;
        }
        for (timer, action) in self.tracker.take_frame_requests() {
            self.fire(timer, action);
        }
    }

    /// Releases every marker, overlay and timer. Safe to call repeatedly.
    pub fn dispose(&mut self) -> DisposeReport {
        if self.disposed {
            debug!("event=session_dispose module=session status=skipped reason=already_disposed");
            return DisposeReport::default();
        }
        self.disposed = true;

        let report = self.tracker.dispose_all(&mut self.host);
        let (tooltip, modal) = self.coordinator.forget_all();
        self.intents.clear(&mut self.tracker);
        let markers = self.registry.clear(&mut self.host);

        if let Some(id) = tooltip {
            self.emit(NotesEvent::TooltipClosed {
                id,
                reason: CloseReason::Teardown,
            });
        }
        if let Some(id) = modal {
            self.emit(NotesEvent::ModalClosed {
                id,
                reason: CloseReason::Teardown,
            });
        }
        info!(
            "event=session_dispose module=session status=ok markers={markers} overlays={} timers={}",
            report.overlays_released, report.timers_cancelled
        );
        report
    }

    fn accepts(&self, operation: &str) -> bool {
        if self.disposed {
            debug!("event={operation} module=session status=ignored reason=disposed");
        }
        !self.disposed
    }

    fn emit(&mut self, event: NotesEvent) {
        debug!("event=notes_event module=session status=ok name={}", event.name());
        self.events.emit(&event);
    }

    fn render_markers(&mut self) {
        match self.registry.render(&mut self.host) {
            RenderOutcome::Skipped(reason) => {
                debug!("event=markers_render module=session status=skipped reason={reason:?}");
            }
            RenderOutcome::Rendered { markers, .. } => {
                self.reconcile_overlays();
                let total = self.registry.notes().len();
                self.emit(NotesEvent::MarkersChanged {
                    rendered: markers,
                    total,
                });
            }
        }
    }

    /// Drops hover state and the tooltip of notes whose marker is gone, and
    /// re-anchors a surviving tooltip.
    fn reconcile_overlays(&mut self) {
        let registry = &self.registry;
        self.intents
            .retain(&mut self.tracker, |id| registry.marker(id).is_some());

        let Some(id) = self.coordinator.tooltip_note() else {
            return;
        };
        let anchored = match self.registry.marker(id) {
            Some(marker) => {
                let element = marker.element;
                self.coordinator
                    .reposition_tooltip(&mut self.host, &mut self.tracker, element)
            }
            None => false,
        };
        if !anchored {
            if let Some(intent) = self.intents.get_mut(id) {
                intent.force_hide(&mut self.tracker);
            }
            self.hide_tooltip_with(CloseReason::MarkerRemoved);
        }
    }

    fn marker_payload(&self, id: NoteId) -> Option<MarkerEventPayload> {
        let marker = self.registry.marker(id)?;
        let note = self.registry.note(id)?.clone();
        let root = self.host.root();
        Some(MarkerEventPayload {
            id,
            time: note.time,
            note,
            anchor: anchor_of(&self.host, Some(marker.element), root),
            marker: marker.element,
            root,
        })
    }

    fn begin_hover(&mut self, id: NoteId) {
        if self.intents.entry(id).enter(&mut self.tracker) != HoverOutcome::ShowTooltip {
            return;
        }
        self.intents.force_hide_others(id, &mut self.tracker);
        self.show_tooltip_for(id);
    }

    /// Re-renders an open tooltip of `id` from the note's current content.
    /// Hover state and any pending hide timer are kept.
    fn remount_tooltip(&mut self, id: NoteId) {
        if self.coordinator.tooltip_note() == Some(id) {
            debug!("event=tooltip_remount module=session status=ok note_id={id}");
            self.show_tooltip_for(id);
        }
    }

    /// Closes any open tooltip, then mounts the one for `id`.
    fn show_tooltip_for(&mut self, id: NoteId) {
        let (Some(marker), Some(note)) = (self.registry.marker(id), self.registry.note(id)) else {
            return;
        };
        let element = marker.element;
        let content = note.content.clone();

        self.hide_tooltip_with(CloseReason::Superseded);
        if let Err(err) =
            self.coordinator
                .show_tooltip(&mut self.host, &mut self.tracker, id, element, &content)
        {
            if let Some(intent) = self.intents.get_mut(id) {
                intent.force_hide(&mut self.tracker);
            }
            self.surface_error(id, OverlayKind::Tooltip, &err);
        }
    }

    fn open_modal_for(&mut self, id: NoteId, options: ModalOptions) -> Result<(), OverlayError> {
        let content = self
            .registry
            .note(id)
            .ok_or(OverlayError::UnknownNote(id))?
            .modal_source()
            .clone();

        self.intents.force_hide_all(&mut self.tracker);
        self.hide_tooltip_with(CloseReason::Activation);
        self.close_modal_with(CloseReason::Superseded);

        self.coordinator
            .open_modal(&mut self.host, &mut self.tracker, id, &content, options)?;
        Ok(())
    }

    fn hide_tooltip_with(&mut self, reason: CloseReason) -> bool {
        match self.coordinator.hide_tooltip(&mut self.host, &mut self.tracker) {
            Some(id) => {
                self.emit(NotesEvent::TooltipClosed { id, reason });
                true
            }
            None => false,
        }
    }

    fn close_modal_with(&mut self, reason: CloseReason) -> bool {
        match self.coordinator.close_modal(&mut self.host, &mut self.tracker) {
            Some(id) => {
                self.emit(NotesEvent::ModalClosed { id, reason });
                true
            }
            None => false,
        }
    }

    fn fire(&mut self, timer: TimerId, action: TimerAction) {
        match action {
            TimerAction::HideTooltip(id) => {
                let outcome = self
                    .intents
                    .get_mut(id)
                    .map(|intent| intent.timer_elapsed(timer));
                if outcome == Some(HoverOutcome::HideTooltip)
                    && self.coordinator.tooltip_note() == Some(id)
                {
                    self.hide_tooltip_with(CloseReason::Elapsed);
                }
            }
            TimerAction::CorrectTooltip(overlay) => {
                self.coordinator
                    .correct_tooltip(&mut self.host, timer, overlay);
            }
        }
    }

    fn surface_error(&mut self, id: NoteId, kind: OverlayKind, err: &OverlayError) {
        error!(
            "event=overlay_open module=session status=error note_id={id} kind={} error={err}",
            kind.as_str()
        );
        let kind = match err {
            OverlayError::Render { kind, .. } => *kind,
            _ => kind,
        };
        self.emit(NotesEvent::RenderFailed {
            id,
            kind,
            message: err.to_string(),
        });
    }
}

impl<H: Host> Drop for NotesSession<H> {
    fn drop(&mut self) {
        self.dispose();
    }
}
