//! Per-marker hover intent.
//!
//! # Responsibility
//! - Decide when pointer/focus presence on a marker should show or hide
//!   its tooltip, with a grace period on leave.
//!
//! # Invariants
//! - At most one hide timer is pending per controller; any transition that
//!   supersedes it cancels it first.
//! - A timer that fires with an id other than the pending one is stale and
//!   ignored.
//! - Re-entering during the grace period never asks for a re-render.

use crate::model::note::NoteId;
use crate::overlay::tracker::{ResourceTracker, TimerAction, TimerId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverState {
    Hidden,
    Showing,
    HidePending,
}

/// What the coordinator has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverOutcome {
    None,
    ShowTooltip,
    HideTooltip,
}

/// Hover state machine for one marker.
#[derive(Debug)]
pub struct HoverIntent {
    note_id: NoteId,
    state: HoverState,
    pending: Option<TimerId>,
}

impl HoverIntent {
    pub fn new(note_id: NoteId) -> Self {
        Self {
            note_id,
            state: HoverState::Hidden,
            pending: None,
        }
    }

    pub fn note_id(&self) -> NoteId {
        self.note_id
    }

    pub fn state(&self) -> HoverState {
        self.state
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending
    }

    /// Pointer enter or keyboard focus on the marker.
    pub fn enter(&mut self, tracker: &mut ResourceTracker) -> HoverOutcome {
        match self.state {
            HoverState::Hidden => {
                self.state = HoverState::Showing;
                HoverOutcome::ShowTooltip
            }
            HoverState::HidePending => {
                self.cancel_pending(tracker);
                self.state = HoverState::Showing;
                HoverOutcome::None
            }
            HoverState::Showing => HoverOutcome::None,
        }
    }

    /// Pointer leave or blur, from the marker or from its tooltip.
    pub fn leave(&mut self, tracker: &mut ResourceTracker, delay_ms: u64) -> HoverOutcome {
        if self.state == HoverState::Hidden {
            return HoverOutcome::None;
        }
        self.cancel_pending(tracker);
        self.pending = Some(tracker.schedule_after(delay_ms, TimerAction::HideTooltip(self.note_id)));
        self.state = HoverState::HidePending;
        HoverOutcome::None
    }

    /// Pointer entered the tooltip surface this controller opened.
    pub fn tooltip_enter(&mut self, tracker: &mut ResourceTracker) -> HoverOutcome {
        if self.state == HoverState::HidePending {
            self.cancel_pending(tracker);
            self.state = HoverState::Showing;
        }
        HoverOutcome::None
    }

    pub fn timer_elapsed(&mut self, timer: TimerId) -> HoverOutcome {
        if self.state != HoverState::HidePending || self.pending != Some(timer) {
            return HoverOutcome::None;
        }
        self.pending = None;
        self.state = HoverState::Hidden;
        HoverOutcome::HideTooltip
    }

    /// Drops to `Hidden` without asking for a close. Returns whether it was visible.
    pub fn force_hide(&mut self, tracker: &mut ResourceTracker) -> bool {
        self.cancel_pending(tracker);
        let was_visible = self.state != HoverState::Hidden;
        self.state = HoverState::Hidden;
        was_visible
    }

    fn cancel_pending(&mut self, tracker: &mut ResourceTracker) {
        if let Some(timer) = self.pending.take() {
            tracker.cancel_timer(timer);
        }
    }
}

/// Hover controllers keyed by note id.
#[derive(Debug, Default)]
pub struct HoverIntents {
    intents: BTreeMap<NoteId, HoverIntent>,
}

impl HoverIntents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, note_id: NoteId) -> Option<&HoverIntent> {
        self.intents.get(&note_id)
    }

    pub fn get_mut(&mut self, note_id: NoteId) -> Option<&mut HoverIntent> {
        self.intents.get_mut(&note_id)
    }

    pub fn entry(&mut self, note_id: NoteId) -> &mut HoverIntent {
        self.intents
            .entry(note_id)
            .or_insert_with(|| HoverIntent::new(note_id))
    }

    pub fn state_of(&self, note_id: NoteId) -> HoverState {
        self.intents
            .get(&note_id)
            .map(HoverIntent::state)
            .unwrap_or(HoverState::Hidden)
    }

    /// Notes whose controller is not `Hidden`.
    pub fn visible(&self) -> Vec<NoteId> {
        self.intents
            .values()
            .filter(|intent| intent.state != HoverState::Hidden)
            .map(HoverIntent::note_id)
            .collect()
    }

    pub fn force_hide_others(&mut self, keep: NoteId, tracker: &mut ResourceTracker) {
        for intent in self.intents.values_mut() {
            if intent.note_id != keep {
                intent.force_hide(tracker);
            }
        }
    }

    pub fn force_hide_all(&mut self, tracker: &mut ResourceTracker) {
        for intent in self.intents.values_mut() {
            intent.force_hide(tracker);
        }
    }

    /// Drops controllers for notes that no longer have a marker.
    pub fn retain(&mut self, tracker: &mut ResourceTracker, mut keep: impl FnMut(NoteId) -> bool) {
        self.intents.retain(|note_id, intent| {
            if keep(*note_id) {
                return true;
            }
            intent.force_hide(tracker);
            false
        });
    }

    pub fn clear(&mut self, tracker: &mut ResourceTracker) {
        self.force_hide_all(tracker);
        self.intents.clear();
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
