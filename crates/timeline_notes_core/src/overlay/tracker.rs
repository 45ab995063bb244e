//! Resource tracker for overlays and scheduled callbacks.
//!
//! # Responsibility
//! - Own every pending timer and next-frame request behind a `TimerId`.
//! - Own every live overlay's elements and content disposer.
//! - Release everything in one `dispose_all` call.
//!
//! # Invariants
//! - A cancelled or fired timer is forgotten immediately; its id never fires.
//! - Releasing an overlay runs its disposer before detaching its elements.
//! - `dispose_all` is reentrant: a second call finds nothing to release.

use crate::host::{ElementId, Host};
use crate::model::note::NoteId;
use crate::overlay::content::Disposer;
use crate::overlay::OverlayKind;
use log::debug;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Handle for one scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl Display for TimerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Handle for one tracked overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayId(u64);

impl Display for OverlayId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// Work a scheduled callback performs when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Hover grace period for one marker elapsed.
    HideTooltip(NoteId),
    /// Post-layout viewport correction of a tooltip.
    CorrectTooltip(OverlayId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Due {
    At(u64),
    NextFrame,
}

#[derive(Debug)]
struct PendingTimer {
    due: Due,
    action: TimerAction,
}

#[derive(Debug)]
struct TrackedOverlay {
    kind: OverlayKind,
    elements: Vec<ElementId>,
    disposer: Option<Disposer>,
}

/// Counts reported by `dispose_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisposeReport {
    pub timers_cancelled: usize,
    pub overlays_released: usize,
}

/// Bookkeeping for everything that must be released on teardown.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    now_ms: u64,
    next_id: u64,
    timers: BTreeMap<TimerId, PendingTimer>,
    overlays: BTreeMap<OverlayId, TrackedOverlay>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual clock, in milliseconds since creation.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule_after(&mut self, delay_ms: u64, action: TimerAction) -> TimerId {
        let id = TimerId(self.bump());
        let due = Due::At(self.now_ms.saturating_add(delay_ms));
        self.timers.insert(id, PendingTimer { due, action });
        id
    }

    pub fn request_frame(&mut self, action: TimerAction) -> TimerId {
        let id = TimerId(self.bump());
        self.timers.insert(
            id,
            PendingTimer {
                due: Due::NextFrame,
                action,
            },
        );
        id
    }

    /// Returns `false` when the timer already fired or was cancelled.
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn pending_timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Removes and returns the earliest timer due at or before `until_ms`.
    ///
    /// The clock moves to the timer's deadline so callbacks scheduled while
    /// handling it are measured from the moment it fired. Ties fire in
    /// scheduling order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, TimerAction)> {
        let (id, at) = self
            .timers
            .iter()
            .filter_map(|(id, timer)| match timer.due {
                Due::At(at) if at <= until_ms => Some((*id, at)),
                _ => None,
            })
            .min_by_key(|(id, at)| (*at, *id))?;
        let timer = self.timers.remove(&id)?;
        self.now_ms = self.now_ms.max(at);
        Some((id, timer.action))
    }

    /// Moves the clock forward once every due timer has been popped.
    pub fn settle_clock(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    /// Takes every frame request made before this call.
    pub fn take_frame_requests(&mut self) -> Vec<(TimerId, TimerAction)> {
        let ids: Vec<TimerId> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due == Due::NextFrame)
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.timers.remove(&id).map(|timer| (id, timer.action)))
            .collect()
    }

    pub fn track_overlay(&mut self, kind: OverlayKind, elements: Vec<ElementId>) -> OverlayId {
        let id = OverlayId(self.bump());
        self.overlays.insert(
            id,
            TrackedOverlay {
                kind,
                elements,
                disposer: None,
            },
        );
        id
    }

    pub(crate) fn set_disposer(&mut self, id: OverlayId, disposer: Disposer) {
        if let Some(overlay) = self.overlays.get_mut(&id) {
            overlay.disposer = Some(disposer);
        }
    }

    pub fn is_live(&self, id: OverlayId) -> bool {
        self.overlays.contains_key(&id)
    }

    pub fn live_overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn live_overlay_count_of(&self, kind: OverlayKind) -> usize {
        self.overlays
            .values()
            .filter(|overlay| overlay.kind == kind)
            .count()
    }

    /// Disposes content and detaches elements of one overlay.
    pub fn release_overlay(&mut self, id: OverlayId, host: &mut dyn Host) -> bool {
        let Some(overlay) = self.overlays.remove(&id) else {
            return false;
        };
        if let Some(disposer) = overlay.disposer {
            disposer.dispose(host);
        }
        for element in overlay.elements.into_iter().rev() {
            if !host.remove_element(element) {
                debug!(
                    "event=overlay_release module=tracker status=skipped overlay={id} element={element} reason=already_detached"
                );
            }
        }
        true
    }

    /// Cancels every timer and releases every overlay.
    pub fn dispose_all(&mut self, host: &mut dyn Host) -> DisposeReport {
        let timers_cancelled = self.timers.len();
        self.timers.clear();

        let ids: Vec<OverlayId> = self.overlays.keys().copied().collect();
        let mut overlays_released = 0;
        for id in ids {
            if self.release_overlay(id, host) {
                overlays_released += 1;
            }
        }

        DisposeReport {
            timers_cancelled,
            overlays_released,
        }
    }

    fn bump(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::{DisposeReport, ResourceTracker, TimerAction};
    use crate::host::{ElementSpec, Host, MemoryHost};
    use crate::overlay::content::Disposer;
    use crate::overlay::OverlayKind;
    use uuid::Uuid;

    #[test]
    fn due_timers_pop_in_deadline_then_schedule_order() {
        let mut tracker = ResourceTracker::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let late = tracker.schedule_after(300, TimerAction::HideTooltip(a));
        let early = tracker.schedule_after(100, TimerAction::HideTooltip(b));
        let tie = tracker.schedule_after(100, TimerAction::HideTooltip(a));

        assert!(tracker.pop_due(50).is_none());
        assert_eq!(tracker.pop_due(1_000).map(|(id, _)| id), Some(early));
        assert_eq!(tracker.now_ms(), 100);
        assert_eq!(tracker.pop_due(1_000).map(|(id, _)| id), Some(tie));
        assert_eq!(tracker.pop_due(1_000).map(|(id, _)| id), Some(late));
        tracker.settle_clock(1_000);
        assert_eq!(tracker.now_ms(), 1_000);
        assert_eq!(tracker.pending_timer_count(), 0);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut tracker = ResourceTracker::new();
        let id = tracker.schedule_after(10, TimerAction::HideTooltip(Uuid::new_v4()));
        assert!(tracker.cancel_timer(id));
        assert!(!tracker.cancel_timer(id));
        assert!(tracker.pop_due(100).is_none());
    }

    #[test]
    fn frame_requests_are_separate_from_deadlines() {
        let mut tracker = ResourceTracker::new();
        let overlay = tracker.track_overlay(OverlayKind::Tooltip, vec![]);
        let frame = tracker.request_frame(TimerAction::CorrectTooltip(overlay));
        assert!(tracker.pop_due(u64::MAX).is_none());

        let frames = tracker.take_frame_requests();
        assert_eq!(frames, vec![(frame, TimerAction::CorrectTooltip(overlay))]);
        assert!(tracker.take_frame_requests().is_empty());
    }

    #[test]
    fn dispose_all_releases_everything_once() {
        let mut host = MemoryHost::new(10.0);
        let root = host.root().expect("root");
        let mut tracker = ResourceTracker::new();

        for _ in 0..3 {
            let el = host
                .create_element(root, ElementSpec::tooltip())
                .expect("container");
            host.set_text(el, "tip");
            let overlay = tracker.track_overlay(OverlayKind::Tooltip, vec![el]);
            tracker.set_disposer(overlay, Disposer::ClearText(el));
        }
        tracker.schedule_after(5, TimerAction::HideTooltip(Uuid::new_v4()));
        tracker.schedule_after(9, TimerAction::HideTooltip(Uuid::new_v4()));

        let report = tracker.dispose_all(&mut host);
        assert_eq!(
            report,
            DisposeReport {
                timers_cancelled: 2,
                overlays_released: 3
            }
        );
        assert_eq!(tracker.live_overlay_count(), 0);
        assert_eq!(tracker.pending_timer_count(), 0);
        assert!(host
            .elements_with_role(crate::host::ElementRole::Tooltip)
            .is_empty());

        assert_eq!(tracker.dispose_all(&mut host), DisposeReport::default());
    }
}
