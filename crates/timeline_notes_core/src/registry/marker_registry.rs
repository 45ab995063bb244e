//! Marker registry.
//!
//! # Responsibility
//! - Own the working note set and its CRUD paths.
//! - Project placeable notes onto the marker track as marker elements.
//! - Map note identity to its live marker for anchor queries.
//!
//! # Invariants
//! - After a render, there is exactly one marker per placeable note and no
//!   other marker element created by this registry.
//! - Markers are keyed by note id; a render updates surviving markers in
//!   place and only creates/removes the difference.
//! - With an unknown duration or no track, render touches nothing.

use crate::geometry::{anchor_of, is_known_duration, marker_percent, Anchor};
use crate::host::{ElementId, ElementSpec, Host, Layout, Placement};
use crate::model::note::{Note, NoteId, NotePatch};
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};

/// Live projection of one note onto the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub note_id: NoteId,
    pub element: ElementId,
    /// Horizontal position in percent of the track.
    pub percent: f64,
}

/// Why a render did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DurationUnknown,
    MissingTrack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Skipped(SkipReason),
    Rendered {
        markers: usize,
        created: usize,
        moved: usize,
        removed: usize,
    },
}

/// Ordered note set plus its marker index.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    notes: Vec<Note>,
    markers: BTreeMap<NoteId, Marker>,
    track: Option<ElementId>,
    marker_class: Option<String>,
}

impl MarkerRegistry {
    pub fn new(marker_class: Option<&str>) -> Self {
        Self {
            marker_class: marker_class.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn marker(&self, id: NoteId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    /// Live markers in note order.
    pub fn markers(&self) -> Vec<Marker> {
        self.notes
            .iter()
            .filter_map(|note| self.markers.get(&note.id).copied())
            .collect()
    }

    /// Note owning the marker element, if any.
    pub fn note_for_element(&self, element: ElementId) -> Option<NoteId> {
        self.markers
            .values()
            .find(|marker| marker.element == element)
            .map(|marker| marker.note_id)
    }

    /// Replaces the working note set.
    pub fn set_notes(&mut self, notes: impl IntoIterator<Item = Note>) {
        self.notes = notes.into_iter().collect();
    }

    /// Appends a note, or replaces the note with the same id in place.
    ///
    /// Returns `false` for a note without identity.
    pub fn add_note(&mut self, note: Note) -> bool {
        if note.id.is_nil() {
            return false;
        }
        match self.notes.iter_mut().find(|existing| existing.id == note.id) {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
        true
    }

    pub fn remove_note(&mut self, id: NoteId) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        self.notes.len() != before
    }

    /// Patches a note. Returns whether it changed, or `None` for an unknown id.
    pub fn update_note(&mut self, id: NoteId, patch: NotePatch) -> Option<bool> {
        let note = self.notes.iter_mut().find(|note| note.id == id)?;
        Some(note.apply(patch))
    }

    /// Brings the marker set in line with the notes and host duration.
    pub fn render(&mut self, host: &mut dyn Host) -> RenderOutcome {
        let duration = host.duration();
        if !is_known_duration(duration) {
            return RenderOutcome::Skipped(SkipReason::DurationUnknown);
        }
        let Some(track) = host.marker_track() else {
            return RenderOutcome::Skipped(SkipReason::MissingTrack);
        };

        let mut removed = 0;
        if self.track != Some(track) {
            // Skin rebuilt its controls; markers on the old track are gone.
            removed += self.clear(host);
            self.track = Some(track);
        }

        let mut wanted: Vec<(NoteId, f64)> = Vec::with_capacity(self.notes.len());
        let mut seen = HashSet::with_capacity(self.notes.len());
        for note in &self.notes {
            if note.is_placeable(duration) && seen.insert(note.id) {
                wanted.push((note.id, marker_percent(note.time, duration)));
            }
        }

        let stale: Vec<NoteId> = self
            .markers
            .keys()
            .filter(|id| !seen.contains(*id))
            .copied()
            .collect();
        for id in stale {
            if let Some(marker) = self.markers.remove(&id) {
                host.remove_element(marker.element);
                removed += 1;
            }
        }

        let mut created = 0;
        let mut moved = 0;
        for (note_id, percent) in wanted {
            if let Some(marker) = self.markers.get_mut(&note_id) {
                if marker.percent.to_bits() != percent.to_bits() {
                    marker.percent = percent;
                    host.set_placement(marker.element, Placement::Percent { left: percent });
                    moved += 1;
                }
                continue;
            }

            let spec = ElementSpec::marker(note_id, self.marker_class.as_deref());
            match host.create_element(track, spec) {
                Ok(element) => {
                    host.set_placement(element, Placement::Percent { left: percent });
                    self.markers.insert(
                        note_id,
                        Marker {
                            note_id,
                            element,
                            percent,
                        },
                    );
                    created += 1;
                }
                Err(err) => {
                    warn!(
                        "event=marker_create module=registry status=error note_id={note_id} error={err}"
                    );
                }
            }
        }

        debug!(
            "event=markers_render module=registry status=ok markers={} created={created} moved={moved} removed={removed}",
            self.markers.len()
        );
        RenderOutcome::Rendered {
            markers: self.markers.len(),
            created,
            moved,
            removed,
        }
    }

    /// Anchor of a note's marker relative to the host root.
    pub fn anchor(
        &self,
        layout: &(impl Layout + ?Sized),
        root: Option<ElementId>,
        id: NoteId,
    ) -> Option<Anchor> {
        let marker = self.markers.get(&id)?;
        anchor_of(layout, Some(marker.element), root)
    }

    /// Removes every marker element. Returns how many were dropped.
    pub fn clear(&mut self, host: &mut dyn Host) -> usize {
        let count = self.markers.len();
        for marker in std::mem::take(&mut self.markers).into_values() {
            host.remove_element(marker.element);
        }
        self.track = None;
        count
    }
}
