//! Timeline note model.
//!
//! # Responsibility
//! - Define the note record markers and overlays are projected from.
//! - Provide the serde shape hosts use to load notes from data files.
//!
//! # Invariants
//! - `id` is stable for the note lifetime and never changed by a patch.
//! - A nil `id` marks a note without identity; it is never rendered.
//! - `time` is in seconds; placement requires it to lie in `[0, duration]`.

use crate::model::content::ContentSource;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable note identifier.
pub type NoteId = Uuid;

/// One point-in-time annotation on the timeline.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: NoteId,
    /// Seconds from the start of the media.
    pub time: f64,
    /// Tooltip body, also the modal body unless overridden.
    pub content: ContentSource,
    /// Optional richer body shown only in the modal.
    pub modal_content: Option<ContentSource>,
}

impl Note {
    /// Creates a note with a generated stable ID.
    pub fn new(time: f64, content: impl Into<ContentSource>) -> Self {
        Self::with_id(Uuid::new_v4(), time, content)
    }

    /// Creates a note with a caller-provided stable ID.
    pub fn with_id(id: NoteId, time: f64, content: impl Into<ContentSource>) -> Self {
        Self {
            id,
            time,
            content: content.into(),
            modal_content: None,
        }
    }

    pub fn with_modal_content(mut self, content: impl Into<ContentSource>) -> Self {
        self.modal_content = Some(content.into());
        self
    }

    /// Whether this note can produce a marker for `duration`.
    pub fn is_placeable(&self, duration: f64) -> bool {
        !self.id.is_nil() && self.time.is_finite() && self.time >= 0.0 && self.time <= duration
    }

    /// Body shown when the note is activated.
    pub fn modal_source(&self) -> &ContentSource {
        self.modal_content.as_ref().unwrap_or(&self.content)
    }

    /// Applies a partial update. Returns whether anything changed.
    pub fn apply(&mut self, patch: NotePatch) -> bool {
        let mut changed = false;
        if let Some(time) = patch.time {
            changed |= time.to_bits() != self.time.to_bits();
            self.time = time;
        }
        if let Some(content) = patch.content {
            self.content = content;
            changed = true;
        }
        if let Some(modal_content) = patch.modal_content {
            self.modal_content = modal_content;
            changed = true;
        }
        changed
    }
}

/// Partial note update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub time: Option<f64>,
    pub content: Option<ContentSource>,
    /// `Some(None)` clears the modal override.
    pub modal_content: Option<Option<ContentSource>>,
}

impl NotePatch {
    pub fn time(time: f64) -> Self {
        Self {
            time: Some(time),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<ContentSource>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_modal_content(mut self, content: Option<ContentSource>) -> Self {
        self.modal_content = Some(content);
        self
    }
}

/// Serializable note shape for host-supplied data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: NoteId,
    pub time: f64,
    #[serde(default)]
    pub text: String,
    /// Longer text shown only in the modal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modal_text: Option<String>,
}

impl From<NoteRecord> for Note {
    fn from(value: NoteRecord) -> Self {
        let note = Note::with_id(value.id, value.time, value.text);
        match value.modal_text {
            Some(modal_text) => note.with_modal_content(modal_text),
            None => note,
        }
    }
}
