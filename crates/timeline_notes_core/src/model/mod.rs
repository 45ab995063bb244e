//! Note and content model.
//!
//! # Responsibility
//! - Define the host-owned note data the core projects onto the timeline.
//! - Define the tagged content union overlays render.
//!
//! # Invariants
//! - Notes are identified by a stable `NoteId`.
//! - The core reads notes; only the registry CRUD paths change them.

pub mod content;
pub mod note;
