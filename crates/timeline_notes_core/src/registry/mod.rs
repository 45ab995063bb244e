//! Note-to-marker projection.
//!
//! # Responsibility
//! - Keep the working note set and the markers derived from it.
//!
//! # Invariants
//! - The marker set always reflects the note set as of the last render.
//! - Only the registry creates or removes marker elements.

pub mod marker_registry;
