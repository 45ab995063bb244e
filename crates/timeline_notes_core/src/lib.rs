//! Timeline notes for media players.
//!
//! Projects timestamped notes onto a player's progress track as markers and
//! manages the hover tooltip and activation modal attached to them, against
//! a host abstraction instead of a concrete UI toolkit.

pub mod config;
pub mod events;
pub mod geometry;
pub mod host;
pub mod logging;
pub mod model;
pub mod overlay;
pub mod registry;
pub mod session;

pub use config::{ConfigError, NotesConfig};
pub use events::{EventBus, MarkerEventPayload, NotesEvent, SubscriptionId};
pub use geometry::{Anchor, Rect};
pub use host::{
    ElementId, ElementRole, ElementSpec, Host, HostError, Layout, MemoryHost, Placement,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::content::{ContentSource, RenderError, ViewAdapter};
pub use model::note::{Note, NoteId, NotePatch, NoteRecord};
pub use overlay::coordinator::ModalOptions;
pub use overlay::hover_intent::HoverState;
pub use overlay::tracker::DisposeReport;
pub use overlay::{CloseReason, OverlayError, OverlayKind};
pub use registry::marker_registry::Marker;
pub use session::{KeyInput, MarkerInput, NotesSession, TooltipInput};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
