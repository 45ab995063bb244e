//! Session configuration.
//!
//! # Responsibility
//! - Hold hover timing, tooltip geometry and modal playback policy.
//! - Validate host-supplied values before a session starts.
//!
//! # Invariants
//! - A validated config has a non-zero hide delay and finite, non-negative
//!   pixel values.
//! - `marker_class_name` holds only CSS class tokens.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static CSS_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[_a-zA-Z][_a-zA-Z0-9-]*$").expect("valid css class regex"));

/// Grace period before a tooltip hides after pointer leave.
pub const DEFAULT_HIDE_DELAY_MS: u64 = 2_000;
/// Minimum distance kept between a tooltip and the viewport edges.
pub const DEFAULT_EDGE_BUFFER_PX: f64 = 24.0;
/// Gap between the marker top and the tooltip bottom.
pub const DEFAULT_TOOLTIP_OFFSET_PX: f64 = 12.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    pub hide_delay_ms: u64,
    pub edge_buffer_px: f64,
    pub tooltip_offset_px: f64,
    /// Pause host playback whenever a modal opens.
    pub pause_on_modal: bool,
    /// Extra class(es) added to every marker, whitespace separated.
    pub marker_class_name: Option<String>,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            hide_delay_ms: DEFAULT_HIDE_DELAY_MS,
            edge_buffer_px: DEFAULT_EDGE_BUFFER_PX,
            tooltip_offset_px: DEFAULT_TOOLTIP_OFFSET_PX,
            pause_on_modal: true,
            marker_class_name: None,
        }
    }
}

impl NotesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hide_delay_ms == 0 {
            return Err(ConfigError::ZeroHideDelay);
        }
        check_pixels("edge_buffer_px", self.edge_buffer_px)?;
        check_pixels("tooltip_offset_px", self.tooltip_offset_px)?;

        if let Some(class_name) = &self.marker_class_name {
            for token in class_name.split_whitespace() {
                if !CSS_CLASS_RE.is_match(token) {
                    return Err(ConfigError::InvalidClassName(token.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Marker class with surrounding whitespace removed; `None` when blank.
    pub fn marker_class(&self) -> Option<&str> {
        self.marker_class_name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

fn check_pixels(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidPixelValue { field, value })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroHideDelay,
    InvalidPixelValue { field: &'static str, value: f64 },
    InvalidClassName(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroHideDelay => write!(f, "hide_delay_ms must be greater than zero"),
            Self::InvalidPixelValue { field, value } => {
                write!(f, "{field} must be a finite, non-negative pixel value, got {value}")
            }
            Self::InvalidClassName(value) => write!(f, "invalid marker class name: `{value}`"),
        }
    }
}

impl Error for ConfigError {}
