//! Window record domain model.
//!
//! # Responsibility
//! - Define the canonical record for one spatial window.
//! - Keep kind, payload and export template vocabularies in one place.
//!
//! # Invariants
//! - `payload`, when present, matches `kind` (`WindowPayload::kind`).
//! - `id` is unique within one workspace store and never reused.
//! - `modified_at` is bumped by every mutating store operation.
//! - `state.minimized` and `state.maximized` are never both set.

use crate::model::json_float;
use crate::model::payload::WindowPayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer identity of a window inside one store.
pub type WindowId = u64;

/// Default window width in points.
pub const DEFAULT_WINDOW_WIDTH: f64 = 600.0;
/// Default window height in points.
pub const DEFAULT_WINDOW_HEIGHT: f64 = 450.0;

/// Category of artifact a window shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    #[serde(rename = "chart")]
    Chart,
    /// Point-cloud editor.
    #[serde(rename = "spatial")]
    Spatial,
    #[serde(rename = "dataframe")]
    Tabular,
    #[serde(rename = "metrics")]
    VolumetricMetric,
    #[serde(rename = "model3d")]
    Model3D,
}

impl WindowKind {
    pub const ALL: [WindowKind; 5] = [
        WindowKind::Chart,
        WindowKind::Spatial,
        WindowKind::Tabular,
        WindowKind::VolumetricMetric,
        WindowKind::Model3D,
    ];

    /// Stable id written to `window_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Spatial => "spatial",
            Self::Tabular => "dataframe",
            Self::VolumetricMetric => "metrics",
            Self::Model3D => "model3d",
        }
    }

    /// User-facing window title prefix.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Chart => "Charts",
            Self::Spatial => "Spatial Editor",
            Self::Tabular => "DataFrame Viewer",
            Self::VolumetricMetric => "Model Metric Viewer",
            Self::Model3D => "3D Model",
        }
    }

    /// Parses a `window_type` value.
    ///
    /// Accepts the stable id and the display name, both case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim();
        Self::ALL.into_iter().find(|kind| {
            kind.as_str().eq_ignore_ascii_case(normalized)
                || kind.display_name().eq_ignore_ascii_case(normalized)
        })
    }

    /// Template used when a window is created without an explicit one.
    pub fn default_template(self) -> ExportTemplate {
        match self {
            Self::Chart | Self::Spatial => ExportTemplate::Matplotlib,
            Self::Tabular => ExportTemplate::Pandas,
            Self::VolumetricMetric => ExportTemplate::Markdown,
            Self::Model3D => ExportTemplate::Custom,
        }
    }
}

/// How a window's content becomes notebook source lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportTemplate {
    /// Plotting code.
    Matplotlib,
    /// Data-frame construction code.
    Pandas,
    /// Markdown cell only.
    Markdown,
    /// Free-form code; content is emitted as written.
    Custom,
}

impl ExportTemplate {
    pub const ALL: [ExportTemplate; 4] = [
        ExportTemplate::Matplotlib,
        ExportTemplate::Pandas,
        ExportTemplate::Markdown,
        ExportTemplate::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Matplotlib => "matplotlib",
            Self::Pandas => "pandas",
            Self::Markdown => "markdown",
            Self::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|template| template.as_str().eq_ignore_ascii_case(normalized))
    }
}

/// Spatial placement. Bounds are not enforced here; restore clamps sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    #[serde(with = "json_float::scalar")]
    pub x: f64,
    #[serde(with = "json_float::scalar")]
    pub y: f64,
    #[serde(with = "json_float::scalar")]
    pub z: f64,
    #[serde(with = "json_float::scalar")]
    pub width: f64,
    #[serde(with = "json_float::scalar")]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "json_float::optional")]
    pub depth: Option<f64>,
}

impl Placement {
    pub fn new(x: f64, y: f64, z: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            z,
            width,
            height,
            depth: None,
        }
    }

    pub fn with_depth(mut self, depth: f64) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Raises width and height to the given minimums.
    pub fn clamped(mut self, min_width: f64, min_height: f64) -> Self {
        if self.width.is_nan() || self.width < min_width {
            self.width = min_width;
        }
        if self.height.is_nan() || self.height < min_height {
            self.height = min_height;
        }
        self
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT)
    }
}

/// Presentation state persisted with the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    pub minimized: bool,
    pub maximized: bool,
    /// In `[0, 1]`.
    pub opacity: f64,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            minimized: false,
            maximized: false,
            opacity: 1.0,
        }
    }
}

/// Chart legend anchor, stored beside windows and keyed by window id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegendPosition {
    #[serde(with = "json_float::scalar")]
    pub x: f64,
    #[serde(with = "json_float::scalar")]
    pub y: f64,
}

/// Record-level invariant violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowValidationError {
    #[error("payload for `{payload}` cannot be stored in a `{kind}` window")]
    PayloadKindMismatch {
        kind: &'static str,
        payload: &'static str,
    },
    #[error("window cannot be minimized and maximized at the same time")]
    ConflictingState,
    #[error("opacity must be within [0, 1], got {0}")]
    OpacityOutOfRange(f64),
}

/// One persisted spatial window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRecord {
    pub id: WindowId,
    pub kind: WindowKind,
    pub placement: Placement,
    pub state: WindowState,
    /// `None` falls back to `content`.
    pub payload: Option<WindowPayload>,
    /// Ordered; duplicates allowed.
    pub tags: Vec<String>,
    pub export_template: ExportTemplate,
    /// Free-text body used when no structured payload exists.
    pub content: String,
    /// Closed windows stay in the workspace but are hidden from open queries.
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl WindowRecord {
    /// Creates an empty, open window with the kind's default template.
    pub fn new(id: WindowId, kind: WindowKind, placement: Placement) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind,
            placement,
            state: WindowState::default(),
            payload: None,
            tags: Vec::new(),
            export_template: kind.default_template(),
            content: String::new(),
            is_open: true,
            created_at: now,
            modified_at: now,
        }
    }

    /// Window title shown in chrome and used in rendered source.
    pub fn title(&self) -> String {
        format!("{} #{}", self.kind.display_name(), self.id)
    }

    /// Bumps `modified_at`.
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    /// Replaces the payload after checking it matches `kind`.
    ///
    /// The record is left unchanged on mismatch.
    pub fn set_payload(&mut self, payload: WindowPayload) -> Result<(), WindowValidationError> {
        ensure_payload_matches(self.kind, &payload)?;
        self.payload = Some(payload);
        self.touch();
        Ok(())
    }

    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), WindowValidationError> {
        if let Some(payload) = &self.payload {
            ensure_payload_matches(self.kind, payload)?;
        }
        if self.state.minimized && self.state.maximized {
            return Err(WindowValidationError::ConflictingState);
        }
        if !(0.0..=1.0).contains(&self.state.opacity) {
            return Err(WindowValidationError::OpacityOutOfRange(self.state.opacity));
        }
        Ok(())
    }
}

fn ensure_payload_matches(
    kind: WindowKind,
    payload: &WindowPayload,
) -> Result<(), WindowValidationError> {
    if payload.kind() == kind {
        Ok(())
    } else {
        Err(WindowValidationError::PayloadKindMismatch {
            kind: kind.as_str(),
            payload: payload.kind().as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ExportTemplate, Placement, WindowKind};

    #[test]
    fn kind_parse_accepts_ids_and_display_names() {
        assert_eq!(WindowKind::parse("dataframe"), Some(WindowKind::Tabular));
        assert_eq!(WindowKind::parse("Spatial Editor"), Some(WindowKind::Spatial));
        assert_eq!(WindowKind::parse(" MODEL3D "), Some(WindowKind::Model3D));
        assert_eq!(WindowKind::parse("hologram"), None);
    }

    #[test]
    fn template_parse_round_trips_every_variant() {
        for template in ExportTemplate::ALL {
            assert_eq!(ExportTemplate::parse(template.as_str()), Some(template));
        }
        assert_eq!(ExportTemplate::parse("latex"), None);
    }

    #[test]
    fn clamped_raises_small_and_nan_sizes() {
        let placement = Placement::new(0.0, 0.0, 0.0, 10.0, f64::NAN).clamped(100.0, 80.0);
        assert_eq!(placement.width, 100.0);
        assert_eq!(placement.height, 80.0);

        let untouched = Placement::new(0.0, 0.0, 0.0, 300.0, 200.0).clamped(100.0, 80.0);
        assert_eq!(untouched.width, 300.0);
        assert_eq!(untouched.height, 200.0);
    }
}
