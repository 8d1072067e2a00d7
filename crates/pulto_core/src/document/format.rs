//! Serialized notebook shapes.
//!
//! These structs only describe what `serialize` writes. Decoding walks
//! `serde_json::Value` directly so that one malformed cell can be reported
//! without rejecting the whole document.

use crate::model::payload::{
    ChartData, ModelDescriptor, PointCloudData, TabularFrame, VolumetricMetrics,
};
use crate::model::window::{LegendPosition, Placement, WindowId, WindowState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const NBFORMAT: u32 = 4;
pub const NBFORMAT_MINOR: u32 = 5;

/// Top-level metadata key holding the export summary.
pub const EXPORT_SUMMARY_KEY: &str = "visionos_export";
pub const LEGEND_POSITIONS_KEY: &str = "legend_positions";

pub const CHART_DATA_KEY: &str = "chart_data";
pub const DATAFRAME_DATA_KEY: &str = "dataframe_data";
pub const POINT_CLOUD_DATA_KEY: &str = "point_cloud_data";
pub const METRICS_DATA_KEY: &str = "metrics_data";
pub const MODEL3D_DATA_KEY: &str = "model3d_data";

#[derive(Debug, Serialize)]
pub struct NotebookDocument<'a> {
    pub cells: Vec<NotebookCell<'a>>,
    pub metadata: NotebookMetadata,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

/// One cell; markdown cells carry neither outputs nor an execution count.
#[derive(Debug, Serialize)]
#[serde(tag = "cell_type", rename_all = "snake_case")]
pub enum NotebookCell<'a> {
    Code {
        metadata: CellMetadata<'a>,
        source: Vec<String>,
        execution_count: Option<i64>,
        outputs: Vec<Value>,
    },
    Markdown {
        metadata: CellMetadata<'a>,
        source: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct CellMetadata<'a> {
    pub window_id: WindowId,
    pub window_type: &'static str,
    pub export_template: &'static str,
    pub tags: &'a [String],
    pub position: Placement,
    pub state: WindowState,
    pub timestamps: CellTimestamps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<&'a ChartData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataframe_data: Option<&'a TabularFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_cloud_data: Option<&'a PointCloudData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_data: Option<&'a VolumetricMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model3d_data: Option<&'a ModelDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct CellTimestamps {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NotebookMetadata {
    pub visionos_export: ExportSummary,
    pub kernelspec: KernelSpec,
    pub language_info: LanguageInfo,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub legend_positions: BTreeMap<String, LegendPosition>,
}

/// Derived aggregate; recomputed on every serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub export_date: DateTime<Utc>,
    pub total_windows: usize,
    pub window_types: Vec<String>,
    pub export_templates: Vec<String>,
    pub all_tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct KernelSpec {
    pub display_name: &'static str,
    pub language: &'static str,
    pub name: &'static str,
}

impl Default for KernelSpec {
    fn default() -> Self {
        Self {
            display_name: "Python 3",
            language: "python",
            name: "python3",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub name: &'static str,
    pub file_extension: &'static str,
    pub mimetype: &'static str,
}

impl Default for LanguageInfo {
    fn default() -> Self {
        Self {
            name: "python",
            file_extension: ".py",
            mimetype: "text/x-python",
        }
    }
}
