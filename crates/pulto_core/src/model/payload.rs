//! Typed window payloads.
//!
//! Each payload variant belongs to exactly one [`WindowKind`]; the pairing is
//! checked by [`WindowPayload::kind`] instead of runtime type probing.

use crate::model::json_float;
use crate::model::mesh::MeshModel;
use crate::model::window::WindowKind;
use serde::{Deserialize, Serialize};

/// Plot style for chart windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Scatter,
    Area,
}

/// One named value series plotted against the shared x axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    #[serde(with = "json_float::list")]
    pub values: Vec<f64>,
}

/// Chart payload: shared x values plus any number of named series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub title: String,
    #[serde(default)]
    pub chart_type: ChartType,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default, with = "json_float::list")]
    pub x_values: Vec<f64>,
    #[serde(default)]
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Adds one series; builder style.
    pub fn with_series(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.series.push(ChartSeries {
            name: name.into(),
            values,
        });
        self
    }
}

/// Tabular payload: header row plus string cells.
///
/// Rows shorter than the header are padded with empty cells on render.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabularFrame {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl TabularFrame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the cells of one column, top to bottom.
    pub fn column(&self, index: usize) -> Vec<&str> {
        self.rows
            .iter()
            .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
            .collect()
    }

    /// True when every non-empty cell in the column parses as a number.
    pub fn is_numeric_column(&self, index: usize) -> bool {
        let cells = self.column(index);
        !cells.is_empty()
            && cells
                .iter()
                .all(|cell| cell.is_empty() || cell.trim().parse::<f64>().is_ok())
    }
}

/// One point of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloudPoint {
    #[serde(with = "json_float::scalar")]
    pub x: f64,
    #[serde(with = "json_float::scalar")]
    pub y: f64,
    #[serde(with = "json_float::scalar")]
    pub z: f64,
    #[serde(default, with = "json_float::optional")]
    pub intensity: Option<f64>,
}

/// Point cloud payload for spatial windows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointCloudData {
    pub title: String,
    #[serde(default)]
    pub points: Vec<CloudPoint>,
}

impl PointCloudData {
    /// Builds a point cloud from the vertices of a mesh, ignoring faces.
    pub fn from_mesh(title: impl Into<String>, mesh: &MeshModel) -> Self {
        Self {
            title: title.into(),
            points: mesh
                .vertices
                .iter()
                .map(|vertex| CloudPoint {
                    x: vertex.x,
                    y: vertex.y,
                    z: vertex.z,
                    intensity: None,
                })
                .collect(),
        }
    }
}

/// One named scalar of a volumetric metric panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(with = "json_float::scalar")]
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Metric panel payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumetricMetrics {
    pub title: String,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl VolumetricMetrics {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            metrics: Vec::new(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64, unit: Option<&str>) -> Self {
        self.metrics.push(Metric {
            name: name.into(),
            value,
            unit: unit.map(str::to_string),
        });
        self
    }
}

/// Resolved 3D model payload. Geometry is always decoded before it gets here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    /// Lowercase extension of the source file, when known.
    #[serde(default)]
    pub source_format: Option<String>,
    /// Set when the mesh is a generated stand-in for an undecodable format.
    #[serde(default)]
    pub placeholder: bool,
    pub mesh: MeshModel,
}

/// Closed set of structured payloads, one variant per window kind.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowPayload {
    Chart(ChartData),
    PointCloud(PointCloudData),
    Table(TabularFrame),
    Metrics(VolumetricMetrics),
    Model(ModelDescriptor),
}

impl WindowPayload {
    /// The only window kind allowed to carry this payload.
    pub fn kind(&self) -> WindowKind {
        match self {
            Self::Chart(_) => WindowKind::Chart,
            Self::PointCloud(_) => WindowKind::Spatial,
            Self::Table(_) => WindowKind::Tabular,
            Self::Metrics(_) => WindowKind::VolumetricMetric,
            Self::Model(_) => WindowKind::Model3D,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartData, TabularFrame, WindowPayload};
    use crate::model::window::WindowKind;

    #[test]
    fn payload_kind_pairs_with_window_kind() {
        let payload = WindowPayload::Chart(ChartData::new("sales"));
        assert_eq!(payload.kind(), WindowKind::Chart);
        let payload = WindowPayload::Table(TabularFrame::default());
        assert_eq!(payload.kind(), WindowKind::Tabular);
    }

    #[test]
    fn numeric_column_detection_ignores_blank_cells() {
        let mut frame = TabularFrame::new(vec!["month".to_string(), "sales".to_string()]);
        frame.push_row(vec!["Jan".to_string(), "1000".to_string()]);
        frame.push_row(vec!["Feb".to_string(), String::new()]);
        frame.push_row(vec!["Mar".to_string(), "1100.5".to_string()]);
        assert!(!frame.is_numeric_column(0));
        assert!(frame.is_numeric_column(1));
        assert_eq!(frame.column(1), vec!["1000", "", "1100.5"]);
    }
}
