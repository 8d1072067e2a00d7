//! Workspace document encode/decode.
//!
//! # Responsibility
//! - Write window records as notebook cells plus derived top-level metadata.
//! - Read a document back into candidate records, per-cell errors and the
//!   old-to-new identifier mapping.
//!
//! # Invariants
//! - Top-level aggregates are recomputed on every serialize.
//! - Decode is all-or-nothing for schema breakage (bad JSON, missing
//!   `cells`/`metadata`, non-numeric position, inconsistent state) and
//!   allocates no ids before the whole document has been validated.
//! - Decoding needs no id source; ids are drawn only by
//!   [`PendingDocument::assign_ids`].
//! - Cells without a recognizable `window_type` are skipped without error.
//! - Every restored window gets a fresh id different from its recorded one.

use crate::document::error::{DocumentError, DocumentResult, PerCellError};
use crate::document::format::{
    CellMetadata, CellTimestamps, ExportSummary, KernelSpec, LanguageInfo, NotebookCell,
    NotebookDocument, NotebookMetadata, CHART_DATA_KEY, DATAFRAME_DATA_KEY, EXPORT_SUMMARY_KEY,
    LEGEND_POSITIONS_KEY, METRICS_DATA_KEY, MODEL3D_DATA_KEY, NBFORMAT, NBFORMAT_MINOR,
    POINT_CLOUD_DATA_KEY,
};
use crate::document::ids::{IdAllocator, IdMapping};
use crate::document::source::{cell_kind, render_content, split_source_lines, CellKind};
use crate::model::payload::WindowPayload;
use crate::model::window::{
    ExportTemplate, LegendPosition, Placement, WindowId, WindowKind, WindowRecord, WindowState,
};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Result of decoding one document.
#[derive(Debug, Clone, Default)]
pub struct DecodedDocument {
    /// Restored windows in cell order, already carrying their new ids.
    pub windows: Vec<WindowRecord>,
    pub errors: Vec<PerCellError>,
    pub id_map: IdMapping,
    /// Legend positions as recorded, keyed by the document's old ids.
    pub legend_positions: BTreeMap<WindowId, LegendPosition>,
    /// Cells dropped for lacking a recognizable window type.
    pub skipped_cells: usize,
}

/// Serializes windows with no legend positions, stamped with the current
/// time.
pub fn serialize(windows: &[WindowRecord]) -> DocumentResult<Vec<u8>> {
    serialize_document(windows, &BTreeMap::new(), Utc::now())
}

/// Serializes windows and the legend-position map.
///
/// Output is deterministic for identical input and `exported_at`; cells keep
/// input order.
pub fn serialize_document(
    windows: &[WindowRecord],
    legend_positions: &BTreeMap<WindowId, LegendPosition>,
    exported_at: DateTime<Utc>,
) -> DocumentResult<Vec<u8>> {
    let cells = windows.iter().map(encode_cell).collect();
    let document = NotebookDocument {
        cells,
        metadata: NotebookMetadata {
            visionos_export: export_summary(windows, exported_at),
            kernelspec: KernelSpec::default(),
            language_info: LanguageInfo::default(),
            legend_positions: legend_positions
                .iter()
                .map(|(id, position)| (id.to_string(), *position))
                .collect(),
        },
        nbformat: NBFORMAT,
        nbformat_minor: NBFORMAT_MINOR,
    };

    let bytes = serde_json::to_vec_pretty(&document)
        .map_err(|err| DocumentError::Encode(err.to_string()))?;
    info!(
        "event=document_serialize module=document status=ok windows={} bytes={}",
        windows.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Derived document aggregates for `windows`.
pub fn export_summary(windows: &[WindowRecord], exported_at: DateTime<Utc>) -> ExportSummary {
    let window_types: BTreeSet<&str> = windows.iter().map(|w| w.kind.as_str()).collect();
    let templates: BTreeSet<&str> = windows.iter().map(|w| w.export_template.as_str()).collect();
    let tags: BTreeSet<&str> = windows
        .iter()
        .flat_map(|w| w.tags.iter().map(String::as_str))
        .collect();
    ExportSummary {
        export_date: exported_at,
        total_windows: windows.len(),
        window_types: window_types.into_iter().map(str::to_string).collect(),
        export_templates: templates.into_iter().map(str::to_string).collect(),
        all_tags: tags.into_iter().map(str::to_string).collect(),
    }
}

fn encode_cell(record: &WindowRecord) -> NotebookCell<'_> {
    let (mut chart_data, mut dataframe_data, mut point_cloud_data) = (None, None, None);
    let (mut metrics_data, mut model3d_data) = (None, None);
    match &record.payload {
        Some(WindowPayload::Chart(data)) => chart_data = Some(data),
        Some(WindowPayload::Table(data)) => dataframe_data = Some(data),
        Some(WindowPayload::PointCloud(data)) => point_cloud_data = Some(data),
        Some(WindowPayload::Metrics(data)) => metrics_data = Some(data),
        Some(WindowPayload::Model(data)) => model3d_data = Some(data),
        None => {}
    }

    let metadata = CellMetadata {
        window_id: record.id,
        window_type: record.kind.as_str(),
        export_template: record.export_template.as_str(),
        tags: &record.tags,
        position: record.placement,
        state: record.state,
        timestamps: CellTimestamps {
            created: record.created_at,
            modified: record.modified_at,
        },
        chart_data,
        dataframe_data,
        point_cloud_data,
        metrics_data,
        model3d_data,
    };
    let source = split_source_lines(&render_content(record));
    match cell_kind(record) {
        CellKind::Code => NotebookCell::Code {
            metadata,
            source,
            execution_count: None,
            outputs: Vec::new(),
        },
        CellKind::Markdown => NotebookCell::Markdown { metadata, source },
    }
}

/// Metadata key holding the structured payload for `kind`.
pub fn payload_key(kind: WindowKind) -> &'static str {
    match kind {
        WindowKind::Chart => CHART_DATA_KEY,
        WindowKind::Tabular => DATAFRAME_DATA_KEY,
        WindowKind::Spatial => POINT_CLOUD_DATA_KEY,
        WindowKind::VolumetricMetric => METRICS_DATA_KEY,
        WindowKind::Model3D => MODEL3D_DATA_KEY,
    }
}

/// Cell decoded but not yet assigned a fresh id.
#[derive(Debug, Clone)]
struct Candidate {
    old_id: WindowId,
    record: WindowRecord,
}

enum CellOutcome {
    Restored(Candidate),
    Failed(PerCellError),
    Skipped,
}

/// A fully validated document whose windows still carry their recorded ids.
///
/// Produced without any store access; [`PendingDocument::assign_ids`] is the
/// only step that needs an id source. Dropping it commits nothing.
#[derive(Debug, Clone, Default)]
pub struct PendingDocument {
    candidates: Vec<Candidate>,
    pub errors: Vec<PerCellError>,
    /// Legend positions as recorded, keyed by the document's old ids.
    pub legend_positions: BTreeMap<WindowId, LegendPosition>,
    pub skipped_cells: usize,
}

impl PendingDocument {
    /// Number of windows that will be restored.
    pub fn window_count(&self) -> usize {
        self.candidates.len()
    }

    /// Draws a fresh id for every candidate, in cell order.
    pub fn assign_ids(self, ids: &mut dyn IdAllocator) -> DecodedDocument {
        let mut decoded = DecodedDocument {
            errors: self.errors,
            legend_positions: self.legend_positions,
            skipped_cells: self.skipped_cells,
            ..DecodedDocument::default()
        };
        for Candidate { old_id, mut record } in self.candidates {
            let mut new_id = ids.allocate_id();
            if new_id == old_id {
                new_id = ids.allocate_id();
            }
            record.id = new_id;
            if !decoded.id_map.insert(old_id, new_id) {
                debug!(
                    "event=document_assign_ids module=document status=duplicate_id old_id={} new_id={}",
                    old_id, new_id
                );
            }
            decoded.windows.push(record);
        }
        decoded
    }
}

/// Decodes and validates document bytes without allocating ids.
///
/// # Errors
/// - `InvalidJson` when the bytes are not JSON.
/// - `InvalidNotebookFormat` when `cells`/`metadata` are missing or any cell
///   has a non-numeric position or inconsistent state.
pub fn decode_document(bytes: &[u8]) -> DocumentResult<PendingDocument> {
    let root: Value = serde_json::from_slice(bytes).map_err(|err| {
        warn!("event=document_deserialize module=document status=error error_code=invalid_json");
        DocumentError::InvalidJson(err.to_string())
    })?;
    let (cells, metadata) = document_shape(&root).map_err(|err| {
        warn!(
            "event=document_deserialize module=document status=error error_code=invalid_notebook_format"
        );
        err
    })?;

    let mut pending = PendingDocument {
        legend_positions: decode_legend_positions(metadata),
        ..PendingDocument::default()
    };
    for (index, cell) in cells.iter().enumerate() {
        match decode_cell(index, cell)? {
            CellOutcome::Restored(candidate) => pending.candidates.push(candidate),
            CellOutcome::Failed(err) => pending.errors.push(err),
            CellOutcome::Skipped => pending.skipped_cells += 1,
        }
    }

    info!(
        "event=document_deserialize module=document status=ok cells={} restorable={} failed={} skipped={}",
        cells.len(),
        pending.candidates.len(),
        pending.errors.len(),
        pending.skipped_cells
    );
    Ok(pending)
}

/// Decodes document bytes, drawing fresh ids from `ids`.
///
/// Same errors as [`decode_document`]; on error no id has been drawn.
pub fn deserialize(bytes: &[u8], ids: &mut dyn IdAllocator) -> DocumentResult<DecodedDocument> {
    Ok(decode_document(bytes)?.assign_ids(ids))
}

fn document_shape(root: &Value) -> DocumentResult<(&Vec<Value>, &Map<String, Value>)> {
    let object = root.as_object().ok_or_else(|| {
        DocumentError::InvalidNotebookFormat("top level is not an object".to_string())
    })?;
    let cells = object
        .get("cells")
        .and_then(Value::as_array)
        .ok_or_else(|| DocumentError::InvalidNotebookFormat("missing `cells` list".to_string()))?;
    let metadata = object
        .get("metadata")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            DocumentError::InvalidNotebookFormat("missing `metadata` object".to_string())
        })?;
    Ok((cells, metadata))
}

fn decode_cell(index: usize, cell: &Value) -> DocumentResult<CellOutcome> {
    let Some(meta) = cell.get("metadata").and_then(Value::as_object) else {
        debug!("event=document_cell module=document status=skip cell={index} reason=no_metadata");
        return Ok(CellOutcome::Skipped);
    };
    let Some(kind) = meta
        .get("window_type")
        .and_then(Value::as_str)
        .and_then(WindowKind::parse)
    else {
        debug!("event=document_cell module=document status=skip cell={index} reason=no_window_type");
        return Ok(CellOutcome::Skipped);
    };

    let placement = decode_placement(index, meta.get("position"))?;
    let state = decode_state(index, meta.get("state"))?;

    let old_id = match meta.get("window_id").and_then(Value::as_u64) {
        Some(id) => id,
        None => {
            return Ok(CellOutcome::Failed(PerCellError {
                cell_index: index,
                window_id: None,
                reason: "missing or invalid `window_id`".to_string(),
            }))
        }
    };

    let payload = match decode_payload(kind, meta) {
        Ok(payload) => payload,
        Err(reason) => {
            warn!(
                "event=document_cell module=document status=error cell={} window_id={} kind={}",
                index,
                old_id,
                kind.as_str()
            );
            return Ok(CellOutcome::Failed(PerCellError {
                cell_index: index,
                window_id: Some(old_id),
                reason,
            }));
        }
    };

    let mut record = WindowRecord::new(old_id, kind, placement);
    record.state = state;
    record.payload = payload;
    record.export_template = meta
        .get("export_template")
        .and_then(Value::as_str)
        .and_then(ExportTemplate::parse)
        .unwrap_or_else(|| kind.default_template());
    record.tags = meta
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    record.content = joined_source(cell.get("source"));
    if let Some(timestamps) = meta.get("timestamps") {
        if let Some(created) = parse_timestamp(timestamps.get("created")) {
            record.created_at = created;
        }
        if let Some(modified) = parse_timestamp(timestamps.get("modified")) {
            record.modified_at = modified;
        }
    }

    Ok(CellOutcome::Restored(Candidate { old_id, record }))
}

fn decode_placement(index: usize, position: Option<&Value>) -> DocumentResult<Placement> {
    let defaults = Placement::default();
    let position = match position {
        None | Some(Value::Null) => return Ok(defaults),
        Some(Value::Object(position)) => position,
        Some(_) => {
            return Err(DocumentError::InvalidNotebookFormat(format!(
                "cell {index}: `position` is not an object"
            )))
        }
    };
    let field = |name: &str, default: f64| -> DocumentResult<f64> {
        Ok(numeric_field(index, "position", name, position.get(name))?.unwrap_or(default))
    };
    Ok(Placement {
        x: field("x", defaults.x)?,
        y: field("y", defaults.y)?,
        z: field("z", defaults.z)?,
        width: field("width", defaults.width)?,
        height: field("height", defaults.height)?,
        depth: numeric_field(index, "position", "depth", position.get("depth"))?,
    })
}

fn decode_state(index: usize, state: Option<&Value>) -> DocumentResult<WindowState> {
    let defaults = WindowState::default();
    let state = match state {
        None | Some(Value::Null) => return Ok(defaults),
        Some(Value::Object(state)) => state,
        Some(_) => {
            return Err(DocumentError::InvalidNotebookFormat(format!(
                "cell {index}: `state` is not an object"
            )))
        }
    };
    let flag = |name: &str| -> DocumentResult<bool> {
        match state.get(name) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(value)) => Ok(*value),
            Some(_) => Err(DocumentError::InvalidNotebookFormat(format!(
                "cell {index}: `state.{name}` is not a boolean"
            ))),
        }
    };
    let minimized = flag("minimized")?;
    let maximized = flag("maximized")?;
    if minimized && maximized {
        return Err(DocumentError::InvalidNotebookFormat(format!(
            "cell {index}: window is both minimized and maximized"
        )));
    }
    let opacity = numeric_field(index, "state", "opacity", state.get("opacity"))?
        .unwrap_or(defaults.opacity);
    if opacity.is_nan() {
        return Err(DocumentError::InvalidNotebookFormat(format!(
            "cell {index}: `state.opacity` is NaN"
        )));
    }
    let opacity = opacity.clamp(0.0, 1.0);
    Ok(WindowState {
        minimized,
        maximized,
        opacity,
    })
}

/// Reads a number or numeric string. Missing and `null` are `None`.
///
/// Strings may carry non-finite values (`"NaN"`, `"Infinity"`); placements
/// write them back the same way, so they survive a save.
fn numeric_field(
    index: usize,
    object: &str,
    name: &str,
    value: Option<&Value>,
) -> DocumentResult<Option<f64>> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    parsed.map(Some).ok_or_else(|| {
        DocumentError::InvalidNotebookFormat(format!(
            "cell {index}: `{object}.{name}` is not numeric"
        ))
    })
}

fn decode_payload(
    kind: WindowKind,
    meta: &Map<String, Value>,
) -> Result<Option<WindowPayload>, String> {
    let key = payload_key(kind);
    let value = match meta.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    let payload = match kind {
        WindowKind::Chart => WindowPayload::Chart(typed(key, value)?),
        WindowKind::Tabular => WindowPayload::Table(typed(key, value)?),
        WindowKind::Spatial => WindowPayload::PointCloud(typed(key, value)?),
        WindowKind::VolumetricMetric => WindowPayload::Metrics(typed(key, value)?),
        WindowKind::Model3D => WindowPayload::Model(typed(key, value)?),
    };
    Ok(Some(payload))
}

fn typed<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T, String> {
    T::deserialize(value).map_err(|err| format!("`{key}` could not be decoded: {err}"))
}

/// Notebook source may be a list of lines or one string.
fn joined_source(source: Option<&Value>) -> String {
    match source {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(lines)) => lines.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = value?.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn decode_legend_positions(metadata: &Map<String, Value>) -> BTreeMap<WindowId, LegendPosition> {
    let Some(entries) = metadata.get(LEGEND_POSITIONS_KEY).and_then(Value::as_object) else {
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(|(key, value)| {
            let id = key.trim().parse::<WindowId>().ok()?;
            let position = LegendPosition::deserialize(value).ok()?;
            Some((id, position))
        })
        .collect()
}

/// Reads the export summary without decoding cells.
pub fn read_export_summary(bytes: &[u8]) -> DocumentResult<Value> {
    let root: Value =
        serde_json::from_slice(bytes).map_err(|err| DocumentError::InvalidJson(err.to_string()))?;
    let (_, metadata) = document_shape(&root)?;
    Ok(metadata.get(EXPORT_SUMMARY_KEY).cloned().unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::{decode_document, deserialize, export_summary, serialize};
    use crate::document::error::DocumentError;
    use crate::document::ids::SequentialIds;
    use crate::model::window::{Placement, WindowKind, WindowRecord};
    use chrono::Utc;

    #[test]
    fn export_summary_is_sorted_and_deduplicated() {
        let mut a = WindowRecord::new(1, WindowKind::Tabular, Placement::default());
        a.tags = vec!["z".to_string(), "a".to_string()];
        let mut b = WindowRecord::new(2, WindowKind::Chart, Placement::default());
        b.tags = vec!["a".to_string()];
        let summary = export_summary(&[a, b], Utc::now());
        assert_eq!(summary.total_windows, 2);
        assert_eq!(summary.window_types, vec!["chart", "dataframe"]);
        assert_eq!(summary.export_templates, vec!["matplotlib", "pandas"]);
        assert_eq!(summary.all_tags, vec!["a", "z"]);
    }

    #[test]
    fn fresh_ids_never_equal_recorded_ids() {
        let record = WindowRecord::new(1, WindowKind::Chart, Placement::default());
        let bytes = serialize(&[record]).expect("serialize");
        let mut ids = SequentialIds::starting_at(1);
        let decoded = deserialize(&bytes, &mut ids).expect("deserialize");
        assert_eq!(decoded.windows[0].id, 2);
        assert_eq!(decoded.id_map.get(1), Some(2));
    }

    #[test]
    fn conflicting_state_is_fatal() {
        let bytes = br#"{"cells":[{"cell_type":"code","metadata":{"window_id":1,"window_type":"chart","state":{"minimized":true,"maximized":true,"opacity":1}},"source":[]}],"metadata":{}}"#;
        let err = deserialize(bytes, &mut SequentialIds::default()).expect_err("fatal");
        assert!(matches!(err, DocumentError::InvalidNotebookFormat(_)));
    }

    #[test]
    fn numeric_strings_are_accepted_for_position() {
        let bytes = br#"{"cells":[{"cell_type":"code","metadata":{"window_id":5,"window_type":"metrics","position":{"x":"1.5","y":2,"z":0,"width":"300","height":200}},"source":["a\n","b"]}],"metadata":{}}"#;
        let decoded = deserialize(bytes, &mut SequentialIds::default()).expect("decode");
        let window = &decoded.windows[0];
        assert_eq!(window.placement.x, 1.5);
        assert_eq!(window.placement.width, 300.0);
        assert_eq!(window.content, "a\nb");
    }

    #[test]
    fn pending_document_draws_ids_only_when_assigned() {
        let records = [
            WindowRecord::new(7, WindowKind::Chart, Placement::default()),
            WindowRecord::new(9, WindowKind::Spatial, Placement::default()),
        ];
        let bytes = serialize(&records).expect("serialize");
        let pending = decode_document(&bytes).expect("decode");
        assert_eq!(pending.window_count(), 2);

        let mut ids = SequentialIds::starting_at(100);
        let decoded = pending.assign_ids(&mut ids);
        assert_eq!(decoded.id_map.get(7), Some(100));
        assert_eq!(decoded.id_map.get(9), Some(101));
        assert_eq!(ids, SequentialIds::starting_at(102));
    }

    #[test]
    fn nan_opacity_is_fatal() {
        let bytes = br#"{"cells":[{"cell_type":"code","metadata":{"window_id":1,"window_type":"chart","state":{"opacity":"NaN"}},"source":[]}],"metadata":{}}"#;
        let err = decode_document(bytes).expect_err("fatal");
        assert!(matches!(err, DocumentError::InvalidNotebookFormat(_)));
    }
}
