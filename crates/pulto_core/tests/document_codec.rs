use chrono::{TimeZone, Utc};
use pulto_core::document::{deserialize, render_content, serialize, serialize_document, SequentialIds};
use pulto_core::geometry::placeholder::placeholder_sphere;
use pulto_core::import_geometry;
use pulto_core::{
    ChartData, ChartType, CloudPoint, DocumentError, ExportTemplate, LegendPosition,
    ModelDescriptor, Placement, PointCloudData, TabularFrame, VolumetricMetrics, WindowKind,
    WindowPayload, WindowRecord, WindowState, WorkspaceStore,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

fn mixed_workspace() -> Vec<WindowRecord> {
    let mut store = WorkspaceStore::default();

    let chart = store
        .create(WindowKind::Chart, Some(Placement::new(-150.0, 100.0, -50.0, 640.0, 480.0)))
        .id;
    let mut data = ChartData::new("Quarterly")
        .with_series("revenue", vec![1.0, 2.0, 3.5])
        .with_series("cost", vec![0.5, 1.5, 2.0]);
    data.chart_type = ChartType::Bar;
    data.x_label = Some("quarter".to_string());
    store.update(chart, WindowPayload::Chart(data)).unwrap();
    store
        .set_tags(chart, vec!["finance".to_string(), "q3".to_string(), "q3".to_string()])
        .unwrap();

    let table = store.create(WindowKind::Tabular, None).id;
    let mut frame = TabularFrame::new(vec!["month".to_string(), "sales".to_string()]);
    frame.push_row(vec!["Jan".to_string(), "1000".to_string()]);
    frame.push_row(vec!["Feb".to_string(), "1100.5".to_string()]);
    store.update(table, WindowPayload::Table(frame)).unwrap();
    store.set_template(table, ExportTemplate::Markdown).unwrap();

    let cloud = store
        .create(WindowKind::Spatial, Some(Placement::new(0.0, 0.0, 0.0, 800.0, 600.0).with_depth(300.0)))
        .id;
    let points = PointCloudData {
        title: "scan".to_string(),
        points: vec![
            CloudPoint { x: 0.0, y: 1.0, z: 2.0, intensity: Some(0.5) },
            CloudPoint { x: -1.0, y: 0.25, z: 3.0, intensity: None },
        ],
    };
    store.update(cloud, WindowPayload::PointCloud(points)).unwrap();
    store
        .set_state(cloud, WindowState { minimized: true, maximized: false, opacity: 0.8 })
        .unwrap();

    let metrics = store.create(WindowKind::VolumetricMetric, None).id;
    let panel = VolumetricMetrics::new("model fit")
        .with_metric("accuracy", 0.93, None)
        .with_metric("volume", 12.5, Some("m3"));
    store.update(metrics, WindowPayload::Metrics(panel)).unwrap();

    let model = store.create(WindowKind::Model3D, None).id;
    store
        .update(
            model,
            WindowPayload::Model(ModelDescriptor {
                name: "teapot".to_string(),
                source_format: Some("usdz".to_string()),
                placeholder: true,
                mesh: placeholder_sphere(6, 3),
            }),
        )
        .unwrap();

    let notes = store.create(WindowKind::Chart, None).id;
    store.update_content(notes, "# scratch\nprint('no payload')\n").unwrap();

    store.all(false)
}

#[test]
fn round_trip_restores_kinds_placements_tags_and_content() {
    let originals = mixed_workspace();
    let bytes = serialize(&originals).unwrap();

    let mut ids = SequentialIds::starting_at(1000);
    let decoded = deserialize(&bytes, &mut ids).unwrap();
    assert!(decoded.errors.is_empty());
    assert_eq!(decoded.skipped_cells, 0);
    assert_eq!(decoded.windows.len(), originals.len());

    for (original, restored) in originals.iter().zip(&decoded.windows) {
        assert_ne!(restored.id, original.id);
        assert_eq!(decoded.id_map.get(original.id), Some(restored.id));
        assert_eq!(restored.kind, original.kind);
        assert_eq!(restored.placement, original.placement);
        assert_eq!(restored.tags, original.tags);
        assert_eq!(restored.state, original.state);
        assert_eq!(restored.export_template, original.export_template);
        assert_eq!(restored.payload, original.payload);
        assert_eq!(restored.content, render_content(original));
        assert_eq!(restored.created_at, original.created_at);
    }

    let old_ids: BTreeSet<_> = originals.iter().map(|w| w.id).collect();
    let mapped: BTreeSet<_> = decoded.id_map.iter().map(|(old, _)| old).collect();
    assert_eq!(mapped, old_ids);
    assert!(decoded.id_map.is_bijective());
}

#[test]
fn reserializing_a_decoded_document_does_not_drift() {
    let originals = mixed_workspace();
    let first = deserialize(&serialize(&originals).unwrap(), &mut SequentialIds::default()).unwrap();
    let second = deserialize(
        &serialize(&first.windows).unwrap(),
        &mut SequentialIds::starting_at(500),
    )
    .unwrap();

    assert_eq!(second.windows.len(), first.windows.len());
    for (a, b) in first.windows.iter().zip(&second.windows) {
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.placement, b.placement);
        assert_eq!(a.content, b.content);
    }
}

#[test]
fn serialized_document_has_notebook_shape_and_derived_metadata() {
    let originals = mixed_workspace();
    let exported_at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
    let bytes = serialize_document(&originals, &BTreeMap::new(), exported_at).unwrap();
    let root: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(root["nbformat"], 4);
    assert_eq!(root["nbformat_minor"], 5);
    assert_eq!(root["metadata"]["kernelspec"]["name"], "python3");

    let summary = &root["metadata"]["visionos_export"];
    assert_eq!(summary["total_windows"], originals.len());
    assert_eq!(
        summary["window_types"],
        json!(["chart", "dataframe", "metrics", "model3d", "spatial"])
    );
    assert_eq!(summary["all_tags"], json!(["finance", "q3"]));
    assert_eq!(summary["export_date"], "2026-10-18T09:30:00Z");

    let cells = root["cells"].as_array().unwrap();
    assert_eq!(cells.len(), originals.len());
    assert_eq!(cells[0]["cell_type"], "code");
    assert_eq!(cells[0]["execution_count"], Value::Null);
    assert_eq!(cells[0]["metadata"]["window_type"], "chart");
    assert!(cells[0]["metadata"]["chart_data"].is_object());
    assert_eq!(cells[1]["cell_type"], "markdown");
    assert!(cells[1].get("outputs").is_none());
    assert_eq!(cells[2]["metadata"]["position"]["depth"], 300.0);
    assert!(cells[0]["metadata"]["position"].get("depth").is_none());
}

#[test]
fn serialize_is_deterministic_for_fixed_timestamp() {
    let originals = mixed_workspace();
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let first = serialize_document(&originals, &BTreeMap::new(), at).unwrap();
    let second = serialize_document(&originals, &BTreeMap::new(), at).unwrap();
    assert_eq!(first, second);
}

#[test]
fn cell_without_window_type_is_silently_skipped() {
    let doc = json!({
        "cells": [{ "cell_type": "code", "metadata": { "window_id": 1 }, "source": ["x = 1"] }],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 5
    });
    let decoded =
        deserialize(doc.to_string().as_bytes(), &mut SequentialIds::default()).unwrap();
    assert!(decoded.windows.is_empty());
    assert!(decoded.errors.is_empty());
    assert_eq!(decoded.skipped_cells, 1);
}

#[test]
fn malformed_json_is_fatal() {
    let err = deserialize(b"{\"cells\": [", &mut SequentialIds::default()).unwrap_err();
    assert!(matches!(err, DocumentError::InvalidJson(_)));
}

#[test]
fn missing_cells_or_metadata_is_fatal() {
    for doc in [json!({ "metadata": {} }), json!({ "cells": [] }), json!([1, 2])] {
        let err = deserialize(doc.to_string().as_bytes(), &mut SequentialIds::default())
            .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidNotebookFormat(_)), "{doc}");
    }
}

#[test]
fn non_numeric_position_aborts_the_whole_document() {
    let doc = json!({
        "cells": [
            { "metadata": { "window_id": 1, "window_type": "chart" }, "source": [] },
            { "metadata": { "window_id": 2, "window_type": "chart",
                            "position": { "x": "left", "y": 0, "z": 0, "width": 10, "height": 10 } },
              "source": [] }
        ],
        "metadata": {}
    });
    let mut ids = SequentialIds::default();
    let err = deserialize(doc.to_string().as_bytes(), &mut ids).unwrap_err();
    assert!(matches!(err, DocumentError::InvalidNotebookFormat(_)));
    // No ids were handed out for the valid first cell.
    assert_eq!(pulto_core::document::IdAllocator::allocate_id(&mut ids), 1);
}

#[test]
fn undecodable_payload_is_a_per_cell_error() {
    let doc = json!({
        "cells": [
            { "metadata": { "window_id": 7, "window_type": "dataframe",
                            "dataframe_data": { "columns": "not a list" } },
              "source": [] },
            { "metadata": { "window_id": 8, "window_type": "metrics" }, "source": ["ok"] },
            { "metadata": { "window_type": "chart" }, "source": [] }
        ],
        "metadata": {}
    });
    let decoded =
        deserialize(doc.to_string().as_bytes(), &mut SequentialIds::default()).unwrap();
    assert_eq!(decoded.windows.len(), 1);
    assert_eq!(decoded.windows[0].content, "ok");
    assert_eq!(decoded.errors.len(), 2);
    assert_eq!(decoded.errors[0].cell_index, 0);
    assert_eq!(decoded.errors[0].window_id, Some(7));
    assert_eq!(decoded.errors[1].window_id, None);
}

#[test]
fn legend_positions_are_written_under_old_ids_and_read_back() {
    let originals = mixed_workspace();
    let chart_id = originals[0].id;
    let legends = BTreeMap::from([(chart_id, LegendPosition { x: 0.8, y: 0.1 })]);
    let bytes = serialize_document(&originals, &legends, Utc::now()).unwrap();

    let decoded = deserialize(&bytes, &mut SequentialIds::starting_at(100)).unwrap();
    assert_eq!(decoded.legend_positions, legends);
    let remapped = decoded.id_map.remap_keys(decoded.legend_positions.clone());
    assert_eq!(
        remapped.get(&decoded.windows[0].id),
        Some(&LegendPosition { x: 0.8, y: 0.1 })
    );
}

fn stl_with_one_triangle(vertices: [[f32; 3]; 3]) -> Vec<u8> {
    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 12]);
    for vertex in vertices {
        for coord in vertex {
            bytes.extend_from_slice(&coord.to_le_bytes());
        }
    }
    bytes.extend_from_slice(&[0u8; 2]);
    bytes
}

#[test]
fn chart_gaps_survive_a_round_trip() {
    let mut record = WindowRecord::new(1, WindowKind::Chart, Placement::default());
    let mut data = ChartData::new("gaps").with_series("signal", vec![1.0, f64::NAN, 3.0]);
    data.x_values = vec![0.0, 1.0, f64::INFINITY];
    record.set_payload(WindowPayload::Chart(data)).unwrap();

    let bytes = serialize(&[record]).unwrap();
    let root: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        root["cells"][0]["metadata"]["chart_data"]["series"][0]["values"],
        json!([1.0, "NaN", 3.0])
    );

    let decoded = deserialize(&bytes, &mut SequentialIds::default()).unwrap();
    assert!(decoded.errors.is_empty());
    assert_eq!(decoded.windows.len(), 1);
    let Some(WindowPayload::Chart(chart)) = &decoded.windows[0].payload else {
        panic!("chart payload expected");
    };
    let values = &chart.series[0].values;
    assert_eq!(values[0], 1.0);
    assert!(values[1].is_nan());
    assert_eq!(values[2], 3.0);
    assert_eq!(chart.x_values[2], f64::INFINITY);
}

#[test]
fn stl_model_with_nan_vertex_survives_a_round_trip() {
    let bytes = stl_with_one_triangle([[0.0, 0.0, 0.0], [f32::NAN, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let imported = import_geometry(&bytes, "stl").unwrap();
    let mut record = WindowRecord::new(3, WindowKind::Model3D, Placement::default());
    record
        .set_payload(WindowPayload::Model(ModelDescriptor {
            name: "scan".to_string(),
            source_format: Some("stl".to_string()),
            placeholder: false,
            mesh: imported.mesh,
        }))
        .unwrap();

    let decoded = deserialize(&serialize(&[record]).unwrap(), &mut SequentialIds::default()).unwrap();
    assert!(decoded.errors.is_empty());
    let Some(WindowPayload::Model(model)) = &decoded.windows[0].payload else {
        panic!("model payload expected");
    };
    assert_eq!(model.mesh.vertex_count(), 3);
    assert!(model.mesh.vertices[1].x.is_nan());
    assert_eq!(model.mesh.vertices[2].y, 1.0);
    assert_eq!(model.mesh.face_count(), 1);
}

#[test]
fn non_finite_position_strings_are_stable_across_saves() {
    let doc = json!({
        "cells": [
            { "metadata": { "window_id": 4, "window_type": "spatial",
                            "position": { "x": "NaN", "y": 0, "z": "-inf", "width": 800, "height": 600 } },
              "source": [] }
        ],
        "metadata": {}
    });
    let first = deserialize(doc.to_string().as_bytes(), &mut SequentialIds::default()).unwrap();
    let bytes = serialize(&first.windows).unwrap();
    let root: Value = serde_json::from_slice(&bytes).unwrap();
    let position = &root["cells"][0]["metadata"]["position"];
    assert_eq!(position["x"], json!("NaN"));
    assert_eq!(position["z"], json!("-Infinity"));

    let second = deserialize(&bytes, &mut SequentialIds::starting_at(50)).unwrap();
    let placement = second.windows[0].placement;
    assert!(placement.x.is_nan());
    assert_eq!(placement.z, f64::NEG_INFINITY);
    assert_eq!(placement.width, 800.0);
}
