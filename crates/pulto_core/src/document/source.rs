//! Renders window records into notebook source lines.
//!
//! # Invariants
//! - Output depends only on the record's kind, template, payload and content;
//!   window ids are not embedded, so a restored window renders identically.
//! - Every line except the last keeps its trailing `\n`; joining the lines
//!   reproduces the rendered text exactly.
//! - A record without payload renders its `content` verbatim.

use crate::model::payload::{
    ChartData, ChartType, ModelDescriptor, PointCloudData, TabularFrame, VolumetricMetrics,
    WindowPayload,
};
use crate::model::window::{ExportTemplate, WindowRecord};

/// Notebook cell flavour a record is written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Code,
    Markdown,
}

/// Cell flavour for a record: markdown-only templates produce markdown cells.
pub fn cell_kind(record: &WindowRecord) -> CellKind {
    match record.export_template {
        ExportTemplate::Markdown => CellKind::Markdown,
        _ => CellKind::Code,
    }
}

/// Rendered cell text for `record`.
pub fn render_content(record: &WindowRecord) -> String {
    let Some(payload) = &record.payload else {
        return record.content.clone();
    };
    let rendered = match record.export_template {
        ExportTemplate::Markdown => render_markdown(payload),
        ExportTemplate::Custom if !record.content.is_empty() => return record.content.clone(),
        ExportTemplate::Custom | ExportTemplate::Matplotlib => render_plot_code(payload),
        ExportTemplate::Pandas => render_frame_code(payload),
    };
    rendered.trim_end_matches('\n').to_string()
}

/// Rendered text split into notebook source lines.
pub fn render_source(record: &WindowRecord) -> Vec<String> {
    split_source_lines(&render_content(record))
}

/// Splits text into lines that keep their trailing newline.
pub fn split_source_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

fn render_plot_code(payload: &WindowPayload) -> String {
    match payload {
        WindowPayload::Chart(chart) => chart_plot_code(chart),
        WindowPayload::Table(frame) => {
            let mut out = String::from("import matplotlib.pyplot as plt\n");
            out.push_str(&frame_construction(frame));
            out.push_str("\ndf.plot()\nplt.show()\n");
            out
        }
        WindowPayload::PointCloud(cloud) => point_cloud_plot_code(cloud),
        WindowPayload::Metrics(metrics) => metrics_plot_code(metrics),
        WindowPayload::Model(model) => model_summary_code(model),
    }
}

fn render_frame_code(payload: &WindowPayload) -> String {
    match payload {
        WindowPayload::Table(frame) => {
            let mut out = frame_construction(frame);
            out.push_str("\ndf\n");
            out
        }
        WindowPayload::Chart(chart) => {
            let mut out = String::from("import pandas as pd\n\n");
            out.push_str(&format!("# {}\n", single_line(&chart.title)));
            out.push_str("df = pd.DataFrame({\n");
            out.push_str(&format!("    \"x\": {},\n", py_list(&chart_x_values(chart))));
            for series in &chart.series {
                out.push_str(&format!("    {}: {},\n", py_str(&series.name), py_list(&series.values)));
            }
            out.push_str("})\ndf\n");
            out
        }
        WindowPayload::PointCloud(cloud) => {
            let mut out = String::from("import pandas as pd\n\n");
            out.push_str(&format!("# {}\n", single_line(&cloud.title)));
            out.push_str("df = pd.DataFrame([\n");
            for point in &cloud.points {
                out.push_str(&format!(
                    "    [{}, {}, {}],\n",
                    py_num(point.x),
                    py_num(point.y),
                    py_num(point.z)
                ));
            }
            out.push_str("], columns=[\"x\", \"y\", \"z\"])\ndf.describe()\n");
            out
        }
        WindowPayload::Metrics(metrics) => {
            let mut out = String::from("import pandas as pd\n\n");
            out.push_str(&format!("# {}\n", single_line(&metrics.title)));
            out.push_str("df = pd.DataFrame([\n");
            for metric in &metrics.metrics {
                out.push_str(&format!(
                    "    {{\"metric\": {}, \"value\": {}, \"unit\": {}}},\n",
                    py_str(&metric.name),
                    py_num(metric.value),
                    metric.unit.as_deref().map(py_str).unwrap_or_else(|| "None".to_string())
                ));
            }
            out.push_str("])\ndf\n");
            out
        }
        WindowPayload::Model(model) => model_summary_code(model),
    }
}

fn chart_x_values(chart: &ChartData) -> Vec<f64> {
    if !chart.x_values.is_empty() {
        return chart.x_values.clone();
    }
    let len = chart.series.iter().map(|series| series.values.len()).max().unwrap_or(0);
    (0..len).map(|index| index as f64).collect()
}

fn chart_plot_code(chart: &ChartData) -> String {
    let mut out = String::from("import matplotlib.pyplot as plt\n\n");
    out.push_str(&format!("x = {}\n", py_list(&chart_x_values(chart))));
    out.push_str("plt.figure(figsize=(8, 5))\n");
    for series in &chart.series {
        let values = py_list(&series.values);
        let label = py_str(&series.name);
        let line = match chart.chart_type {
            ChartType::Line => format!("plt.plot(x, {values}, label={label})\n"),
            ChartType::Bar => format!("plt.bar(x, {values}, label={label})\n"),
            ChartType::Scatter => format!("plt.scatter(x, {values}, label={label})\n"),
            ChartType::Area => {
                format!("plt.fill_between(x, {values}, alpha=0.4, label={label})\n")
            }
        };
        out.push_str(&line);
    }
    out.push_str(&format!("plt.title({})\n", py_str(&chart.title)));
    if let Some(label) = &chart.x_label {
        out.push_str(&format!("plt.xlabel({})\n", py_str(label)));
    }
    if let Some(label) = &chart.y_label {
        out.push_str(&format!("plt.ylabel({})\n", py_str(label)));
    }
    if !chart.series.is_empty() {
        out.push_str("plt.legend()\n");
    }
    out.push_str("plt.show()\n");
    out
}

fn frame_construction(frame: &TabularFrame) -> String {
    let mut out = String::from("import pandas as pd\n\ndf = pd.DataFrame({\n");
    for (index, column) in frame.columns.iter().enumerate() {
        let numeric = frame.is_numeric_column(index);
        let cells: Vec<String> = frame
            .column(index)
            .into_iter()
            .map(|cell| match (numeric, cell.trim()) {
                (true, "") => "None".to_string(),
                (true, value) => value.parse::<f64>().map(py_num).unwrap_or_else(|_| py_str(cell)),
                (false, _) => py_str(cell),
            })
            .collect();
        out.push_str(&format!("    {}: [{}],\n", py_str(column), cells.join(", ")));
    }
    out.push_str("})\n");
    out
}

fn point_cloud_plot_code(cloud: &PointCloudData) -> String {
    let mut out = String::from("import numpy as np\nimport matplotlib.pyplot as plt\n\n");
    out.push_str("points = np.array([\n");
    for point in &cloud.points {
        out.push_str(&format!(
            "    [{}, {}, {}],\n",
            py_num(point.x),
            py_num(point.y),
            py_num(point.z)
        ));
    }
    out.push_str("]).reshape(-1, 3)\n");
    out.push_str("fig = plt.figure()\nax = fig.add_subplot(projection=\"3d\")\n");
    out.push_str("ax.scatter(points[:, 0], points[:, 1], points[:, 2], s=2)\n");
    out.push_str(&format!("ax.set_title({})\n", py_str(&cloud.title)));
    out.push_str("plt.show()\n");
    out
}

fn metrics_plot_code(metrics: &VolumetricMetrics) -> String {
    let mut out = String::from("import matplotlib.pyplot as plt\n\nmetrics = {\n");
    for metric in &metrics.metrics {
        out.push_str(&format!("    {}: {},\n", py_str(&metric.name), py_num(metric.value)));
    }
    out.push_str("}\n");
    out.push_str("plt.bar(list(metrics.keys()), list(metrics.values()))\n");
    out.push_str(&format!("plt.title({})\n", py_str(&metrics.title)));
    out.push_str("plt.show()\n");
    out
}

fn model_summary_code(model: &ModelDescriptor) -> String {
    let mesh = &model.mesh;
    let mut out = String::new();
    out.push_str(&format!("# 3D model: {}\n", single_line(&model.name)));
    out.push_str("model = {\n");
    out.push_str(&format!("    \"name\": {},\n", py_str(&model.name)));
    out.push_str(&format!(
        "    \"format\": {},\n",
        model.source_format.as_deref().map(py_str).unwrap_or_else(|| "None".to_string())
    ));
    out.push_str(&format!(
        "    \"placeholder\": {},\n",
        if model.placeholder { "True" } else { "False" }
    ));
    out.push_str(&format!("    \"vertices\": {},\n", mesh.vertex_count()));
    out.push_str(&format!("    \"faces\": {},\n", mesh.face_count()));
    out.push_str(&format!("    \"triangles\": {},\n", mesh.triangle_count()));
    let materials: Vec<String> = mesh.materials.iter().map(|m| py_str(&m.name)).collect();
    out.push_str(&format!("    \"materials\": [{}],\n", materials.join(", ")));
    if let Some(bounds) = mesh.bounds() {
        let size = bounds.size();
        out.push_str(&format!(
            "    \"size\": ({}, {}, {}),\n",
            py_num(size.x),
            py_num(size.y),
            py_num(size.z)
        ));
    }
    out.push_str("}\nmodel\n");
    out
}

fn render_markdown(payload: &WindowPayload) -> String {
    let mut out = String::new();
    match payload {
        WindowPayload::Chart(chart) => {
            out.push_str(&format!("## {}\n\n", single_line(&chart.title)));
            let mut header = vec!["x".to_string()];
            header.extend(chart.series.iter().map(|series| series.name.clone()));
            let x_values = chart_x_values(chart);
            let rows: Vec<Vec<String>> = x_values
                .iter()
                .enumerate()
                .map(|(index, x)| {
                    let mut row = vec![py_num(*x)];
                    row.extend(chart.series.iter().map(|series| {
                        series.values.get(index).map(|v| py_num(*v)).unwrap_or_default()
                    }));
                    row
                })
                .collect();
            out.push_str(&markdown_table(&header, &rows));
        }
        WindowPayload::Table(frame) => {
            out.push_str(&markdown_table(&frame.columns, &frame.rows));
        }
        WindowPayload::PointCloud(cloud) => {
            out.push_str(&format!("## {}\n\n", single_line(&cloud.title)));
            out.push_str(&format!("- points: {}\n", cloud.points.len()));
        }
        WindowPayload::Metrics(metrics) => {
            out.push_str(&format!("## {}\n\n", single_line(&metrics.title)));
            let header = ["Metric", "Value", "Unit"].map(str::to_string);
            let rows: Vec<Vec<String>> = metrics
                .metrics
                .iter()
                .map(|metric| {
                    vec![
                        metric.name.clone(),
                        py_num(metric.value),
                        metric.unit.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            out.push_str(&markdown_table(&header, &rows));
        }
        WindowPayload::Model(model) => {
            out.push_str(&format!("## {}\n\n", single_line(&model.name)));
            out.push_str(&format!("- vertices: {}\n", model.mesh.vertex_count()));
            out.push_str(&format!("- faces: {}\n", model.mesh.face_count()));
            if model.placeholder {
                out.push_str("- placeholder geometry\n");
            }
        }
    }
    out
}

fn markdown_table(header: &[String], rows: &[Vec<String>]) -> String {
    let escape = |cell: &str| single_line(cell).replace('|', "\\|");
    let mut out = String::new();
    out.push_str(&format!(
        "| {} |\n",
        header.iter().map(|cell| escape(cell.as_str())).collect::<Vec<_>>().join(" | ")
    ));
    out.push_str(&format!("|{}\n", " --- |".repeat(header.len().max(1))));
    for row in rows {
        let cells: Vec<String> = (0..header.len())
            .map(|index| row.get(index).map(|cell| escape(cell.as_str())).unwrap_or_default())
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Python string literal; JSON string escaping is a valid subset.
fn py_str(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", single_line(text)))
}

fn py_num(value: f64) -> String {
    if value.is_nan() {
        "float(\"nan\")".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "float(\"inf\")".to_string()
        } else {
            "-float(\"inf\")".to_string()
        }
    } else {
        value.to_string()
    }
}

fn py_list(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|value| py_num(*value)).collect();
    format!("[{}]", items.join(", "))
}
