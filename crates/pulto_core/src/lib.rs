//! Core engine for Pulto spatial workspaces.
//! Window records, workspace documents and geometry import live here; the
//! presentation layer only talks to this crate.

pub mod config;
pub mod document;
pub mod geometry;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use config::{ConfigError, WorkspaceConfig};
pub use document::{
    DecodedDocument, DocumentError, DocumentResult, IdMapping, PendingDocument, PerCellError,
};
pub use geometry::{
    import_geometry, GeometryFormat, GeometryImportError, GeometryImporter, GeometryResult,
    ImportedGeometry,
};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LoggingError};
pub use model::mesh::{Face, Material, MaterialColor, MeshModel, Vertex};
pub use model::payload::{
    ChartData, ChartSeries, ChartType, CloudPoint, Metric, ModelDescriptor, PointCloudData,
    TabularFrame, VolumetricMetrics, WindowPayload,
};
pub use model::window::{
    ExportTemplate, LegendPosition, Placement, WindowId, WindowKind, WindowRecord, WindowState,
};
pub use service::{
    AutoSaver, ImportError, ImportResult, ImportService, LoadMode, LoadSummary, TabularParser,
};
pub use store::{SharedWorkspace, StoreError, StoreResult, WorkspaceEvent, WorkspaceStore};

/// Health probe used by the CLI and host bindings.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_answers() {
        assert_eq!(ping(), "pong");
        assert!(!core_version().is_empty());
    }
}
