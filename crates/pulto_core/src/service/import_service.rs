//! Whole-workspace load/save and single-file import.
//!
//! # Responsibility
//! - Compose the document codec with the shared store for save and load.
//! - Compose the geometry router (and an optional tabular parser) with the
//!   store for dropping external files into new windows.
//!
//! # Invariants
//! - Loads decode outside the workspace lock and commit in one critical
//!   section; a fatal decode error leaves the workspace untouched.
//! - File reads happen under a scoped access lease.
//! - In a batch import every file has an independent outcome.

use crate::config::WorkspaceConfig;
use crate::document::codec::{decode_document, serialize_document, PendingDocument};
use crate::document::error::{DocumentError, PerCellError};
use crate::document::ids::IdMapping;
use crate::document::storage::{read_document, write_document_atomic};
use crate::geometry::error::GeometryImportError;
use crate::geometry::router::{normalize_extension, GeometryFormat, GeometryImporter};
use crate::model::payload::{ModelDescriptor, PointCloudData, TabularFrame, WindowPayload};
use crate::model::window::WindowRecord;
use crate::service::file_access::{
    with_scoped_access, AccessProvider, FileAccessError, UnrestrictedAccess,
};
use crate::store::events::WorkspaceEvent;
use crate::store::shared::SharedWorkspace;
use crate::store::workspace_store::{StoreError, StoreResult};
use chrono::Utc;
use log::{info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("`{}` is {size} bytes, above the {limit} byte import limit", .path.display())]
    MemoryError {
        path: PathBuf,
        size: u64,
        limit: u64,
    },
    #[error("unsupported file format: `{0}`")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Geometry(#[from] GeometryImportError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("tabular data could not be parsed: {0}")]
    Tabular(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Access(#[from] FileAccessError),
    #[error("io error on `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How a loaded document combines with the current workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Remove every existing window first.
    #[default]
    Replace,
    /// Keep existing windows and add the restored ones.
    Merge,
}

/// Outcome of a workspace load.
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub restored: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<PerCellError>,
    pub id_map: IdMapping,
}

impl LoadSummary {
    /// User-facing one-liner.
    pub fn message(&self) -> String {
        format!("restored {} windows, {} failed", self.restored, self.failed)
    }
}

/// Collaborator that turns delimited text into a table.
pub trait TabularParser: Send + Sync {
    fn parse(&self, bytes: &[u8], delimiter: u8) -> Result<TabularFrame, String>;
}

/// Result for one file of a batch.
#[derive(Debug)]
pub struct FileImportOutcome {
    pub path: PathBuf,
    pub result: ImportResult<WindowRecord>,
}

/// Decoded file waiting to be committed as a window.
#[derive(Debug)]
struct PreparedImport {
    extension: String,
    payload: WindowPayload,
}

/// Import/export orchestrator over one shared workspace.
#[derive(Clone)]
pub struct ImportService {
    workspace: SharedWorkspace,
    config: WorkspaceConfig,
    geometry: GeometryImporter,
    access: Arc<dyn AccessProvider>,
    tabular: Option<Arc<dyn TabularParser>>,
}

impl ImportService {
    pub fn new(workspace: SharedWorkspace, config: WorkspaceConfig) -> Self {
        let geometry = GeometryImporter::new(config.placeholder_segments, config.placeholder_rings);
        Self {
            workspace,
            config,
            geometry,
            access: Arc::new(UnrestrictedAccess),
            tabular: None,
        }
    }

    pub fn with_access_provider(mut self, access: Arc<dyn AccessProvider>) -> Self {
        self.access = access;
        self
    }

    pub fn with_tabular_parser(mut self, parser: Arc<dyn TabularParser>) -> Self {
        self.tabular = Some(parser);
        self
    }

    pub fn workspace(&self) -> &SharedWorkspace {
        &self.workspace
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Serializes every window and writes the document atomically.
    ///
    /// Returns the number of windows written.
    pub fn save_workspace(&self, path: &Path) -> ImportResult<usize> {
        let started_at = Instant::now();
        let (windows, legends) = self.workspace.snapshot();
        let bytes = serialize_document(&windows, &legends, Utc::now())?;
        with_scoped_access(self.access.as_ref(), path, |path| -> ImportResult<()> {
            write_document_atomic(path, &bytes)?;
            Ok(())
        })?;
        info!(
            "event=workspace_save module=service status=ok windows={} bytes={} duration_ms={}",
            windows.len(),
            bytes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(windows.len())
    }

    /// Reads a document and restores its windows.
    ///
    /// Equivalent to [`read_workspace`](Self::read_workspace) followed by
    /// [`commit_load`](Self::commit_load).
    ///
    /// # Errors
    /// - `FileNotFound`/`MemoryError` before anything is decoded.
    /// - `Document` for fatal decode failures; the workspace is unchanged.
    pub fn load_workspace(&self, path: &Path, mode: LoadMode) -> ImportResult<LoadSummary> {
        let started_at = Instant::now();
        let pending = self.read_workspace(path)?;
        let summary = self.commit_load(pending, mode);
        info!(
            "event=workspace_load module=service status=ok restored={} failed={} skipped={} duration_ms={}",
            summary.restored,
            summary.failed,
            summary.skipped,
            started_at.elapsed().as_millis()
        );
        Ok(summary)
    }

    /// Reads and decodes a document without taking the workspace lock.
    ///
    /// Dropping the result abandons the load with the workspace untouched.
    pub fn read_workspace(&self, path: &Path) -> ImportResult<PendingDocument> {
        let bytes = self.read_limited(path, |path| {
            read_document(path).map_err(ImportError::from)
        })?;
        Ok(decode_document(&bytes)?)
    }

    /// Assigns fresh ids and restores a decoded document in one critical
    /// section, then publishes `Cleared` (replace only) and `Restored`.
    pub fn commit_load(&self, pending: PendingDocument, mode: LoadMode) -> LoadSummary {
        let cleared = mode == LoadMode::Replace;
        let summary = self.workspace.write(|store| {
            let decoded = pending.assign_ids(store);
            if cleared {
                store.clear_all();
            }
            let restore = store.restore(decoded.windows);
            store.merge_legend_positions(decoded.id_map.remap_keys(decoded.legend_positions));
            LoadSummary {
                restored: restore.restored.len(),
                failed: decoded.errors.len(),
                skipped: decoded.skipped_cells,
                errors: decoded.errors,
                id_map: decoded.id_map,
            }
        });

        if cleared {
            self.workspace.publish(WorkspaceEvent::Cleared);
        }
        self.workspace.publish(WorkspaceEvent::Restored {
            count: summary.restored,
        });
        summary
    }

    /// Imports one external file into a new window.
    pub fn import_file(&self, path: &Path) -> ImportResult<WindowRecord> {
        let prepared = self.prepare(path)?;
        self.commit(prepared)
    }

    /// Decodes files in parallel, then commits successes in input order.
    pub fn import_files(&self, paths: &[PathBuf]) -> Vec<FileImportOutcome> {
        let prepared: Vec<ImportResult<PreparedImport>> =
            paths.par_iter().map(|path| self.prepare(path)).collect();
        let outcomes: Vec<FileImportOutcome> = paths
            .iter()
            .zip(prepared)
            .map(|(path, prepared)| FileImportOutcome {
                path: path.clone(),
                result: prepared.and_then(|prepared| self.commit(prepared)),
            })
            .collect();
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!(
            "event=batch_import module=service status=ok files={} imported={} failed={}",
            outcomes.len(),
            outcomes.len() - failed,
            failed
        );
        outcomes
    }

    fn prepare(&self, path: &Path) -> ImportResult<PreparedImport> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(normalize_extension)
            .unwrap_or_default();
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("untitled")
            .to_string();

        let result = self.read_limited(path, |path| {
            std::fs::read(path).map_err(|source| ImportError::Io {
                path: path.to_path_buf(),
                source,
            })
        });
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(
                    "event=file_import module=service status=error extension={} error={}",
                    extension, err
                );
                return Err(err);
            }
        };

        let payload = match extension.as_str() {
            "csv" | "tsv" => {
                let parser = self
                    .tabular
                    .as_ref()
                    .ok_or_else(|| ImportError::UnsupportedFormat(extension.clone()))?;
                let delimiter = if extension == "tsv" { b'\t' } else { b',' };
                let frame = parser.parse(&bytes, delimiter).map_err(ImportError::Tabular)?;
                WindowPayload::Table(frame)
            }
            _ => {
                if GeometryFormat::from_extension(&extension).is_none() {
                    return Err(ImportError::UnsupportedFormat(extension));
                }
                let imported = self.geometry.import(&bytes, &extension)?;
                if imported.mesh.face_count() == 0 && imported.mesh.vertex_count() > 0 {
                    WindowPayload::PointCloud(PointCloudData::from_mesh(name, &imported.mesh))
                } else {
                    if imported.mesh.is_empty() {
                        warn!(
                            "event=file_import module=service status=empty_mesh extension={}",
                            extension
                        );
                    }
                    WindowPayload::Model(ModelDescriptor {
                        name,
                        source_format: Some(extension.clone()),
                        placeholder: imported.placeholder,
                        mesh: imported.mesh,
                    })
                }
            }
        };
        Ok(PreparedImport { extension, payload })
    }

    fn commit(&self, prepared: PreparedImport) -> ImportResult<WindowRecord> {
        let PreparedImport { extension, payload } = prepared;
        let kind = payload.kind();
        let record = self.workspace.write(|store| -> StoreResult<WindowRecord> {
            let id = store.create(kind, None).id;
            store.update(id, payload)?;
            store.set_tags(id, vec![extension])?;
            store.get(id).cloned().ok_or(StoreError::WindowNotFound(id))
        })?;
        self.workspace.publish(WorkspaceEvent::Created(record.id));
        info!(
            "event=file_import module=service status=ok window_id={} kind={}",
            record.id,
            kind.as_str()
        );
        Ok(record)
    }

    /// Checks existence and size, then reads under a scoped lease.
    fn read_limited<T>(
        &self,
        path: &Path,
        read: impl FnOnce(&Path) -> ImportResult<T>,
    ) -> ImportResult<T> {
        with_scoped_access(self.access.as_ref(), path, |path| {
            let metadata = std::fs::metadata(path).map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    ImportError::FileNotFound(path.to_path_buf())
                } else {
                    ImportError::Io {
                        path: path.to_path_buf(),
                        source,
                    }
                }
            })?;
            if !metadata.is_file() {
                return Err(ImportError::FileNotFound(path.to_path_buf()));
            }
            if metadata.len() > self.config.max_import_bytes {
                return Err(ImportError::MemoryError {
                    path: path.to_path_buf(),
                    size: metadata.len(),
                    limit: self.config.max_import_bytes,
                });
            }
            read(path)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::LoadSummary;

    #[test]
    fn summary_message_counts_restored_and_failed() {
        let summary = LoadSummary {
            restored: 3,
            failed: 1,
            ..LoadSummary::default()
        };
        assert_eq!(summary.message(), "restored 3 windows, 1 failed");
    }
}
