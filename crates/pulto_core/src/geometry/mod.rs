//! Multi-format geometry import.
//!
//! # Responsibility
//! - Decode external geometry encodings into one canonical [`MeshModel`].
//! - Route by extension through [`GeometryImporter`], the only entry point
//!   callers are expected to use.
//!
//! # Invariants
//! - Decoders are pure: no shared state, safe to run in parallel.
//! - Faces with fewer than three or out-of-range indices are never stored.

use crate::model::mesh::MeshModel;

pub mod error;
pub mod flat_json;
pub mod obj;
pub mod placeholder;
pub mod ply;
pub mod router;
pub mod stl;

pub use error::{GeometryImportError, GeometryResult};
pub use router::{import_geometry, GeometryFormat, GeometryImporter, ImportedGeometry};

/// One geometry encoding family.
pub trait MeshDecoder {
    /// Decodes raw file bytes into a mesh.
    fn decode(&self, bytes: &[u8]) -> GeometryResult<MeshModel>;
}
