//! Extension-based dispatch into the geometry decoders.
//!
//! # Responsibility
//! - Map a file extension (case-insensitive) to one decoder.
//! - Substitute a placeholder primitive for formats without a decoder.
//!
//! # Invariants
//! - The router is stateless per call; callers may import in parallel.
//! - A placeholder substitution is always flagged on [`ImportedGeometry`].

use crate::geometry::error::{GeometryImportError, GeometryResult};
use crate::geometry::flat_json::FlatIndexJsonParser;
use crate::geometry::obj::TextMeshParser;
use crate::geometry::placeholder::{
    placeholder_sphere, DEFAULT_PLACEHOLDER_RINGS, DEFAULT_PLACEHOLDER_SEGMENTS,
};
use crate::geometry::ply::TaggedListParser;
use crate::geometry::stl::BinaryTriangleParser;
use crate::geometry::MeshDecoder;
use crate::model::mesh::MeshModel;
use log::{info, warn};
use std::time::Instant;

/// Recognized geometry encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryFormat {
    Obj,
    Stl,
    Ply,
    FlatJson,
    Usdz,
    Dae,
    Fbx,
    Gltf,
    Glb,
    X3d,
}

impl GeometryFormat {
    pub const DECODED: [GeometryFormat; 4] = [
        GeometryFormat::Obj,
        GeometryFormat::Stl,
        GeometryFormat::Ply,
        GeometryFormat::FlatJson,
    ];

    pub const PLACEHOLDER: [GeometryFormat; 6] = [
        GeometryFormat::Usdz,
        GeometryFormat::Dae,
        GeometryFormat::Fbx,
        GeometryFormat::Gltf,
        GeometryFormat::Glb,
        GeometryFormat::X3d,
    ];

    /// Resolves a file extension, with or without a leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let normalized = normalize_extension(extension);
        Self::DECODED
            .into_iter()
            .chain(Self::PLACEHOLDER)
            .find(|format| format.extension() == normalized)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Obj => "obj",
            Self::Stl => "stl",
            Self::Ply => "ply",
            Self::FlatJson => "json",
            Self::Usdz => "usdz",
            Self::Dae => "dae",
            Self::Fbx => "fbx",
            Self::Gltf => "gltf",
            Self::Glb => "glb",
            Self::X3d => "x3d",
        }
    }

    /// False for formats routed to the placeholder policy.
    pub fn has_decoder(self) -> bool {
        matches!(self, Self::Obj | Self::Stl | Self::Ply | Self::FlatJson)
    }
}

/// Lowercases and strips one leading dot.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Router output: the mesh plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedGeometry {
    pub mesh: MeshModel,
    pub format: GeometryFormat,
    /// Set when `mesh` is a generated stand-in, not decoded file content.
    pub placeholder: bool,
}

/// Geometry import entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryImporter {
    placeholder_segments: usize,
    placeholder_rings: usize,
}

impl Default for GeometryImporter {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_SEGMENTS, DEFAULT_PLACEHOLDER_RINGS)
    }
}

impl GeometryImporter {
    /// Creates a router whose placeholder sphere uses the given resolution.
    pub fn new(placeholder_segments: usize, placeholder_rings: usize) -> Self {
        Self {
            placeholder_segments,
            placeholder_rings,
        }
    }

    /// Decodes `bytes` according to `extension`.
    ///
    /// # Errors
    /// - `UnsupportedFormat` for unknown extensions and for JSON that is not
    ///   a flat-index mesh document.
    /// - Whatever the selected decoder reports.
    pub fn import(&self, bytes: &[u8], extension: &str) -> GeometryResult<ImportedGeometry> {
        let started_at = Instant::now();
        let Some(format) = GeometryFormat::from_extension(extension) else {
            let normalized = normalize_extension(extension);
            warn!(
                "event=geometry_import module=geometry status=error format={} error_code=unsupported_format",
                normalized
            );
            return Err(GeometryImportError::UnsupportedFormat(normalized));
        };
        info!(
            "event=geometry_import module=geometry status=start format={} bytes={}",
            format.extension(),
            bytes.len()
        );

        let decoded = match format {
            GeometryFormat::Obj => TextMeshParser.decode(bytes),
            GeometryFormat::Stl => BinaryTriangleParser.decode(bytes),
            GeometryFormat::Ply => TaggedListParser.decode(bytes),
            GeometryFormat::FlatJson => FlatIndexJsonParser.decode(bytes),
            GeometryFormat::Usdz
            | GeometryFormat::Dae
            | GeometryFormat::Fbx
            | GeometryFormat::Gltf
            | GeometryFormat::Glb
            | GeometryFormat::X3d => {
                Ok(placeholder_sphere(self.placeholder_segments, self.placeholder_rings))
            }
        };

        match decoded {
            Ok(mesh) => {
                let placeholder = !format.has_decoder();
                info!(
                    "event=geometry_import module=geometry status=ok format={} vertices={} faces={} placeholder={} duration_ms={}",
                    format.extension(),
                    mesh.vertex_count(),
                    mesh.face_count(),
                    placeholder,
                    started_at.elapsed().as_millis()
                );
                Ok(ImportedGeometry {
                    mesh,
                    format,
                    placeholder,
                })
            }
            Err(err) => {
                warn!(
                    "event=geometry_import module=geometry status=error format={} duration_ms={} error={}",
                    format.extension(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Imports with the default placeholder resolution.
pub fn import_geometry(bytes: &[u8], extension: &str) -> GeometryResult<ImportedGeometry> {
    GeometryImporter::default().import(bytes, extension)
}

#[cfg(test)]
mod tests {
    use super::{import_geometry, normalize_extension, GeometryFormat};
    use crate::geometry::error::GeometryImportError;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(GeometryFormat::from_extension("OBJ"), Some(GeometryFormat::Obj));
        assert_eq!(GeometryFormat::from_extension(".Json"), Some(GeometryFormat::FlatJson));
        assert_eq!(GeometryFormat::from_extension("3ds"), None);
        assert_eq!(normalize_extension(" .GLB "), "glb");
    }

    #[test]
    fn placeholder_formats_are_flagged() {
        let imported = import_geometry(b"\x00\x01opaque", "usdz").expect("placeholder");
        assert!(imported.placeholder);
        assert!(!imported.mesh.is_empty());
        assert_eq!(imported.format, GeometryFormat::Usdz);
    }

    #[test]
    fn unknown_extension_reports_normalized_name() {
        assert_eq!(
            import_geometry(b"", ".XYZ"),
            Err(GeometryImportError::UnsupportedFormat("xyz".to_string()))
        );
    }

    #[test]
    fn unrelated_json_is_unsupported() {
        assert_eq!(
            import_geometry(br#"{"name": "not a mesh"}"#, "json"),
            Err(GeometryImportError::UnsupportedFormat("json".to_string()))
        );
        assert!(matches!(
            import_geometry(b"{ nope", "json"),
            Err(GeometryImportError::CorruptedFile(_))
        ));
    }
}
