//! Canonical mesh model shared by every geometry decoder.
//!
//! # Responsibility
//! - Hold decoded geometry as ordered vertices, faces and materials.
//! - Enforce face invariants at insertion time so decoders cannot store
//!   degenerate or dangling faces.
//!
//! # Invariants
//! - Every stored face has at least 3 vertex indices.
//! - Every face index is in `[0, vertices.len())`.
//! - `Face::material` is `None` or a valid index into `materials`.
//! - Material scalars are clamped to `[0, 1]`.

use crate::model::json_float;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of vertex indices for a storable face.
pub const MIN_FACE_ARITY: usize = 3;

/// One 3D point in double precision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(with = "json_float::scalar")]
    pub x: f64,
    #[serde(with = "json_float::scalar")]
    pub y: f64,
    #[serde(with = "json_float::scalar")]
    pub z: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Linear RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl MaterialColor {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: clamp_unit(r),
            g: clamp_unit(g),
            b: clamp_unit(b),
        }
    }

    /// Uniform gray with the given intensity.
    pub fn gray(level: f64) -> Self {
        Self::new(level, level, level)
    }
}

/// Surface hints carried through to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub color: MaterialColor,
    pub metallic: f64,
    pub roughness: f64,
    pub transparency: f64,
}

impl Material {
    /// Creates a material, clamping every scalar into `[0, 1]`.
    pub fn new(
        name: impl Into<String>,
        color: MaterialColor,
        metallic: f64,
        roughness: f64,
        transparency: f64,
    ) -> Self {
        Self {
            name: name.into(),
            color,
            metallic: clamp_unit(metallic),
            roughness: clamp_unit(roughness),
            transparency: clamp_unit(transparency),
        }
    }

    /// Flat gray, used for text-based polygon meshes.
    pub fn flat_gray() -> Self {
        Self::new("default_gray", MaterialColor::gray(0.7), 0.0, 0.5, 0.0)
    }

    /// Brushed metal, used for triangle-soup meshes.
    pub fn default_metallic() -> Self {
        Self::new(
            "default_metallic",
            MaterialColor::new(0.75, 0.75, 0.8),
            0.8,
            0.3,
            0.0,
        )
    }

    /// White with full roughness; stands in for an unlit surface.
    pub fn unlit() -> Self {
        Self::new("default_unlit", MaterialColor::gray(1.0), 0.0, 1.0, 0.0)
    }

    /// Neutral fallback for index-based JSON meshes.
    pub fn default_surface() -> Self {
        Self::new("default", MaterialColor::gray(0.6), 0.1, 0.6, 0.0)
    }

    /// Translucent highlight used by placeholder primitives.
    pub fn placeholder() -> Self {
        Self::new(
            "placeholder",
            MaterialColor::new(0.35, 0.55, 0.95),
            0.0,
            0.4,
            0.3,
        )
    }
}

/// One polygon: ordered vertex indices plus an optional material index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub indices: Vec<usize>,
    /// `None` means "no material".
    pub material: Option<usize>,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vertex,
    pub max: Vertex,
}

impl Bounds {
    pub fn size(&self) -> Vertex {
        Vertex::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }
}

/// Invariant violations detected by [`MeshModel::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshValidationError {
    #[error("face {face} has {arity} indices; at least 3 required")]
    DegenerateFace { face: usize, arity: usize },
    #[error("face {face} references vertex {index} but mesh has {vertex_count} vertices")]
    VertexIndexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },
    #[error("face {face} references material {material} but mesh has {material_count} materials")]
    MaterialIndexOutOfRange {
        face: usize,
        material: usize,
        material_count: usize,
    },
}

/// Decoded geometry: vertices, faces and materials.
///
/// Built once per successful decode and not mutated afterwards; a re-import
/// produces a new model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshModel {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    pub materials: Vec<Material>,
}

impl MeshModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
            materials: Vec::new(),
        }
    }

    /// Appends one vertex and returns its index.
    pub fn push_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// Appends a face when it satisfies the arity and index invariants.
    ///
    /// Returns `false` and stores nothing for degenerate faces or faces that
    /// reference vertices not yet present.
    pub fn push_face(&mut self, indices: Vec<usize>, material: Option<usize>) -> bool {
        if indices.len() < MIN_FACE_ARITY {
            return false;
        }
        let vertex_count = self.vertices.len();
        if indices.iter().any(|&index| index >= vertex_count) {
            return false;
        }
        self.faces.push(Face { indices, material });
        true
    }

    /// Appends a material and returns its index.
    pub fn push_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Attaches `material` as the single shared material of every face.
    ///
    /// Faces without a material are pointed at the new entry.
    pub fn attach_default_material(&mut self, material: Material) {
        let index = self.push_material(material);
        for face in &mut self.faces {
            if face.material.is_none() {
                face.material = Some(index);
            }
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of triangles after fan triangulation of every face.
    pub fn triangle_count(&self) -> usize {
        self.faces
            .iter()
            .map(|face| face.indices.len().saturating_sub(2))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the axis-aligned bounds, or `None` for an empty model.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for vertex in &self.vertices[1..] {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);
            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }
        Some(Bounds { min, max })
    }

    /// Checks every face invariant.
    ///
    /// Models built through `push_face` always pass; models deserialized from
    /// untrusted documents may not.
    pub fn validate(&self) -> Result<(), MeshValidationError> {
        let vertex_count = self.vertices.len();
        let material_count = self.materials.len();
        for (face_index, face) in self.faces.iter().enumerate() {
            if face.indices.len() < MIN_FACE_ARITY {
                return Err(MeshValidationError::DegenerateFace {
                    face: face_index,
                    arity: face.indices.len(),
                });
            }
            if let Some(&index) = face.indices.iter().find(|&&index| index >= vertex_count) {
                return Err(MeshValidationError::VertexIndexOutOfRange {
                    face: face_index,
                    index,
                    vertex_count,
                });
            }
            if let Some(material) = face.material {
                if material >= material_count {
                    return Err(MeshValidationError::MaterialIndexOutOfRange {
                        face: face_index,
                        material,
                        material_count,
                    });
                }
            }
        }
        Ok(())
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
