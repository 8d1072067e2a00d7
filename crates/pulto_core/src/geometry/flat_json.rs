//! Flat-index JSON mesh decoder.
//!
//! Layout: `vertices` is a flat number array read in groups of three;
//! `faces` is a flat integer array of `tag, i0, i1, i2[, i3]` groups where
//! tag `0` is a triangle and tag `1` is a quad. Any other tag value is
//! skipped on its own.

use crate::geometry::error::{GeometryImportError, GeometryResult};
use crate::geometry::MeshDecoder;
use crate::model::mesh::{Material, MeshModel, Vertex};
use log::debug;
use serde_json::Value;

const TRIANGLE_TAG: u64 = 0;
const QUAD_TAG: u64 = 1;

/// Decoder for structured flat-index documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatIndexJsonParser;

impl MeshDecoder for FlatIndexJsonParser {
    fn decode(&self, bytes: &[u8]) -> GeometryResult<MeshModel> {
        let document: Value = serde_json::from_slice(bytes)
            .map_err(|err| GeometryImportError::CorruptedFile(format!("invalid JSON: {err}")))?;
        if !is_flat_index_document(&document) {
            return Err(GeometryImportError::UnsupportedFormat("json".to_string()));
        }
        Ok(parse_flat_index(&document))
    }
}

/// True when `vertices` is present and is an array of numbers.
pub fn is_flat_index_document(document: &Value) -> bool {
    document
        .get("vertices")
        .and_then(Value::as_array)
        .is_some_and(|values| values.iter().all(Value::is_number))
}

/// Decodes a flat-index document. Callers check the shape first with
/// [`is_flat_index_document`]; anything unreadable is skipped.
pub fn parse_flat_index(document: &Value) -> MeshModel {
    let coords: Vec<f64> = document
        .get("vertices")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();
    let stream: &[Value] = document
        .get("faces")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut mesh = MeshModel::with_capacity(coords.len() / 3, stream.len() / 4);
    for chunk in coords.chunks_exact(3) {
        mesh.push_vertex(Vertex::new(chunk[0], chunk[1], chunk[2]));
    }

    let mut cursor = 0usize;
    while cursor < stream.len() {
        let arity = match stream[cursor].as_u64() {
            Some(TRIANGLE_TAG) => 3,
            Some(QUAD_TAG) => 4,
            _ => {
                cursor += 1;
                continue;
            }
        };
        let Some(group) = stream.get(cursor + 1..cursor + 1 + arity) else {
            break;
        };
        let indices = group
            .iter()
            .map(|value| value.as_u64().and_then(|index| usize::try_from(index).ok()))
            .collect::<Option<Vec<_>>>();
        if let Some(indices) = indices {
            mesh.push_face(indices, None);
        }
        cursor += 1 + arity;
    }

    mesh.attach_default_material(Material::default_surface());
    debug!(
        "event=flat_json_parse module=geometry status=ok vertices={} faces={}",
        mesh.vertex_count(),
        mesh.face_count()
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::{is_flat_index_document, parse_flat_index};
    use serde_json::json;

    #[test]
    fn triangle_and_quad_groups_are_decoded() {
        let document = json!({
            "vertices": [0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0],
            "faces": [0, 0, 1, 2, 1, 0, 1, 2, 3]
        });
        let mesh = parse_flat_index(&document);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.faces[1].indices, vec![0, 1, 2, 3]);
        assert_eq!(mesh.materials[0].name, "default");
    }

    #[test]
    fn unknown_tags_advance_by_one() {
        let document = json!({
            "vertices": [0, 0, 0, 1, 0, 0, 0, 1, 0],
            "faces": [7, 0, 0, 1, 2]
        });
        let mesh = parse_flat_index(&document);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.faces[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn truncated_trailing_group_is_ignored() {
        let document = json!({ "vertices": [0, 0, 0, 1, 0, 0, 0, 1, 0], "faces": [0, 0, 1] });
        assert_eq!(parse_flat_index(&document).face_count(), 0);
    }

    #[test]
    fn shape_check_requires_numeric_vertices() {
        assert!(is_flat_index_document(&json!({ "vertices": [1.5, 2] })));
        assert!(!is_flat_index_document(&json!({ "vertices": ["a"] })));
        assert!(!is_flat_index_document(&json!({ "verts": [1] })));
    }
}
