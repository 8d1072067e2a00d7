//! Line-oriented vertex/face text decoder (`.obj`).
//!
//! # Invariants
//! - Vertex order follows file order.
//! - Source face indices are 1-based; negative indices count back from the
//!   most recent vertex. Stored indices are 0-based.
//! - Unknown line prefixes are ignored; nothing in the text is fatal.

use crate::geometry::error::{GeometryImportError, GeometryResult};
use crate::geometry::MeshDecoder;
use crate::model::mesh::{Material, MeshModel, Vertex};
use log::debug;

/// Decoder for `v` / `f` polygon text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMeshParser;

impl MeshDecoder for TextMeshParser {
    fn decode(&self, bytes: &[u8]) -> GeometryResult<MeshModel> {
        let text = std::str::from_utf8(bytes)
            .map_err(|err| GeometryImportError::InvalidEncoding(err.to_string()))?;
        Ok(parse_obj(text))
    }
}

/// Parses polygon text into a mesh. An empty input yields an empty mesh.
pub fn parse_obj(text: &str) -> MeshModel {
    let mut mesh = MeshModel::new();
    let mut dropped_faces = 0usize;

    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                if let Some(vertex) = parse_vertex(tokens) {
                    mesh.push_vertex(vertex);
                }
            }
            Some("f") => {
                let indices = tokens
                    .map(|token| resolve_index(token, mesh.vertex_count()))
                    .collect::<Option<Vec<_>>>();
                let stored = match indices {
                    Some(indices) => mesh.push_face(indices, None),
                    None => false,
                };
                if !stored {
                    dropped_faces += 1;
                }
            }
            _ => {}
        }
    }

    if mesh.face_count() > 0 {
        mesh.attach_default_material(Material::flat_gray());
    }

    debug!(
        "event=obj_parse module=geometry status=ok vertices={} faces={} dropped_faces={}",
        mesh.vertex_count(),
        mesh.face_count(),
        dropped_faces
    );
    mesh
}

fn parse_vertex<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Option<Vertex> {
    let x = tokens.next()?.parse::<f64>().ok()?;
    let y = tokens.next()?.parse::<f64>().ok()?;
    let z = tokens.next()?.parse::<f64>().ok()?;
    Some(Vertex::new(x, y, z))
}

/// Resolves one `v/vt/vn` token to a 0-based vertex index.
fn resolve_index(token: &str, vertex_count: usize) -> Option<usize> {
    let raw = token.split('/').next()?.parse::<i64>().ok()?;
    match raw {
        0 => None,
        positive if positive > 0 => usize::try_from(positive - 1).ok(),
        negative => {
            let back = usize::try_from(negative.unsigned_abs()).ok()?;
            vertex_count.checked_sub(back)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_obj, resolve_index};

    #[test]
    fn slash_tokens_use_only_vertex_segment() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/4/7 2//8 3/6\n");
        assert_eq!(mesh.faces.len(), 1);
        assert_eq!(mesh.faces[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn negative_indices_count_back_from_last_vertex() {
        assert_eq!(resolve_index("-1", 3), Some(2));
        assert_eq!(resolve_index("-3", 3), Some(0));
        assert_eq!(resolve_index("-4", 3), None);
        assert_eq!(resolve_index("0", 3), None);
    }

    #[test]
    fn unknown_prefixes_and_short_lines_are_ignored() {
        let text = "# comment\no cube\nvn 0 0 1\nvt 0 1\nv 1 2\nusemtl red\nv 1 2 3\n";
        let mesh = parse_obj(text);
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.face_count(), 0);
        assert!(mesh.materials.is_empty());
    }

    #[test]
    fn degenerate_and_dangling_faces_are_dropped() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2\nf 1 2 9\nf 1 2 x\nf 1 2 3\n");
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.materials.len(), 1);
        assert_eq!(mesh.faces[0].material, Some(0));
    }
}
