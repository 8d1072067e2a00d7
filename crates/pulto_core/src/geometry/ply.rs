//! Header-plus-list text decoder (`.ply`, ASCII only).
//!
//! # Invariants
//! - The header declares `element vertex N` and `element face M`; the body
//!   is read as N vertex lines followed by M face lines.
//! - Every body line consumes one slot, even when it fails to parse.
//! - Face indices are 0-based in the source and stored as-is.
//! - Binary encodings are rejected before the body is read.

use crate::geometry::error::{GeometryImportError, GeometryResult};
use crate::geometry::MeshDecoder;
use crate::model::mesh::{Material, MeshModel, Vertex};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static ELEMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^element\s+(\w+)\s+(\d+)\s*$").expect("valid element regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Header,
    Body,
}

/// Decoder for ASCII tagged-list files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedListParser;

impl MeshDecoder for TaggedListParser {
    fn decode(&self, bytes: &[u8]) -> GeometryResult<MeshModel> {
        let text = std::str::from_utf8(bytes)
            .map_err(|err| GeometryImportError::InvalidEncoding(err.to_string()))?;
        parse_ply(text)
    }
}

/// Parses ASCII PLY text.
pub fn parse_ply(text: &str) -> GeometryResult<MeshModel> {
    let mut state = ParseState::Header;
    let mut expected_vertices = 0usize;
    let mut expected_faces = 0usize;
    let mut vertex_slots = 0usize;
    let mut face_slots = 0usize;
    // Declared counts are untrusted; storage grows with the lines actually read.
    let mut mesh = MeshModel::new();

    for line in text.lines() {
        let line = line.trim();
        match state {
            ParseState::Header => {
                if line == "end_header" {
                    state = ParseState::Body;
                } else if let Some(encoding) = line.strip_prefix("format ") {
                    if !encoding.trim_start().starts_with("ascii") {
                        return Err(GeometryImportError::UnsupportedFormat(format!(
                            "ply {}",
                            encoding.split_whitespace().next().unwrap_or("unknown")
                        )));
                    }
                } else if let Some(captures) = ELEMENT_RE.captures(line) {
                    let count = captures[2].parse::<usize>().unwrap_or(0);
                    match &captures[1] {
                        "vertex" => expected_vertices = count,
                        "face" => expected_faces = count,
                        _ => {}
                    }
                }
            }
            ParseState::Body => {
                if vertex_slots < expected_vertices {
                    vertex_slots += 1;
                    if let Some(vertex) = parse_vertex_line(line) {
                        mesh.push_vertex(vertex);
                    }
                } else if face_slots < expected_faces {
                    face_slots += 1;
                    if let Some(indices) = parse_face_line(line) {
                        mesh.push_face(indices, None);
                    }
                } else {
                    break;
                }
            }
        }
    }

    if state == ParseState::Header {
        return Err(GeometryImportError::CorruptedFile(
            "ply header is missing `end_header`".to_string(),
        ));
    }

    mesh.attach_default_material(Material::unlit());
    debug!(
        "event=ply_parse module=geometry status=ok declared_vertices={} declared_faces={} vertices={} faces={}",
        expected_vertices,
        expected_faces,
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(mesh)
}

fn parse_vertex_line(line: &str) -> Option<Vertex> {
    let mut tokens = line.split_whitespace().map(|token| token.parse::<f64>().ok());
    let x = tokens.next()??;
    let y = tokens.next()??;
    let z = tokens.next()??;
    Some(Vertex::new(x, y, z))
}

fn parse_face_line(line: &str) -> Option<Vec<usize>> {
    let mut tokens = line.split_whitespace();
    let arity = tokens.next()?.parse::<usize>().ok()?;
    let indices = tokens
        .take(arity)
        .map(|token| token.parse::<usize>().ok())
        .collect::<Option<Vec<_>>>()?;
    (indices.len() == arity).then_some(indices)
}
