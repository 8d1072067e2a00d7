//! ASCII-or-binary triangle soup decoder (`.stl`).
//!
//! # Invariants
//! - A stream starting with `solid` is read as ASCII, unless it yields no
//!   facets and its length matches the binary layout exactly.
//! - The binary path is all-or-nothing: a buffer shorter than
//!   `84 + count * 50` bytes fails before any geometry is produced.
//! - Vertices are not deduplicated; each facet appends three new vertices.

use crate::geometry::error::{GeometryImportError, GeometryResult};
use crate::geometry::MeshDecoder;
use crate::model::mesh::{Material, MeshModel, Vertex};
use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use std::io::{Cursor, Read};

const ASCII_MARKER: &[u8] = b"solid";
const HEADER_LEN: usize = 80;
const PREAMBLE_LEN: usize = HEADER_LEN + 4;
const TRIANGLE_RECORD_LEN: usize = 50;

/// Decoder for triangle-soup files in either encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryTriangleParser;

impl MeshDecoder for BinaryTriangleParser {
    fn decode(&self, bytes: &[u8]) -> GeometryResult<MeshModel> {
        parse_stl(bytes)
    }
}

/// Parses STL bytes, detecting the encoding from the leading marker.
pub fn parse_stl(bytes: &[u8]) -> GeometryResult<MeshModel> {
    let mut mesh = if bytes.starts_with(ASCII_MARKER) {
        let text = String::from_utf8_lossy(bytes);
        let ascii = parse_ascii(&text);
        if ascii.face_count() == 0 && matches_binary_layout(bytes) {
            debug!("event=stl_parse module=geometry status=fallback encoding=binary");
            parse_binary(bytes)?
        } else {
            ascii
        }
    } else {
        parse_binary(bytes)?
    };

    mesh.attach_default_material(Material::default_metallic());
    debug!(
        "event=stl_parse module=geometry status=ok vertices={} faces={}",
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(mesh)
}

fn parse_ascii(text: &str) -> MeshModel {
    let mut mesh = MeshModel::new();
    let mut pending: Vec<Vertex> = Vec::with_capacity(3);
    let mut in_facet = false;

    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("facet") => {
                in_facet = true;
                pending.clear();
            }
            Some("vertex") if in_facet => {
                let coords = tokens
                    .take(3)
                    .map(|token| token.parse::<f64>().ok())
                    .collect::<Option<Vec<_>>>();
                if let Some([x, y, z]) = coords.as_deref() {
                    pending.push(Vertex::new(*x, *y, *z));
                }
            }
            Some("endfacet") => {
                if pending.len() == 3 {
                    let base = mesh.vertex_count();
                    for vertex in pending.drain(..) {
                        mesh.push_vertex(vertex);
                    }
                    mesh.push_face(vec![base, base + 1, base + 2], None);
                }
                pending.clear();
                in_facet = false;
            }
            _ => {}
        }
    }

    mesh
}

fn declared_triangle_count(bytes: &[u8]) -> Option<u32> {
    let count = bytes.get(HEADER_LEN..PREAMBLE_LEN)?;
    Some(u32::from_le_bytes([count[0], count[1], count[2], count[3]]))
}

fn required_len(count: u32) -> u64 {
    PREAMBLE_LEN as u64 + u64::from(count) * TRIANGLE_RECORD_LEN as u64
}

fn matches_binary_layout(bytes: &[u8]) -> bool {
    declared_triangle_count(bytes).is_some_and(|count| required_len(count) == bytes.len() as u64)
}

fn parse_binary(bytes: &[u8]) -> GeometryResult<MeshModel> {
    let count = declared_triangle_count(bytes).ok_or_else(|| {
        GeometryImportError::CorruptedFile(format!(
            "binary STL needs at least {PREAMBLE_LEN} bytes, got {}",
            bytes.len()
        ))
    })?;
    let required = required_len(count);
    if (bytes.len() as u64) < required {
        return Err(GeometryImportError::CorruptedFile(format!(
            "binary STL declares {count} triangles ({required} bytes) but has {} bytes",
            bytes.len()
        )));
    }

    let triangles = count as usize;
    let mut mesh = MeshModel::with_capacity(triangles * 3, triangles);
    let mut reader = Cursor::new(&bytes[PREAMBLE_LEN..]);
    for _ in 0..triangles {
        read_triangle(&mut reader, &mut mesh).map_err(|err| {
            GeometryImportError::CorruptedFile(format!("truncated triangle record: {err}"))
        })?;
    }
    Ok(mesh)
}

fn read_triangle(reader: &mut impl Read, mesh: &mut MeshModel) -> std::io::Result<()> {
    let mut normal = [0u8; 12];
    reader.read_exact(&mut normal)?;

    let base = mesh.vertex_count();
    for _ in 0..3 {
        let x = reader.read_f32::<LittleEndian>()?;
        let y = reader.read_f32::<LittleEndian>()?;
        let z = reader.read_f32::<LittleEndian>()?;
        mesh.push_vertex(Vertex::new(f64::from(x), f64::from(y), f64::from(z)));
    }
    reader.read_u16::<LittleEndian>()?;

    mesh.push_face(vec![base, base + 1, base + 2], None);
    Ok(())
}
