//! Generated stand-in geometry for formats without a decoder.

use crate::model::mesh::{Material, MeshModel, Vertex};

/// Segments around the equator used when nothing is configured.
pub const DEFAULT_PLACEHOLDER_SEGMENTS: usize = 12;
/// Latitude bands used when nothing is configured.
pub const DEFAULT_PLACEHOLDER_RINGS: usize = 8;

const PLACEHOLDER_RADIUS: f64 = 0.5;

/// Builds a closed UV sphere centred on the origin.
///
/// `segments` is raised to at least 3 and `rings` to at least 2. The poles
/// are single vertices fanned with triangles; the bands between rings are
/// quads.
pub fn placeholder_sphere(segments: usize, rings: usize) -> MeshModel {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let ring_vertices = (rings - 1) * segments;
    let mut mesh = MeshModel::with_capacity(ring_vertices + 2, segments * rings);

    let top = mesh.push_vertex(Vertex::new(0.0, PLACEHOLDER_RADIUS, 0.0));
    for ring in 1..rings {
        let polar = std::f64::consts::PI * ring as f64 / rings as f64;
        for segment in 0..segments {
            let azimuth = std::f64::consts::TAU * segment as f64 / segments as f64;
            mesh.push_vertex(Vertex::new(
                PLACEHOLDER_RADIUS * polar.sin() * azimuth.cos(),
                PLACEHOLDER_RADIUS * polar.cos(),
                PLACEHOLDER_RADIUS * polar.sin() * azimuth.sin(),
            ));
        }
    }
    let bottom = mesh.push_vertex(Vertex::new(0.0, -PLACEHOLDER_RADIUS, 0.0));

    let ring_start = |ring: usize| 1 + ring * segments;
    for segment in 0..segments {
        let next = (segment + 1) % segments;
        mesh.push_face(vec![top, ring_start(0) + next, ring_start(0) + segment], None);
    }
    for ring in 0..rings - 2 {
        for segment in 0..segments {
            let next = (segment + 1) % segments;
            mesh.push_face(
                vec![
                    ring_start(ring) + segment,
                    ring_start(ring) + next,
                    ring_start(ring + 1) + next,
                    ring_start(ring + 1) + segment,
                ],
                None,
            );
        }
    }
    let last = rings - 2;
    for segment in 0..segments {
        let next = (segment + 1) % segments;
        mesh.push_face(
            vec![bottom, ring_start(last) + segment, ring_start(last) + next],
            None,
        );
    }

    mesh.attach_default_material(Material::placeholder());
    mesh
}

#[cfg(test)]
mod tests {
    use super::placeholder_sphere;

    #[test]
    fn sphere_topology_matches_resolution() {
        let mesh = placeholder_sphere(8, 4);
        assert_eq!(mesh.vertex_count(), 2 + 3 * 8);
        // Two pole fans plus two quad bands.
        assert_eq!(mesh.face_count(), 8 * 2 + 8 * 2);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn resolution_is_raised_to_minimum() {
        let mesh = placeholder_sphere(0, 0);
        assert_eq!(mesh.vertex_count(), 2 + 3);
        assert_eq!(mesh.face_count(), 6);
    }
}
