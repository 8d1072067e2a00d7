use pulto_core::{import_geometry, GeometryFormat, GeometryImportError, GeometryImporter};

fn binary_stl(triangles: &[[[f32; 3]; 3]], declared: u32) -> Vec<u8> {
    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&declared.to_le_bytes());
    for triangle in triangles {
        bytes.extend_from_slice(&[0u8; 12]);
        for vertex in triangle {
            for coord in vertex {
                bytes.extend_from_slice(&coord.to_le_bytes());
            }
        }
        bytes.extend_from_slice(&[0u8; 2]);
    }
    bytes
}

#[test]
fn obj_indices_are_rebased_to_zero() {
    let imported = import_geometry(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", "obj").unwrap();
    assert_eq!(imported.mesh.vertex_count(), 3);
    assert_eq!(imported.mesh.faces.len(), 1);
    assert_eq!(imported.mesh.faces[0].indices, vec![0, 1, 2]);
    assert!(!imported.placeholder);
}

#[test]
fn obj_relative_indices_resolve_against_current_vertices() {
    let imported = import_geometry(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n", "OBJ").unwrap();
    assert_eq!(imported.mesh.faces[0].indices, vec![0, 1, 2]);
}

#[test]
fn empty_obj_is_an_empty_mesh_not_an_error() {
    let imported = import_geometry(b"", "obj").unwrap();
    assert!(imported.mesh.is_empty());
    assert!(imported.mesh.materials.is_empty());
}

#[test]
fn obj_with_invalid_utf8_is_an_encoding_error() {
    let err = import_geometry(&[0x76, 0x20, 0xff, 0xfe], "obj").unwrap_err();
    assert!(matches!(err, GeometryImportError::InvalidEncoding(_)));
}

#[test]
fn binary_stl_decodes_every_triangle() {
    let triangles = [
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.5]],
    ];
    let imported = import_geometry(&binary_stl(&triangles, 2), "stl").unwrap();
    let mesh = imported.mesh;
    assert_eq!(mesh.vertex_count(), 6);
    assert_eq!(mesh.face_count(), 2);
    assert_eq!(mesh.faces[1].indices, vec![3, 4, 5]);
    assert_eq!(mesh.vertices[5].z, 1.5);
    assert_eq!(mesh.materials.len(), 1);
    assert_eq!(mesh.faces[0].material, Some(0));
}

#[test]
fn truncated_binary_stl_is_corrupted() {
    let one = [[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]];
    let bytes = binary_stl(&one, 10);
    assert!(bytes.len() < 84 + 10 * 50);
    let err = import_geometry(&bytes, "stl").unwrap_err();
    assert!(matches!(err, GeometryImportError::CorruptedFile(_)));
}

#[test]
fn stl_shorter_than_header_is_corrupted() {
    let err = import_geometry(&[1, 2, 3], "stl").unwrap_err();
    assert!(matches!(err, GeometryImportError::CorruptedFile(_)));
}

#[test]
fn ply_counts_drive_the_body() {
    let text = "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n";
    let imported = import_geometry(text.as_bytes(), "ply").unwrap();
    assert_eq!(imported.mesh.vertex_count(), 3);
    assert_eq!(imported.mesh.face_count(), 1);
    assert_eq!(imported.mesh.faces[0].indices, vec![0, 1, 2]);
}

#[test]
fn ply_extra_vertex_channels_are_ignored() {
    let text = "ply\nformat ascii 1.0\nelement vertex 3\nelement face 1\nend_header\n0 0 0 255 0 0\n1 0 0 0 255 0\n0 1 0 0 0 255\n3 0 1 2\n";
    let imported = import_geometry(text.as_bytes(), "ply").unwrap();
    assert_eq!(imported.mesh.vertices[1].x, 1.0);
    assert_eq!(imported.mesh.face_count(), 1);
}

#[test]
fn ply_with_max_declared_vertices_and_no_body_is_empty() {
    let text = "ply\nformat ascii 1.0\nelement vertex 18446744073709551615\nproperty float x\nproperty float y\nproperty float z\nend_header\n";
    let imported = import_geometry(text.as_bytes(), "ply").unwrap();
    assert_eq!(imported.mesh.vertex_count(), 0);
    assert_eq!(imported.mesh.face_count(), 0);
}

#[test]
fn ply_binary_body_is_unsupported() {
    let text = "ply\nformat binary_big_endian 1.0\nelement vertex 3\nend_header\n";
    let err = import_geometry(text.as_bytes(), "ply").unwrap_err();
    assert!(matches!(err, GeometryImportError::UnsupportedFormat(_)));
}

#[test]
fn flat_index_json_builds_triangle() {
    let json = br#"{"vertices":[0,0,0, 1,0,0, 0,1,0], "faces":[0,0,1,2]}"#;
    let imported = import_geometry(json, "json").unwrap();
    assert_eq!(imported.format, GeometryFormat::FlatJson);
    assert_eq!(imported.mesh.vertex_count(), 3);
    assert_eq!(imported.mesh.faces[0].indices, vec![0, 1, 2]);
}

#[test]
fn unknown_extension_is_unsupported() {
    let err = import_geometry(b"data", "blend").unwrap_err();
    assert_eq!(err, GeometryImportError::UnsupportedFormat("blend".to_string()));
}

#[test]
fn every_placeholder_format_yields_a_flagged_mesh() {
    let importer = GeometryImporter::new(6, 3);
    for format in GeometryFormat::PLACEHOLDER {
        let imported = importer.import(b"opaque", format.extension()).unwrap();
        assert!(imported.placeholder, "{format:?}");
        assert_eq!(imported.mesh.vertex_count(), 2 + 2 * 6);
        assert!(imported.mesh.validate().is_ok());
    }
}

#[test]
fn decoded_meshes_satisfy_model_invariants() {
    let inputs: [(&[u8], &str); 3] = [
        (&b"v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3 4\nf 1 2\n"[..], "obj"),
        (
            &b"ply\nformat ascii 1.0\nelement vertex 2\nelement face 1\nend_header\n0 0 0\n1 0 0\n3 0 1 5\n"[..],
            "ply",
        ),
        (
            &br#"{"vertices":[0,0,0,1,0,0,0,1,0],"faces":[1,0,1,2,9,0,0,1,2]}"#[..],
            "json",
        ),
    ];
    for (bytes, extension) in inputs {
        let imported = import_geometry(bytes, extension).unwrap();
        assert!(imported.mesh.validate().is_ok(), "{extension}");
    }
}
