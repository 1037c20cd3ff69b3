//! Binary STL encoding and decoding
//!
//! Layout: 80-byte header (never beginning with the ASCII token `solid`,
//! which would make readers treat the file as ASCII STL), a little-endian
//! u32 triangle count, then 50 bytes per triangle (normal, three vertices,
//! zero attribute count). Encoding is fully buffered; the caller decides
//! where the bytes go.

use std::io::Cursor;

use glam::DVec3;

use crate::error::{CadError, CadResult};
use crate::mesh::TriangleMesh;

/// Encode a mesh as binary STL bytes.
///
/// Normals are recomputed from face winding; degenerate triangles get a
/// zero normal.
pub fn encode(mesh: &TriangleMesh) -> CadResult<Vec<u8>> {
    let mut triangles = Vec::with_capacity(mesh.triangle_count());
    for (i, face) in mesh.faces.iter().enumerate() {
        let normal = mesh.face_normal(i);
        let vertex = |k: usize| {
            let v = mesh.vertices[face[k] as usize];
            stl_io::Vertex::new([v.x as f32, v.y as f32, v.z as f32])
        };
        triangles.push(stl_io::Triangle {
            normal: stl_io::Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
            vertices: [vertex(0), vertex(1), vertex(2)],
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    stl_io::write_stl(&mut buffer, triangles.iter())
        .map_err(|e| CadError::ExportFailure(format!("STL write: {}", e)))?;
    let bytes = buffer.into_inner();

    if bytes.get(..5) == Some(b"solid".as_ref()) {
        return Err(CadError::ExportFailure(
            "binary STL header would be misread as ASCII".into(),
        ));
    }

    Ok(bytes)
}

/// Decode binary STL bytes back into a triangle mesh
pub fn decode(bytes: &[u8]) -> CadResult<TriangleMesh> {
    let mut reader = Cursor::new(bytes);
    let indexed = stl_io::read_stl(&mut reader)
        .map_err(|e| CadError::InvalidMesh(format!("STL read: {}", e)))?;

    let vertices = indexed
        .vertices
        .iter()
        .map(|v| DVec3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();
    let faces = indexed
        .faces
        .iter()
        .map(|f| {
            [
                f.vertices[0] as u32,
                f.vertices[1] as u32,
                f.vertices[2] as u32,
            ]
        })
        .collect();

    Ok(TriangleMesh::from_parts(vertices, faces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::part::Part;

    #[test]
    fn test_encode_byte_layout() {
        let mut doc = Document::new("doc");
        doc.add_part(Part::boxed(2.0, 2.0, 2.0).unwrap());
        let bytes = doc.export("STL").unwrap();

        // 84 header bytes plus 50 per triangle
        assert_eq!(bytes.len(), 84 + 50 * 12);
        let count = u32::from_le_bytes(bytes[80..84].try_into().unwrap());
        assert_eq!(count, 12);
    }

    #[test]
    fn test_header_is_not_ascii_solid() {
        let bytes = encode(Part::boxed(1.0, 1.0, 1.0).unwrap().mesh()).unwrap();
        assert_ne!(&bytes[..5], b"solid");
    }

    #[test]
    fn test_round_trip_preserves_triangles() {
        let mesh = Part::cylinder(1.0, 2.0).unwrap().mesh().clone();
        let bytes = encode(&mesh).unwrap();
        assert_eq!(bytes.len(), 84 + 50 * mesh.triangle_count());

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.triangle_count(), mesh.triangle_count());

        // Compare triangle corner positions in order (vertex indexing may
        // differ after the reader's deduplication)
        for (fa, fb) in mesh.faces.iter().zip(decoded.faces.iter()) {
            for k in 0..3 {
                let a = mesh.vertices[fa[k] as usize];
                let b = decoded.vertices[fb[k] as usize];
                assert!((a - b).length() < 1e-6, "triangle corner drifted");
            }
        }
    }

    #[test]
    fn test_empty_mesh_encodes_header_only() {
        let bytes = encode(&TriangleMesh::new()).unwrap();
        assert_eq!(bytes.len(), 84);
        let count = u32::from_le_bytes(bytes[80..84].try_into().unwrap());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_document_export_combines_parts() {
        let mut doc = Document::new("doc");
        doc.add_part(Part::boxed(1.0, 1.0, 1.0).unwrap());
        doc.add_part(Part::boxed(1.0, 1.0, 1.0).unwrap().translate(3.0, 0.0, 0.0));
        let bytes = doc.export("STL").unwrap();
        assert_eq!(bytes.len(), 84 + 50 * 24);
    }
}
