//! Primitive solid tessellation
//!
//! Generates watertight indexed triangle meshes for the basic solids:
//! - Box (axis-aligned, centered at origin)
//! - Cylinder (axis along +Z, centered at origin, with end caps)
//! - Sphere (UV sphere, shared poles and rings)
//!
//! All faces wind counter-clockwise seen from outside.

use std::f64::consts::TAU;

use glam::DVec3;

use crate::error::{CadError, CadResult};
use crate::mesh::TriangleMesh;

fn check_dimension(name: &'static str, value: f64) -> CadResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CadError::InvalidDimension { name, value });
    }
    Ok(())
}

/// Tessellate a box of dimensions (width, height, depth).
///
/// 8 vertices at `(±w/2, ±h/2, ±d/2)`, 12 triangles, two per face.
pub fn box_mesh(width: f64, height: f64, depth: f64) -> CadResult<TriangleMesh> {
    check_dimension("width", width)?;
    check_dimension("height", height)?;
    check_dimension("depth", depth)?;

    let hw = width / 2.0;
    let hh = height / 2.0;
    let hd = depth / 2.0;

    let vertices = vec![
        DVec3::new(-hw, -hh, -hd),
        DVec3::new(hw, -hh, -hd),
        DVec3::new(hw, hh, -hd),
        DVec3::new(-hw, hh, -hd),
        DVec3::new(-hw, -hh, hd),
        DVec3::new(hw, -hh, hd),
        DVec3::new(hw, hh, hd),
        DVec3::new(-hw, hh, hd),
    ];

    let faces = vec![
        // -Z
        [0, 2, 1],
        [0, 3, 2],
        // +Z
        [4, 5, 6],
        [4, 6, 7],
        // -Y
        [0, 1, 5],
        [0, 5, 4],
        // +Y
        [2, 3, 7],
        [2, 7, 6],
        // -X
        [0, 4, 7],
        [0, 7, 3],
        // +X
        [1, 2, 6],
        [1, 6, 5],
    ];

    Ok(TriangleMesh::from_parts(vertices, faces))
}

/// Tessellate a cylinder along +Z with `segments` circular resolution.
///
/// `2·segments` side vertices plus one cap center per end; `2·segments`
/// side triangles (quads split along the lower-left diagonal) and
/// `segments` fan triangles per cap.
pub fn cylinder_mesh(radius: f64, height: f64, segments: u32) -> CadResult<TriangleMesh> {
    check_dimension("radius", radius)?;
    check_dimension("height", height)?;
    if segments < 3 {
        return Err(CadError::InvalidDimension {
            name: "segments",
            value: segments as f64,
        });
    }

    let half = height / 2.0;
    let n = segments as usize;

    let mut vertices = Vec::with_capacity(2 * n + 2);
    for i in 0..n {
        let theta = (i as f64 / n as f64) * TAU;
        let (sin, cos) = theta.sin_cos();
        let x = radius * cos;
        let y = radius * sin;
        vertices.push(DVec3::new(x, y, -half));
        vertices.push(DVec3::new(x, y, half));
    }
    let bottom_center = vertices.len() as u32;
    vertices.push(DVec3::new(0.0, 0.0, -half));
    let top_center = vertices.len() as u32;
    vertices.push(DVec3::new(0.0, 0.0, half));

    let mut faces = Vec::with_capacity(4 * n);
    for i in 0..n {
        let b0 = (2 * i) as u32;
        let t0 = b0 + 1;
        let b1 = (2 * ((i + 1) % n)) as u32;
        let t1 = b1 + 1;
        // Side quad, split from the lower-left corner
        faces.push([b0, b1, t0]);
        faces.push([t0, b1, t1]);
    }
    for i in 0..n {
        let b0 = (2 * i) as u32;
        let b1 = (2 * ((i + 1) % n)) as u32;
        // Bottom cap faces -Z
        faces.push([bottom_center, b1, b0]);
    }
    for i in 0..n {
        let t0 = (2 * i) as u32 + 1;
        let t1 = (2 * ((i + 1) % n)) as u32 + 1;
        // Top cap faces +Z
        faces.push([top_center, t0, t1]);
    }

    Ok(TriangleMesh::from_parts(vertices, faces))
}

/// Tessellate a UV sphere with `rings` latitude bands and `segments`
/// longitude steps. Poles are single shared vertices, so the mesh is
/// watertight: `(rings-1)·segments + 2` vertices, `2·segments·(rings-1)`
/// triangles.
pub fn sphere_mesh(radius: f64, rings: u32, segments: u32) -> CadResult<TriangleMesh> {
    check_dimension("radius", radius)?;
    if rings < 2 {
        return Err(CadError::InvalidDimension {
            name: "rings",
            value: rings as f64,
        });
    }
    if segments < 3 {
        return Err(CadError::InvalidDimension {
            name: "segments",
            value: segments as f64,
        });
    }

    let rings = rings as usize;
    let segs = segments as usize;

    let mut vertices = Vec::with_capacity((rings - 1) * segs + 2);
    let north = 0u32;
    vertices.push(DVec3::new(0.0, 0.0, radius));
    for ring in 1..rings {
        let theta = (ring as f64 / rings as f64) * std::f64::consts::PI;
        let (sin_t, cos_t) = theta.sin_cos();
        for seg in 0..segs {
            let phi = (seg as f64 / segs as f64) * TAU;
            let (sin_p, cos_p) = phi.sin_cos();
            vertices.push(DVec3::new(
                radius * sin_t * cos_p,
                radius * sin_t * sin_p,
                radius * cos_t,
            ));
        }
    }
    let south = vertices.len() as u32;
    vertices.push(DVec3::new(0.0, 0.0, -radius));

    // Ring `r` (1-based) starts at vertex 1 + (r-1)*segs
    let ring_start = |r: usize| (1 + (r - 1) * segs) as u32;

    let mut faces = Vec::with_capacity(2 * segs * (rings - 1));
    // North cap
    for seg in 0..segs {
        let a = ring_start(1) + seg as u32;
        let b = ring_start(1) + ((seg + 1) % segs) as u32;
        faces.push([north, a, b]);
    }
    // Quads between adjacent rings
    for ring in 1..rings - 1 {
        for seg in 0..segs {
            let a = ring_start(ring) + seg as u32;
            let b = ring_start(ring) + ((seg + 1) % segs) as u32;
            let c = ring_start(ring + 1) + seg as u32;
            let d = ring_start(ring + 1) + ((seg + 1) % segs) as u32;
            faces.push([a, c, d]);
            faces.push([a, d, b]);
        }
    }
    // South cap
    for seg in 0..segs {
        let a = ring_start(rings - 1) + seg as u32;
        let b = ring_start(rings - 1) + ((seg + 1) % segs) as u32;
        faces.push([south, b, a]);
    }

    Ok(TriangleMesh::from_parts(vertices, faces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CYLINDER_SEGMENTS, SPHERE_RINGS, SPHERE_SEGMENTS};

    #[test]
    fn test_box_counts() {
        let mesh = box_mesh(1.0, 1.0, 1.0).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_box_normals_point_outward() {
        let mesh = box_mesh(2.0, 3.0, 4.0).unwrap();
        for i in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.faces[i];
            let centroid = (mesh.vertices[a as usize]
                + mesh.vertices[b as usize]
                + mesh.vertices[c as usize])
                / 3.0;
            let normal = mesh.face_normal(i);
            assert!(
                centroid.dot(normal) > 0.0,
                "face {} normal points inward",
                i
            );
        }
    }

    #[test]
    fn test_box_rejects_bad_dimensions() {
        assert!(matches!(
            box_mesh(0.0, 1.0, 1.0),
            Err(CadError::InvalidDimension { name: "width", .. })
        ));
        assert!(box_mesh(1.0, -2.0, 1.0).is_err());
        assert!(box_mesh(1.0, 1.0, f64::NAN).is_err());
        assert!(box_mesh(1.0, f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_cylinder_counts() {
        let n = CYLINDER_SEGMENTS;
        let mesh = cylinder_mesh(1.0, 2.0, n).unwrap();
        assert_eq!(mesh.vertex_count(), (2 * n + 2) as usize);
        assert_eq!(mesh.triangle_count(), (4 * n) as usize);
        assert!(mesh.is_closed_manifold());
    }

    #[test]
    fn test_cylinder_normals_point_outward() {
        let mesh = cylinder_mesh(1.0, 2.0, 16).unwrap();
        for i in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.faces[i];
            let centroid = (mesh.vertices[a as usize]
                + mesh.vertices[b as usize]
                + mesh.vertices[c as usize])
                / 3.0;
            assert!(centroid.dot(mesh.face_normal(i)) > 0.0, "face {}", i);
        }
    }

    #[test]
    fn test_cylinder_volume_approaches_analytic() {
        let mesh = cylinder_mesh(1.0, 2.0, 256).unwrap();
        let analytic = std::f64::consts::PI * 2.0;
        // Inscribed polygon underestimates; 256 segments is within 0.1%
        assert!((mesh.volume() - analytic).abs() / analytic < 1e-3);
    }

    #[test]
    fn test_cylinder_rejects_bad_dimensions() {
        assert!(cylinder_mesh(0.0, 1.0, 32).is_err());
        assert!(cylinder_mesh(1.0, 0.0, 32).is_err());
        assert!(cylinder_mesh(1.0, 1.0, 2).is_err());
    }

    #[test]
    fn test_sphere_counts() {
        let mesh = sphere_mesh(1.0, SPHERE_RINGS, SPHERE_SEGMENTS).unwrap();
        let rings = SPHERE_RINGS as usize;
        let segs = SPHERE_SEGMENTS as usize;
        assert_eq!(mesh.vertex_count(), (rings - 1) * segs + 2);
        assert_eq!(mesh.triangle_count(), 2 * segs * (rings - 1));
        assert!(mesh.is_closed_manifold());
    }

    #[test]
    fn test_sphere_volume_approaches_analytic() {
        let mesh = sphere_mesh(1.0, 64, 128).unwrap();
        let analytic = 4.0 / 3.0 * std::f64::consts::PI;
        assert!((mesh.volume() - analytic).abs() / analytic < 5e-3);
    }
}
