//! BSP-tree polyhedral boolean engine
//!
//! Binary space partitioning CSG after the csg.js algorithm: solids are
//! polygon soups, booleans are sequences of clip/invert operations on two
//! trees. Output polygons are fan-triangulated and re-indexed before they
//! re-enter the kernel.

use glam::DVec3;

use crate::constants::{PLANE_EPSILON, VERTEX_PRECISION};
use crate::mesh::TriangleMesh;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

/// Oriented plane `normal · p = w`
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: DVec3,
    w: f64,
}

impl Plane {
    /// Plane through three points with counter-clockwise winding; None if
    /// the points are collinear
    fn from_points(a: DVec3, b: DVec3, c: DVec3) -> Option<Self> {
        let cross = (b - a).cross(c - a);
        if cross.length_squared() < PLANE_EPSILON * PLANE_EPSILON {
            return None;
        }
        let normal = cross.normalize();
        Some(Self {
            normal,
            w: normal.dot(a),
        })
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn classify(&self, point: DVec3) -> u8 {
        let t = self.normal.dot(point) - self.w;
        if t < -PLANE_EPSILON {
            BACK
        } else if t > PLANE_EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }
}

/// Convex polygon carried through the BSP passes
#[derive(Debug, Clone)]
pub(crate) struct BspPolygon {
    vertices: Vec<DVec3>,
    plane: Plane,
}

impl BspPolygon {
    fn new(vertices: Vec<DVec3>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane::from_points(vertices[0], vertices[1], vertices[2])?;
        Some(Self { vertices, plane })
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }

    /// Classify against `plane` and distribute into the four output lists,
    /// splitting spanning polygons along the intersection.
    fn split(
        &self,
        plane: &Plane,
        coplanar_front: &mut Vec<BspPolygon>,
        coplanar_back: &mut Vec<BspPolygon>,
        front: &mut Vec<BspPolygon>,
        back: &mut Vec<BspPolygon>,
    ) {
        let mut polygon_type = COPLANAR;
        let mut types = Vec::with_capacity(self.vertices.len());
        for &v in &self.vertices {
            let t = plane.classify(v);
            polygon_type |= t;
            types.push(t);
        }

        match polygon_type {
            COPLANAR => {
                if plane.normal.dot(self.plane.normal) > 0.0 {
                    coplanar_front.push(self.clone());
                } else {
                    coplanar_back.push(self.clone());
                }
            }
            FRONT => front.push(self.clone()),
            BACK => back.push(self.clone()),
            _ => {
                let mut front_verts = Vec::new();
                let mut back_verts = Vec::new();
                for i in 0..self.vertices.len() {
                    let j = (i + 1) % self.vertices.len();
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (self.vertices[i], self.vertices[j]);
                    if ti != BACK {
                        front_verts.push(vi);
                    }
                    if ti != FRONT {
                        back_verts.push(vi);
                    }
                    if (ti | tj) == SPANNING {
                        let t = (plane.w - plane.normal.dot(vi))
                            / plane.normal.dot(vj - vi);
                        let intersection = vi.lerp(vj, t);
                        front_verts.push(intersection);
                        back_verts.push(intersection);
                    }
                }
                if let Some(poly) = BspPolygon::new(front_verts) {
                    front.push(poly);
                }
                if let Some(poly) = BspPolygon::new(back_verts) {
                    back.push(poly);
                }
            }
        }
    }
}

/// A node in the BSP tree; holds the polygons coplanar with its plane
#[derive(Debug, Default)]
pub(crate) struct BspNode {
    plane: Option<Plane>,
    polygons: Vec<BspPolygon>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
}

impl BspNode {
    pub(crate) fn new(polygons: Vec<BspPolygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    /// Insert polygons, splitting them across the existing tree
    pub(crate) fn build(&mut self, polygons: Vec<BspPolygon>) {
        if polygons.is_empty() {
            return;
        }
        let plane = match self.plane {
            Some(p) => p,
            None => {
                let p = polygons[0].plane;
                self.plane = Some(p);
                p
            }
        };

        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        for poly in polygons {
            poly.split(
                &plane,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        // Both coplanar orientations live at this node
        self.polygons.append(&mut coplanar_front);
        self.polygons.append(&mut coplanar_back);

        if !front.is_empty() {
            self.front
                .get_or_insert_with(Default::default)
                .build(front);
        }
        if !back.is_empty() {
            self.back.get_or_insert_with(Default::default).build(back);
        }
    }

    /// Convert the solid to its complement in place
    pub(crate) fn invert(&mut self) {
        for poly in &mut self.polygons {
            poly.flip();
        }
        if let Some(plane) = &mut self.plane {
            plane.flip();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Remove the parts of `polygons` inside this tree's solid
    fn clip_polygons(&self, polygons: Vec<BspPolygon>) -> Vec<BspPolygon> {
        let plane = match self.plane {
            Some(p) => p,
            None => return polygons,
        };

        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        for poly in polygons {
            poly.split(
                &plane,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        // Coplanar polygons follow the side their normal agrees with
        front.append(&mut coplanar_front);
        back.append(&mut coplanar_back);

        front = match &self.front {
            Some(node) => node.clip_polygons(front),
            None => front,
        };
        back = match &self.back {
            Some(node) => node.clip_polygons(back),
            // No back subtree: whatever is behind the leaf is inside the solid
            None => Vec::new(),
        };

        front.extend(back);
        front
    }

    /// Remove the parts of this tree's polygons inside `other`'s solid
    pub(crate) fn clip_to(&mut self, other: &BspNode) {
        self.polygons = other.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(front) = &mut self.front {
            front.clip_to(other);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(other);
        }
    }

    pub(crate) fn all_polygons(&self) -> Vec<BspPolygon> {
        let mut result = self.polygons.clone();
        if let Some(front) = &self.front {
            result.extend(front.all_polygons());
        }
        if let Some(back) = &self.back {
            result.extend(back.all_polygons());
        }
        result
    }
}

/// Lift an indexed mesh into BSP polygons, dropping degenerate triangles
pub(crate) fn mesh_to_polygons(mesh: &TriangleMesh) -> Vec<BspPolygon> {
    mesh.faces
        .iter()
        .filter_map(|&[a, b, c]| {
            BspPolygon::new(vec![
                mesh.vertices[a as usize],
                mesh.vertices[b as usize],
                mesh.vertices[c as usize],
            ])
        })
        .collect()
}

/// Re-index BSP polygons into a triangle mesh.
///
/// Polygons are fan-triangulated around their first vertex; vertices are
/// deduplicated through a quantized key so shared edges weld back together.
pub(crate) fn polygons_to_mesh(polygons: &[BspPolygon]) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    let mut index_of = std::collections::HashMap::new();

    let mut intern = |mesh: &mut TriangleMesh, v: DVec3| -> u32 {
        let key = (
            (v.x * VERTEX_PRECISION).round() as i64,
            (v.y * VERTEX_PRECISION).round() as i64,
            (v.z * VERTEX_PRECISION).round() as i64,
        );
        *index_of.entry(key).or_insert_with(|| {
            mesh.vertices.push(v);
            (mesh.vertices.len() - 1) as u32
        })
    };

    for poly in polygons {
        let verts = &poly.vertices;
        for i in 1..verts.len() - 1 {
            let a = intern(&mut mesh, verts[0]);
            let b = intern(&mut mesh, verts[i]);
            let c = intern(&mut mesh, verts[i + 1]);
            // Splitting can produce slivers that collapse under welding
            if a != b && b != c && a != c {
                mesh.faces.push([a, b, c]);
            }
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive;

    #[test]
    fn test_mesh_polygon_round_trip() {
        let mesh = primitive::box_mesh(2.0, 2.0, 2.0).unwrap();
        let polys = mesh_to_polygons(&mesh);
        assert_eq!(polys.len(), 12);

        let back = polygons_to_mesh(&polys);
        assert_eq!(back.vertex_count(), 8);
        assert_eq!(back.triangle_count(), 12);
        assert!((back.volume() - mesh.volume()).abs() < 1e-9);
    }

    #[test]
    fn test_invert_negates_volume() {
        let mesh = primitive::box_mesh(2.0, 2.0, 2.0).unwrap();
        let mut node = BspNode::new(mesh_to_polygons(&mesh));
        node.invert();
        let inverted = polygons_to_mesh(&node.all_polygons());
        assert!((inverted.volume() + mesh.volume()).abs() < 1e-9);
    }

    #[test]
    fn test_clip_disjoint_keeps_everything() {
        let a = primitive::box_mesh(1.0, 1.0, 1.0).unwrap();
        let b = primitive::box_mesh(1.0, 1.0, 1.0)
            .unwrap()
            .translated(5.0, 0.0, 0.0);
        let mut node_a = BspNode::new(mesh_to_polygons(&a));
        let node_b = BspNode::new(mesh_to_polygons(&b));
        node_a.clip_to(&node_b);
        assert_eq!(node_a.all_polygons().len(), 12);
    }

    #[test]
    fn test_split_spanning_triangle() {
        let plane = Plane::from_points(
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
        )
        .unwrap();
        let poly = BspPolygon::new(vec![
            DVec3::new(0.0, 0.0, -1.0),
            DVec3::new(1.0, 0.0, -1.0),
            DVec3::new(0.5, 0.0, 1.0),
        ])
        .unwrap();

        let mut cf = Vec::new();
        let mut cb = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        poly.split(&plane, &mut cf, &mut cb, &mut front, &mut back);

        assert_eq!(front.len(), 1);
        assert_eq!(back.len(), 1);
        assert!(back[0].vertices.len() >= 3);
    }
}
