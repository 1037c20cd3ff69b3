//! Regularized boolean operations over Parts
//!
//! The adapter validates operands, delegates to the configured boolean
//! engine, and re-validates the re-triangulated result. Results carry no
//! analytical metadata: the kind is always `Mesh`.

use crate::engine::{default_engine, BooleanOp};
use crate::error::{CadError, CadResult};
use crate::geometry::GeometryData;
use crate::mesh::TriangleMesh;
use crate::part::Part;

/// Compute `op` over two parts, producing a new part named
/// `{a}_{op}_{b}`. Both inputs are left untouched.
pub fn boolean(op: BooleanOp, a: &Part, b: &Part) -> CadResult<Part> {
    check_operand(&a.name, a.mesh())?;
    check_operand(&b.name, b.mesh())?;

    let engine = default_engine();
    tracing::debug!(op = op.name(), engine = engine.name(), a = %a.name, b = %b.name,
        "boolean operation");

    let result = engine.boolean(op, a.mesh(), b.mesh())?;

    // The regularized empty set is a legal result; anything else must
    // survive structural validation
    if !result.is_empty() {
        result.validate()?;
    }

    let name = format!("{}_{}_{}", a.name, op.name(), b.name);
    Ok(Part::new(name, GeometryData::from_mesh(result)))
}

/// Union of two parts
pub fn union(a: &Part, b: &Part) -> CadResult<Part> {
    boolean(BooleanOp::Union, a, b)
}

/// Difference of two parts (`a` minus `b`)
pub fn difference(a: &Part, b: &Part) -> CadResult<Part> {
    boolean(BooleanOp::Difference, a, b)
}

/// Intersection of two parts
pub fn intersection(a: &Part, b: &Part) -> CadResult<Part> {
    boolean(BooleanOp::Intersection, a, b)
}

/// A non-empty operand must be structurally valid and a closed manifold;
/// handing an open shell to the engine would produce garbage.
fn check_operand(name: &str, mesh: &TriangleMesh) -> CadResult<()> {
    if mesh.is_empty() {
        return Ok(());
    }
    mesh.validate()
        .map_err(|e| CadError::BooleanFailure(format!("operand '{}': {}", name, e)))?;
    if !mesh.is_closed_manifold() {
        return Err(CadError::BooleanFailure(format!(
            "operand '{}' is not a closed manifold",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_union_is_commutative_in_volume() {
        let a = Part::boxed(2.0, 2.0, 2.0).unwrap();
        let b = Part::cylinder(1.0, 3.0).unwrap().translate(0.5, 0.0, 0.0);
        let ab = union(&a, &b).unwrap();
        let ba = union(&b, &a).unwrap();
        assert!(ab.volume() > 0.0);
        assert!(
            (ab.volume() - ba.volume()).abs() < 1e-6,
            "union volumes differ: {} vs {}",
            ab.volume(),
            ba.volume()
        );
    }

    #[test]
    fn test_union_with_empty_is_identity() {
        let a = Part::boxed(2.0, 2.0, 2.0).unwrap();
        let empty = difference(&a, &a).unwrap();
        let result = union(&a, &empty).unwrap();
        assert!((result.volume() - a.volume()).abs() < 1e-9);
    }

    #[test]
    fn test_difference_with_self_is_empty() {
        let a = Part::cylinder(1.0, 2.0).unwrap();
        let result = difference(&a, &a).unwrap();
        assert!(
            result.mesh().is_empty() || result.volume().abs() < 1e-9,
            "expected empty result, got volume {}",
            result.volume()
        );
    }

    #[test]
    fn test_intersection_with_self_is_identity() {
        let a = Part::boxed(2.0, 3.0, 1.0).unwrap();
        let result = intersection(&a, &a).unwrap();
        assert!(
            (result.volume() - a.volume()).abs() < 1e-6,
            "self-intersection volume {} vs {}",
            result.volume(),
            a.volume()
        );
    }

    #[test]
    fn test_difference_of_disjoint_leaves_a() {
        let a = Part::boxed(1.0, 1.0, 1.0).unwrap();
        let b = Part::boxed(1.0, 1.0, 1.0).unwrap().translate(10.0, 0.0, 0.0);
        let result = difference(&a, &b).unwrap();
        assert!((result.volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_volume_of_overlapping_boxes() {
        let a = Part::boxed(2.0, 2.0, 2.0).unwrap();
        let b = Part::boxed(2.0, 2.0, 2.0).unwrap().translate(1.0, 0.0, 0.0);
        let result = union(&a, &b).unwrap();
        // 8 + 8 - 4 overlap
        assert!(
            (result.volume() - 12.0).abs() < 1e-6,
            "union volume {}",
            result.volume()
        );
    }

    #[test]
    fn test_box_minus_cylinder_keeps_corners() {
        // A wide cylinder cored out of a box leaves the four corner columns
        let base = Part::boxed(10.0, 10.0, 10.0).unwrap();
        let bore = Part::cylinder(6.0, 10.0).unwrap();
        let result = difference(&base, &bore).unwrap();

        assert!(result.mesh().triangle_count() > 0);
        assert!(result.volume() > 0.0);
        assert!(result.volume() < base.volume());

        let (min, max) = result.bounding_box().unwrap();
        assert!((min - DVec3::splat(-5.0)).length() < 1e-6);
        assert!((max - DVec3::splat(5.0)).length() < 1e-6);
    }

    #[test]
    fn test_boolean_result_is_anonymous_mesh() {
        use crate::geometry::PrimitiveKind;
        let a = Part::boxed(2.0, 2.0, 2.0).unwrap();
        let b = Part::sphere(1.2).unwrap();
        let result = union(&a, &b).unwrap();
        assert_eq!(result.geometry.kind, PrimitiveKind::Mesh);
        assert!(result.geometry.parameters.is_empty());
        assert_eq!(result.name, "Box_union_Sphere");
    }

    #[test]
    fn test_open_operand_is_rejected() {
        let open = TriangleMesh::from_parts(
            vec![DVec3::ZERO, DVec3::X, DVec3::Y],
            vec![[0, 1, 2]],
        );
        let bad = Part::new("Open", GeometryData::from_mesh(open));
        let good = Part::boxed(1.0, 1.0, 1.0).unwrap();
        assert!(matches!(
            union(&bad, &good),
            Err(CadError::BooleanFailure(_))
        ));
    }
}
