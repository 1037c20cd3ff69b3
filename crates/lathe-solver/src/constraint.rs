//! Geometric constraints
//!
//! Each constraint kind evaluates its residual(s) and writes analytic
//! partial derivatives into the global Jacobian. Angles are in radians.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::point::PointVar;

/// A relation over solver points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// `‖p1 - p2‖` equals `target`
    Distance {
        p1: PointVar,
        p2: PointVar,
        target: f64,
    },
    /// The angle at vertex `p2` between legs `p1-p2` and `p3-p2` equals
    /// `target` radians
    Angle {
        p1: PointVar,
        p2: PointVar,
        p3: PointVar,
        target: f64,
    },
    /// Edge `p1→p2` is parallel to edge `p3→p4`
    Parallel {
        p1: PointVar,
        p2: PointVar,
        p3: PointVar,
        p4: PointVar,
    },
    /// Edge `p1→p2` is perpendicular to edge `p3→p4`
    Perpendicular {
        p1: PointVar,
        p2: PointVar,
        p3: PointVar,
        p4: PointVar,
    },
}

impl Constraint {
    /// Distance constraint between two points
    pub fn distance(p1: PointVar, p2: PointVar, target: f64) -> Self {
        Constraint::Distance { p1, p2, target }
    }

    /// Angle constraint at vertex `p2`
    pub fn angle(p1: PointVar, p2: PointVar, p3: PointVar, target: f64) -> Self {
        Constraint::Angle { p1, p2, p3, target }
    }

    /// Parallelism of edges `p1→p2` and `p3→p4`
    pub fn parallel(p1: PointVar, p2: PointVar, p3: PointVar, p4: PointVar) -> Self {
        Constraint::Parallel { p1, p2, p3, p4 }
    }

    /// Perpendicularity of edges `p1→p2` and `p3→p4`
    pub fn perpendicular(p1: PointVar, p2: PointVar, p3: PointVar, p4: PointVar) -> Self {
        Constraint::Perpendicular { p1, p2, p3, p4 }
    }

    /// Human-readable constraint kind
    pub fn type_name(&self) -> &'static str {
        match self {
            Constraint::Distance { .. } => "distance",
            Constraint::Angle { .. } => "angle",
            Constraint::Parallel { .. } => "parallel",
            Constraint::Perpendicular { .. } => "perpendicular",
        }
    }

    /// Number of scalar residuals this constraint emits
    pub fn residual_count(&self) -> usize {
        match self {
            // The cross product gives one residual per component
            Constraint::Parallel { .. } => 3,
            _ => 1,
        }
    }

    /// The points this constraint depends on
    pub fn referenced_points(&self) -> Vec<PointVar> {
        match *self {
            Constraint::Distance { p1, p2, .. } => vec![p1, p2],
            Constraint::Angle { p1, p2, p3, .. } => vec![p1, p2, p3],
            Constraint::Parallel { p1, p2, p3, p4 }
            | Constraint::Perpendicular { p1, p2, p3, p4 } => vec![p1, p2, p3, p4],
        }
    }

    /// Append this constraint's residual(s) to `out`
    pub(crate) fn evaluate(&self, x: &[f64], out: &mut Vec<f64>) {
        match *self {
            Constraint::Distance { p1, p2, target } => {
                let d = (point(x, p1) - point(x, p2)).length();
                out.push(d - target);
            }
            Constraint::Angle { p1, p2, p3, target } => {
                let u = point(x, p1) - point(x, p2);
                let v = point(x, p3) - point(x, p2);
                let lengths = u.length() * v.length();
                if lengths < f64::EPSILON {
                    // Degenerate leg: the angle is undefined, emit a dead
                    // residual and let damping move the points apart
                    out.push(0.0);
                    return;
                }
                let c = (u.dot(v) / lengths).clamp(-1.0, 1.0);
                out.push(c.acos() - target);
            }
            Constraint::Parallel { p1, p2, p3, p4 } => {
                let u = point(x, p2) - point(x, p1);
                let v = point(x, p4) - point(x, p3);
                let cross = u.cross(v);
                out.extend_from_slice(&[cross.x, cross.y, cross.z]);
            }
            Constraint::Perpendicular { p1, p2, p3, p4 } => {
                let u = point(x, p2) - point(x, p1);
                let v = point(x, p4) - point(x, p3);
                out.push(u.dot(v));
            }
        }
    }

    /// Write this constraint's partial derivatives into the Jacobian rows
    /// starting at `row`
    pub(crate) fn jacobian(&self, x: &[f64], row: usize, jac: &mut [Vec<f64>]) {
        match *self {
            Constraint::Distance { p1, p2, .. } => {
                let delta = point(x, p1) - point(x, p2);
                let d = delta.length();
                if d < f64::EPSILON {
                    // Coincident points: leave a singular row for damping
                    return;
                }
                let grad = delta / d;
                add_grad(&mut jac[row], p1, grad);
                add_grad(&mut jac[row], p2, -grad);
            }
            Constraint::Angle { p1, p2, p3, .. } => {
                let u = point(x, p1) - point(x, p2);
                let v = point(x, p3) - point(x, p2);
                let lu = u.length();
                let lv = v.length();
                if lu < f64::EPSILON || lv < f64::EPSILON {
                    return;
                }
                let c = (u.dot(v) / (lu * lv)).clamp(-1.0, 1.0);
                // d/dc acos(c) = -1/sqrt(1-c²), kept finite near ±1 so the
                // clip stays a soft barrier
                let dacos = -1.0 / (1.0 - c * c).max(1e-12).sqrt();
                let dc_du = v / (lu * lv) - u * (c / (lu * lu));
                let dc_dv = u / (lu * lv) - v * (c / (lv * lv));
                let grad1 = dacos * dc_du;
                let grad3 = dacos * dc_dv;
                add_grad(&mut jac[row], p1, grad1);
                add_grad(&mut jac[row], p3, grad3);
                add_grad(&mut jac[row], p2, -(grad1 + grad3));
            }
            Constraint::Parallel { p1, p2, p3, p4 } => {
                let u = point(x, p2) - point(x, p1);
                let v = point(x, p4) - point(x, p3);
                for j in 0..3 {
                    let mut basis = DVec3::ZERO;
                    basis[j] = 1.0;
                    // d(u×v) = du×v + u×dv, one column per coordinate
                    let du = basis.cross(v);
                    let dv = u.cross(basis);
                    for i in 0..3 {
                        jac[row + i][p2.base() + j] += du[i];
                        jac[row + i][p1.base() + j] -= du[i];
                        jac[row + i][p4.base() + j] += dv[i];
                        jac[row + i][p3.base() + j] -= dv[i];
                    }
                }
            }
            Constraint::Perpendicular { p1, p2, p3, p4 } => {
                let u = point(x, p2) - point(x, p1);
                let v = point(x, p4) - point(x, p3);
                add_grad(&mut jac[row], p2, v);
                add_grad(&mut jac[row], p1, -v);
                add_grad(&mut jac[row], p4, u);
                add_grad(&mut jac[row], p3, -u);
            }
        }
    }
}

pub(crate) fn point(x: &[f64], var: PointVar) -> DVec3 {
    let b = var.base();
    DVec3::new(x[b], x[b + 1], x[b + 2])
}

fn add_grad(row: &mut [f64], var: PointVar, grad: DVec3) {
    let b = var.base();
    row[b] += grad.x;
    row[b + 1] += grad.y;
    row[b + 2] += grad.z;
}
