//! Constraint solver
//!
//! Damped Gauss-Newton (Levenberg-Marquardt) over a shared pool of point
//! variables. Residuals and Jacobians are assembled from the constraints'
//! analytic partials; the normal equations are solved by Gaussian
//! elimination with partial pivoting. Fixed points are eliminated by
//! zeroing their Jacobian columns, which pins their steps to exactly zero.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraint::{point, Constraint};
use crate::point::PointVar;

/// Initial damping factor
const LAMBDA_START: f64 = 1e-3;
/// Damping floor after accepted steps
const LAMBDA_MIN: f64 = 1e-9;
/// Damping ceiling; saturation here means the step cannot improve
const LAMBDA_MAX: f64 = 1e9;

/// Outcome of a solve call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    /// Whether the final residual is within tolerance
    pub converged: bool,
    /// Number of iterations performed
    pub iterations: usize,
    /// Infinity norm of the final residual vector
    pub final_residual_norm: f64,
    /// Human-readable outcome description
    pub message: String,
}

/// Hard solver failures; "did not converge" is reported, not raised
#[derive(Debug, Clone, Error)]
pub enum SolveError {
    #[error("normal equations stayed singular at saturated damping")]
    Singular,
}

/// Nonlinear least-squares solver over 3D point variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintSolver {
    /// Scalar unknowns, three per point
    variables: Vec<f64>,
    /// Per-scalar fixed flags; fixed columns are zeroed in the Jacobian
    fixed: Vec<bool>,
    constraints: Vec<Constraint>,
    tolerance: f64,
    step_tolerance: f64,
    max_iterations: usize,
}

impl Default for ConstraintSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintSolver {
    /// Create a solver with default tolerances (residual 1e-6, step 1e-9)
    /// and iteration limit (100)
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            fixed: Vec::new(),
            constraints: Vec::new(),
            tolerance: 1e-6,
            step_tolerance: 1e-9,
            max_iterations: 100,
        }
    }

    /// Set the residual convergence tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the maximum number of iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Add a free point variable, returning its handle
    pub fn add_point(&mut self, x: f64, y: f64, z: f64) -> PointVar {
        self.push_point(x, y, z, false)
    }

    /// Add a fixed point variable; its value never changes during solves
    pub fn add_fixed_point(&mut self, x: f64, y: f64, z: f64) -> PointVar {
        self.push_point(x, y, z, true)
    }

    /// Change a point's fixed flag
    pub fn set_fixed(&mut self, var: PointVar, fixed: bool) {
        let b = var.base();
        self.fixed[b..b + 3].fill(fixed);
    }

    /// Check a point's fixed flag
    pub fn is_fixed(&self, var: PointVar) -> bool {
        self.fixed[var.base()]
    }

    /// Current position of a point
    pub fn get_point(&self, var: PointVar) -> DVec3 {
        point(&self.variables, var)
    }

    /// Overwrite a point's position
    pub fn set_point(&mut self, var: PointVar, position: DVec3) {
        let b = var.base();
        self.variables[b] = position.x;
        self.variables[b + 1] = position.y;
        self.variables[b + 2] = position.z;
    }

    /// Number of points
    pub fn point_count(&self) -> usize {
        self.variables.len() / 3
    }

    /// Add a constraint over points created by this solver
    pub fn add_constraint(&mut self, constraint: Constraint) {
        debug_assert!(constraint
            .referenced_points()
            .iter()
            .all(|p| p.index() < self.point_count()));
        self.constraints.push(constraint);
    }

    /// Number of constraints
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Stacked residual vector at the current variable values
    pub fn residuals(&self) -> Vec<f64> {
        self.residuals_at(&self.variables)
    }

    /// Drive the variables toward zero residual in place.
    ///
    /// "Did not converge" is an outcome in the report; `Err` is reserved
    /// for normal equations that stay singular at saturated damping.
    pub fn solve(&mut self) -> Result<SolveReport, SolveError> {
        let n = self.variables.len();
        let mut x = self.variables.clone();
        let mut r = self.residuals_at(&x);
        let mut lambda = LAMBDA_START;
        let mut iterations = 0;
        let mut stalled = false;

        loop {
            if inf_norm(&r) < self.tolerance || iterations >= self.max_iterations {
                break;
            }
            iterations += 1;

            let jacobian = self.jacobian_at(&x);
            let m = r.len();

            // Normal equations: JᵀJ and -Jᵀr
            let mut jtj = vec![vec![0.0; n]; n];
            for i in 0..n {
                for k in 0..=i {
                    let mut sum = 0.0;
                    for eq in 0..m {
                        sum += jacobian[eq][i] * jacobian[eq][k];
                    }
                    jtj[i][k] = sum;
                    jtj[k][i] = sum;
                }
            }
            let mut rhs = vec![0.0; n];
            for i in 0..n {
                for eq in 0..m {
                    rhs[i] -= jacobian[eq][i] * r[eq];
                }
            }

            // Damped inner loop: retry with larger λ until the step
            // improves the residual or damping saturates
            let step = loop {
                let mut a = jtj.clone();
                for (i, row) in a.iter_mut().enumerate() {
                    row[i] += lambda;
                }
                let mut b = rhs.clone();

                match gaussian_elimination(&mut a, &mut b) {
                    Some(delta) => {
                        let candidate: Vec<f64> =
                            x.iter().zip(&delta).map(|(xi, di)| xi + di).collect();
                        let r_new = self.residuals_at(&candidate);
                        if l2_norm(&r_new) < l2_norm(&r) {
                            x = candidate;
                            r = r_new;
                            lambda = (lambda / 10.0).max(LAMBDA_MIN);
                            break Some(delta);
                        }
                        if lambda >= LAMBDA_MAX {
                            break None;
                        }
                        lambda = (lambda * 10.0).min(LAMBDA_MAX);
                    }
                    None => {
                        if lambda >= LAMBDA_MAX {
                            return Err(SolveError::Singular);
                        }
                        lambda = (lambda * 10.0).min(LAMBDA_MAX);
                    }
                }
            };

            match step {
                Some(delta) => {
                    if inf_norm(&delta) < self.step_tolerance {
                        break;
                    }
                }
                None => {
                    stalled = true;
                    break;
                }
            }
        }

        self.variables = x;
        let final_residual_norm = inf_norm(&r);
        let converged = final_residual_norm < self.tolerance;
        let message = if converged {
            format!(
                "converged after {} iterations (residual {:.3e})",
                iterations, final_residual_norm
            )
        } else if stalled {
            format!(
                "damping saturated after {} iterations (residual {:.3e})",
                iterations, final_residual_norm
            )
        } else {
            format!(
                "did not converge after {} iterations (residual {:.3e})",
                iterations, final_residual_norm
            )
        };

        if !converged {
            tracing::debug!(%message, "solver finished without convergence");
        }

        Ok(SolveReport {
            converged,
            iterations,
            final_residual_norm,
            message,
        })
    }

    fn push_point(&mut self, x: f64, y: f64, z: f64, fixed: bool) -> PointVar {
        let var = PointVar(self.point_count());
        self.variables.extend_from_slice(&[x, y, z]);
        self.fixed.extend_from_slice(&[fixed; 3]);
        var
    }

    fn residuals_at(&self, x: &[f64]) -> Vec<f64> {
        let mut out = Vec::new();
        for constraint in &self.constraints {
            constraint.evaluate(x, &mut out);
        }
        out
    }

    /// Assemble the dense Jacobian with fixed columns zeroed
    fn jacobian_at(&self, x: &[f64]) -> Vec<Vec<f64>> {
        let n = x.len();
        let m: usize = self.constraints.iter().map(|c| c.residual_count()).sum();
        let mut jacobian = vec![vec![0.0; n]; m];

        let mut row = 0;
        for constraint in &self.constraints {
            constraint.jacobian(x, row, &mut jacobian);
            row += constraint.residual_count();
        }

        for (col, _) in self.fixed.iter().enumerate().filter(|(_, f)| **f) {
            for jac_row in &mut jacobian {
                jac_row[col] = 0.0;
            }
        }

        jacobian
    }
}

/// Gaussian elimination with partial pivoting; None if a pivot vanishes
fn gaussian_elimination(a: &mut [Vec<f64>], b: &mut [f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 {
        return Some(Vec::new());
    }

    for i in 0..n {
        let mut max_row = i;
        let mut max_val = a[i][i].abs();
        for k in (i + 1)..n {
            if a[k][i].abs() > max_val {
                max_val = a[k][i].abs();
                max_row = k;
            }
        }

        if !(max_val > 1e-12) {
            return None;
        }

        if max_row != i {
            a.swap(i, max_row);
            b.swap(i, max_row);
        }

        for k in (i + 1)..n {
            let factor = a[k][i] / a[i][i];
            for j in i..n {
                a[k][j] -= factor * a[i][j];
            }
            b[k] -= factor * b[i];
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }

    Some(x)
}

/// Infinity norm; non-finite entries poison the result so a NaN residual
/// can never read as converged
fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |acc: f64, x| {
        let a = x.abs();
        if a > acc || a.is_nan() {
            a
        } else {
            acc
        }
    })
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
