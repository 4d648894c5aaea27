//! Newton drivers built on the deflated residual.
//!
//! [`NewtonSolver`] runs damped Newton on `G(u) = η(u) F(u)` with a dense LU
//! solve per step. [`ContinuationCorrector`] is the bordered linear operator
//! `[D_u G | D_a F]` used by the corrector step of pseudo-arclength
//! continuation.

use log::{debug, info, warn};
use num_complex::Complex64;

use crate::array::SpectralArray;
use crate::backend::{SpectralBackend, cpu_backend};
use crate::config::{DeflationOptions, NewtonOptions};
use crate::deflation::{DeflatedResidual, DeflatedResidualPrecond};
use crate::discretization::{Collocation, ContinuationState, Discretization};
use crate::error::Result;
use crate::linalg::{CsrMatrix, DenseMatrix, LinearOperator, check_len};
use crate::trigtech::Trigtech;

fn vector_norm(v: &[Complex64]) -> f64 {
    cpu_backend().dot(v, v).re.sqrt()
}

// ============================================================================
// Continuation Corrector
// ============================================================================

/// `[D_u G(a, u) | D_a F(a, u)]`, an n x (n + 1) operator.
#[derive(Debug)]
pub struct ContinuationCorrector<C: Collocation> {
    du: DeflatedResidual<C>,
    da: Vec<Complex64>,
    mat: CsrMatrix,
}

impl<C: Collocation> ContinuationCorrector<C> {
    pub fn new<D>(
        state: &ContinuationState,
        discretization: &D,
        known_solutions: &[Trigtech],
        options: DeflationOptions,
    ) -> Result<Self>
    where
        D: Discretization<Colloc = C>,
    {
        let du = DeflatedResidual::new(state, discretization, known_solutions, options)?;
        let da = du.collocation().diff_a(state)?;
        let mat = CsrMatrix::from_dense(&du.to_matrix()?.to_dense_matrix().hstack_column(&da)?);
        Ok(Self { du, da, mat })
    }

    pub fn residual(&self) -> &DeflatedResidual<C> {
        &self.du
    }

    pub fn parameter_derivative(&self) -> &[Complex64] {
        &self.da
    }

    pub fn rhs(&self, state: &ContinuationState) -> Result<Vec<Complex64>> {
        self.du.rhs(state)
    }

    pub fn precond(&self) -> Result<ContinuationCorrectorPrecond> {
        ContinuationCorrectorPrecond::new(self.du.precond()?)
    }

    pub fn inverse_basis(&self) -> Result<CsrMatrix> {
        self.du.inverse_basis()
    }

    /// Full Jacobian with the parameter column appended.
    pub fn matrix_full(&self, state: &ContinuationState) -> Result<CsrMatrix> {
        let full_u = self.du.matrix_full()?.to_dense_matrix();
        let full_a = self.du.collocation().diff_a(state)?;
        Ok(CsrMatrix::from_dense(&full_u.hstack_column(&full_a)?))
    }

    pub fn to_matrix(&self) -> &CsrMatrix {
        &self.mat
    }
}

impl<C: Collocation> LinearOperator for ContinuationCorrector<C> {
    fn shape(&self) -> (usize, usize) {
        let (rows, cols) = self.du.shape();
        (rows, cols + 1)
    }

    fn matvec(&self, dx: &[Complex64]) -> Result<Vec<Complex64>> {
        check_len(self.shape().1, dx)?;
        let (du, da) = dx.split_at(dx.len() - 1);
        let head = self.du.matvec(du)?;
        Ok(head
            .into_iter()
            .zip(&self.da)
            .map(|(h, &a)| h + a * da[0])
            .collect())
    }

    fn rmatvec(&self, dx: &[Complex64]) -> Result<Vec<Complex64>> {
        let mut out = self.du.rmatvec(dx)?;
        out.push(self.da.iter().zip(dx).map(|(a, x)| a * x).sum());
        Ok(out)
    }

    fn to_dense(&self) -> Result<DenseMatrix> {
        Ok(self.mat.to_dense_matrix())
    }
}

/// Block preconditioner `[[P_G, 0], [0, 1]]` for [`ContinuationCorrector`].
#[derive(Debug)]
pub struct ContinuationCorrectorPrecond {
    du: DeflatedResidualPrecond,
    mat: CsrMatrix,
}

impl ContinuationCorrectorPrecond {
    pub fn new(du: DeflatedResidualPrecond) -> Result<Self> {
        let inner = du.to_dense()?;
        let n = inner.rows();
        let mut last = vec![Complex64::default(); n + 1];
        last[n] = Complex64::new(1.0, 0.0);
        let bordered = inner
            .hstack_column(&vec![Complex64::default(); n])?
            .vstack_row(&last)?;
        Ok(Self {
            du,
            mat: CsrMatrix::from_dense(&bordered),
        })
    }

    pub fn to_matrix(&self) -> &CsrMatrix {
        &self.mat
    }
}

impl LinearOperator for ContinuationCorrectorPrecond {
    fn shape(&self) -> (usize, usize) {
        self.mat.shape()
    }

    fn matvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        check_len(self.shape().1, x)?;
        let (head, tail) = x.split_at(x.len() - 1);
        let mut out = self.du.matvec(head)?;
        out.push(tail[0]);
        Ok(out)
    }

    fn rmatvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        check_len(self.shape().0, x)?;
        let (head, tail) = x.split_at(x.len() - 1);
        let mut out = self.du.rmatvec(head)?;
        out.push(tail[0]);
        Ok(out)
    }
}

// ============================================================================
// Deflated Newton
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewtonOutcome {
    pub solution: Trigtech,
    pub iterations: usize,
    pub converged: bool,
    /// Norm of the deflated residual at `solution`.
    pub residual_norm: f64,
}

/// Damped Newton iteration on the deflated residual.
///
/// Each found root can be added with [`NewtonSolver::add_known_solution`];
/// later solves are then repelled from it.
#[derive(Debug)]
pub struct NewtonSolver<'d, D: Discretization> {
    discretization: &'d D,
    known_solutions: Vec<Trigtech>,
    deflation: DeflationOptions,
    options: NewtonOptions,
}

impl<'d, D: Discretization> NewtonSolver<'d, D> {
    pub fn new(discretization: &'d D, deflation: DeflationOptions, options: NewtonOptions) -> Self {
        Self {
            discretization,
            known_solutions: Vec::new(),
            deflation,
            options,
        }
    }

    pub fn known_solutions(&self) -> &[Trigtech] {
        &self.known_solutions
    }

    pub fn add_known_solution(&mut self, solution: Trigtech) {
        self.known_solutions.push(solution);
    }

    pub fn solve(&self, initial: &Trigtech) -> Result<NewtonOutcome> {
        let n = self.discretization.n_disc();
        let mut u = initial.prolong(n);

        for iteration in 0..self.options.max_iterations {
            let op = DeflatedResidual::new(&u, self.discretization, &self.known_solutions, self.deflation)?;
            let residual = op.rhs(&u)?;
            let residual_norm = vector_norm(&residual);
            debug!(
                "newton {iteration}: |G(u)| = {residual_norm:.3e}, eta = {:.3e}",
                op.eta()
            );
            if residual_norm < self.options.tolerance {
                info!(
                    "newton converged in {iteration} iterations (|G(u)| = {residual_norm:.3e})"
                );
                return Ok(NewtonOutcome {
                    solution: u,
                    iterations: iteration,
                    converged: true,
                    residual_norm,
                });
            }

            let jacobian = op.to_matrix()?.to_dense_matrix();
            let negated: Vec<Complex64> = residual.iter().map(|r| -r).collect();
            let step = jacobian.solve(&negated)?;
            let mut updated = u.coeff_vector();
            cpu_backend().axpy(Complex64::new(self.options.damping, 0.0), &step, &mut updated);
            u = u.with_coeffs(SpectralArray::from_vec(n, u.cols(), updated));
        }

        let op = DeflatedResidual::new(&u, self.discretization, &self.known_solutions, self.deflation)?;
        let residual_norm = vector_norm(&op.rhs(&u)?);
        let converged = residual_norm < self.options.tolerance;
        if converged {
            info!(
                "newton converged in {} iterations (|G(u)| = {residual_norm:.3e})",
                self.options.max_iterations
            );
        } else {
            warn!(
                "newton stopped after {} iterations without converging (|G(u)| = {residual_norm:.3e})",
                self.options.max_iterations
            );
        }
        Ok(NewtonOutcome {
            solution: u,
            iterations: self.options.max_iterations,
            converged,
            residual_norm,
        })
    }
}
