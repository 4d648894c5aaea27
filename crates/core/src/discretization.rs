//! Discretization strategies consumed by the deflation operators.
//!
//! A [`Discretization`] turns the current state into a [`Collocation`]: the
//! linearized system pieces at that state plus the nonlinear residual. States
//! are anything implementing [`NumericState`], so a bare function and a
//! continuation state (function plus parameter) go through the same path.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::array::SpectralArray;
use crate::error::{Result, TrigError};
use crate::linalg::{CsrMatrix, DenseMatrix};
use crate::transform::{coeffs2vals, const_index, vals2coeffs, wave_numbers};
use crate::trigtech::Trigtech;

/// Denominators below this are replaced by 1 in the diagonal preconditioner.
const PRECOND_FLOOR: f64 = 1e-12;

// ============================================================================
// States
// ============================================================================

/// Capability shared by every state the deflation operators accept.
pub trait NumericState {
    fn as_function(&self) -> &Trigtech;

    /// Flattened column-major coefficients of the function part.
    fn as_numeric_vector(&self) -> Vec<Complex64> {
        self.as_function().coeff_vector()
    }

    /// Continuation parameter, if the state carries one.
    fn parameter(&self) -> Option<f64> {
        None
    }
}

impl NumericState for Trigtech {
    fn as_function(&self) -> &Trigtech {
        self
    }
}

/// Function plus scalar parameter, as used by pseudo-arclength continuation.
#[derive(Debug, Clone)]
pub struct ContinuationState {
    pub u: Trigtech,
    pub parameter: f64,
}

impl ContinuationState {
    pub fn new(u: Trigtech, parameter: f64) -> Self {
        Self { u, parameter }
    }
}

impl NumericState for ContinuationState {
    fn as_function(&self) -> &Trigtech {
        &self.u
    }

    fn parameter(&self) -> Option<f64> {
        Some(self.parameter)
    }
}

// ============================================================================
// Strategy Traits
// ============================================================================

/// Linearization at a state: `matrix` is the Jacobian, `preconditioner` an
/// approximate inverse of it, `auxiliary` the state-independent linear part.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub matrix: CsrMatrix,
    pub preconditioner: CsrMatrix,
    pub auxiliary: CsrMatrix,
}

pub trait Collocation {
    fn name(&self) -> &str;

    fn matrix(&self) -> Result<LinearSystem>;

    fn projection(&self) -> &CsrMatrix;

    /// Residual at `state`, or at the linearization point when `None`.
    fn rhs(&self, state: Option<&dyn NumericState>) -> Result<Vec<Complex64>>;

    fn matrix_inverse_basis(&self) -> Result<CsrMatrix>;

    fn matrix_adjoint(&self) -> Result<CsrMatrix>;

    fn matrix_full(&self) -> Result<CsrMatrix>;

    /// Derivative of the residual with respect to the continuation parameter.
    fn diff_a(&self, _state: &dyn NumericState) -> Result<Vec<Complex64>> {
        Err(TrigError::NotImplemented("parameter derivative"))
    }
}

pub trait Discretization {
    type Colloc: Collocation;

    /// Number of modes per function the discretization works with.
    fn n_disc(&self) -> usize;

    fn discretize(&self, state: &dyn NumericState) -> Result<Self::Colloc>;
}

// ============================================================================
// Semilinear Model Problem
// ============================================================================

/// `eps u'' + lambda u - u^3 = 0` on the periodic interval, Fourier-Galerkin.
///
/// Constant states ±sqrt(lambda) and 0 are always solutions, which makes the
/// problem a convenient test bed for deflation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemilinearProblem {
    pub epsilon: f64,
    pub lambda: f64,
    n_disc: usize,
}

impl SemilinearProblem {
    /// `n_disc` is rounded up to an odd length so that products of states
    /// stay free of a Nyquist mode.
    pub fn new(epsilon: f64, lambda: f64, n_disc: usize) -> Self {
        Self {
            epsilon,
            lambda,
            n_disc: n_disc.max(1) | 1,
        }
    }
}

impl Discretization for SemilinearProblem {
    type Colloc = SemilinearCollocation;

    fn n_disc(&self) -> usize {
        self.n_disc
    }

    fn discretize(&self, state: &dyn NumericState) -> Result<SemilinearCollocation> {
        let u = state.as_function();
        if u.cols() != 1 {
            return Err(TrigError::shape("1 column", format!("{} columns", u.cols())));
        }
        Ok(SemilinearCollocation {
            u: u.prolong(self.n_disc),
            epsilon: self.epsilon,
            lambda: state.parameter().unwrap_or(self.lambda),
            projection: CsrMatrix::identity(self.n_disc),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SemilinearCollocation {
    u: Trigtech,
    epsilon: f64,
    lambda: f64,
    projection: CsrMatrix,
}

impl SemilinearCollocation {
    pub fn state(&self) -> &Trigtech {
        &self.u
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    fn len(&self) -> usize {
        self.u.len()
    }

    /// Diagonal of `eps d²/dx² + lambda` in coefficient space.
    fn linear_symbol(&self, lambda: f64) -> Vec<Complex64> {
        wave_numbers(self.len())
            .into_iter()
            .map(|k| Complex64::new(-self.epsilon * (PI * k as f64).powi(2) + lambda, 0.0))
            .collect()
    }

    fn jacobian(&self) -> DenseMatrix {
        let n = self.len();
        // 3u² on 2n + 1 modes holds every wave number |k| <= n - 1 exactly.
        let square = power_coeffs(&self.u, 2, 2 * n + 1);
        let centre = const_index(2 * n + 1);
        let col: Vec<Complex64> = (0..n).map(|i| square[centre + i] * 3.0).collect();
        let row: Vec<Complex64> = (0..n).map(|j| square[centre - j] * 3.0).collect();
        let product = DenseMatrix::toeplitz(&col, &row);
        let symbol = self.linear_symbol(self.lambda);
        DenseMatrix::from_fn(n, n, |i, j| {
            let linear = if i == j { symbol[i] } else { Complex64::default() };
            linear - product.get(i, j)
        })
    }
}

impl Collocation for SemilinearCollocation {
    fn name(&self) -> &str {
        "fourier"
    }

    fn matrix(&self) -> Result<LinearSystem> {
        let n = self.len();
        let symbol = self.linear_symbol(self.lambda);
        let mean_square = power_coeffs(&self.u, 2, 2 * n + 1)[const_index(2 * n + 1)];
        let diagonal: Vec<Complex64> = symbol
            .iter()
            .map(|&s| {
                let d = s - mean_square * 3.0;
                if d.norm() < PRECOND_FLOOR {
                    Complex64::new(1.0, 0.0)
                } else {
                    d.inv()
                }
            })
            .collect();
        Ok(LinearSystem {
            matrix: CsrMatrix::from_dense(&self.jacobian()),
            preconditioner: CsrMatrix::from_diagonal(&diagonal),
            auxiliary: CsrMatrix::from_diagonal(&symbol),
        })
    }

    fn projection(&self) -> &CsrMatrix {
        &self.projection
    }

    fn rhs(&self, state: Option<&dyn NumericState>) -> Result<Vec<Complex64>> {
        let n = self.len();
        let (u, lambda) = match state {
            Some(state) => {
                let u = state.as_function();
                if u.cols() != 1 {
                    return Err(TrigError::shape("1 column", format!("{} columns", u.cols())));
                }
                (u.prolong(n), state.parameter().unwrap_or(self.lambda))
            }
            None => (self.u.clone(), self.lambda),
        };
        // u³ on 3n modes is exact; keeping the central n is the Galerkin
        // projection.
        let cube = power_coeffs(&u, 3, 3 * n);
        let offset = const_index(3 * n) - const_index(n);
        let symbol = self.linear_symbol(lambda);
        Ok(u.coeffs()
            .column(0)
            .iter()
            .zip(&symbol)
            .enumerate()
            .map(|(p, (&c, &s))| s * c - cube[offset + p])
            .collect())
    }

    fn matrix_inverse_basis(&self) -> Result<CsrMatrix> {
        Ok(CsrMatrix::identity(self.len()))
    }

    fn matrix_adjoint(&self) -> Result<CsrMatrix> {
        Ok(CsrMatrix::from_dense(&self.jacobian().adjoint()))
    }

    fn matrix_full(&self) -> Result<CsrMatrix> {
        Ok(CsrMatrix::from_dense(&self.jacobian()))
    }

    fn diff_a(&self, state: &dyn NumericState) -> Result<Vec<Complex64>> {
        Ok(state.as_function().prolong(self.len()).coeff_vector())
    }
}

/// Coefficients of `u^power` sampled on `n_out` points (first column only).
fn power_coeffs(u: &Trigtech, power: i32, n_out: usize) -> Vec<Complex64> {
    let values = coeffs2vals(&u.prolong_coeffs(n_out));
    let powered = values.map(|v| v.powi(power));
    let coeffs = vals2coeffs(&SpectralArray::from_column(powered.column(0).to_vec()));
    coeffs.column(0).to_vec()
}
