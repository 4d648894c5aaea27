//! Deflated Newton residual and its Sherman–Morrison preconditioner.
//!
//! Given a residual F and known roots u_1..u_N, the deflated residual
//!
//! ```text
//! G(u) = η(u) F(u),   η(u) = Π_k (shift + 1 / ‖u - u_k‖^p)
//! ```
//!
//! shares F's remaining roots but not the known ones. Its linearization is the
//! plain Jacobian scaled by η plus a rank-one term carrying η'(u).

use std::cell::OnceCell;

use log::debug;
use num_complex::Complex64;

use crate::backend::{SpectralBackend, cpu_backend};
use crate::calculus::{h1norm, norm};
use crate::config::{DeflationNorm, DeflationOptions};
use crate::discretization::{Collocation, Discretization, NumericState};
use crate::error::{Result, TrigError};
use crate::functional::Functional;
use crate::linalg::{CsrMatrix, LinearOperator, check_len};
use crate::trigtech::Trigtech;

// ============================================================================
// Deflation Factor
// ============================================================================

fn distance(diff: &Trigtech, kind: DeflationNorm) -> f64 {
    match kind {
        DeflationNorm::H1 => h1norm(diff),
        DeflationNorm::L2 => norm(diff),
    }
}

/// `a - b` after resampling both to the longer length.
fn difference(a: &Trigtech, b: &Trigtech) -> Result<Trigtech> {
    if a.cols() != b.cols() {
        return Err(TrigError::shape(
            format!("{} columns", a.cols()),
            format!("{} columns", b.cols()),
        ));
    }
    let n = a.len().max(b.len());
    Ok(&a.prolong(n) - &b.prolong(n))
}

/// `η(u)`; 1 when there are no known solutions.
pub fn deflation_factor(u: &Trigtech, known: &[Trigtech], options: &DeflationOptions) -> Result<f64> {
    let mut eta = 1.0;
    for (index, ks) in known.iter().enumerate() {
        let d = distance(&difference(u, ks)?, options.norm);
        if d == 0.0 {
            return Err(TrigError::CoincidentSolution { index });
        }
        eta *= options.shift + 1.0 / d.powf(options.power);
    }
    Ok(eta)
}

/// `η(u)` and the functional representing `η'(u)`.
fn deflation_derivative(
    u: &Trigtech,
    known: &[Trigtech],
    options: &DeflationOptions,
) -> Result<(f64, Option<Functional>)> {
    if known.is_empty() {
        return Ok((1.0, None));
    }
    let p = options.power;
    let mut eta = 1.0;
    let mut function: Option<Trigtech> = None;
    for (index, ks) in known.iter().enumerate() {
        let diff = difference(u, ks)?;
        let d = distance(&diff, options.norm);
        if d == 0.0 {
            return Err(TrigError::CoincidentSolution { index });
        }
        let defl = options.shift + 1.0 / d.powf(p);
        eta *= defl;
        let term = &diff * (1.0 / (defl * d.powf(2.0 + p)));
        function = Some(match function {
            Some(acc) => {
                let n = acc.len().max(term.len());
                &acc.prolong(n) + &term.prolong(n)
            }
            None => term,
        });
    }
    let Some(function) = function else {
        return Ok((eta, None));
    };
    let mut function = &function * (-p * eta);
    if function.len() != u.len() {
        function = function.prolong(u.len());
    }
    Ok((eta, Some(Functional::new(function, options.norm.order()))))
}

// ============================================================================
// Deflated Residual
// ============================================================================

/// Linearization of the deflated residual at a fixed state.
#[derive(Debug)]
pub struct DeflatedResidual<C: Collocation> {
    colloc: C,
    m: CsrMatrix,
    p: CsrMatrix,
    s: CsrMatrix,
    m_t: OnceCell<CsrMatrix>,
    /// Plain residual at the linearization point, times η when deflating.
    b: Vec<Complex64>,
    known_solutions: Vec<Trigtech>,
    options: DeflationOptions,
    eta: f64,
    functional: Option<Functional>,
}

impl<C: Collocation> DeflatedResidual<C> {
    pub fn new<D, S>(
        state: &S,
        discretization: &D,
        known_solutions: &[Trigtech],
        options: DeflationOptions,
    ) -> Result<Self>
    where
        D: Discretization<Colloc = C>,
        S: NumericState,
    {
        let colloc = discretization.discretize(state)?;
        let system = colloc.matrix()?;
        let b = colloc.rhs(None)?;

        let mut u = state.as_function().clone();
        let (rows, _) = system.matrix.shape();
        if u.len() * u.cols() != rows {
            let n = discretization.n_disc();
            if n * u.cols() != rows {
                return Err(TrigError::shape(
                    format!("{rows} unknowns"),
                    format!("{} columns of {n} modes", u.cols()),
                ));
            }
            u = u.prolong(n);
        }

        let (eta, functional) = deflation_derivative(&u, known_solutions, &options)?;
        debug!(
            "deflated residual: n = {}, known = {}, eta = {eta:.6e}",
            u.len(),
            known_solutions.len()
        );
        let mut b = b;
        if !known_solutions.is_empty() {
            cpu_backend().scale(Complex64::new(eta, 0.0), &mut b);
        }

        Ok(Self {
            colloc,
            m: system.matrix,
            p: system.preconditioner,
            s: system.auxiliary,
            m_t: OnceCell::new(),
            b,
            known_solutions: known_solutions.to_vec(),
            options,
            eta,
            functional,
        })
    }

    pub fn is_deflated(&self) -> bool {
        !self.known_solutions.is_empty()
    }

    /// Deflation factor at the linearization point.
    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn functional(&self) -> Option<&Functional> {
        self.functional.as_ref()
    }

    pub fn b(&self) -> &[Complex64] {
        &self.b
    }

    pub fn collocation(&self) -> &C {
        &self.colloc
    }

    pub fn jacobian(&self) -> &CsrMatrix {
        &self.m
    }

    pub fn auxiliary(&self) -> &CsrMatrix {
        &self.s
    }

    pub fn projection(&self) -> &CsrMatrix {
        self.colloc.projection()
    }

    /// Residual at `state`, deflated with η evaluated at `state`.
    pub fn rhs<S: NumericState>(&self, state: &S) -> Result<Vec<Complex64>> {
        let mut res = self.colloc.rhs(Some(state as &dyn NumericState))?;
        if self.is_deflated() {
            let eta = deflation_factor(state.as_function(), &self.known_solutions, &self.options)?;
            cpu_backend().scale(Complex64::new(eta, 0.0), &mut res);
        }
        Ok(res)
    }

    /// Materialized operator; free when undeflated.
    pub fn to_matrix(&self) -> Result<CsrMatrix> {
        if !self.is_deflated() {
            return Ok(self.m.clone());
        }
        Ok(CsrMatrix::from_dense(&self.to_dense()?))
    }

    pub fn precond(&self) -> Result<DeflatedResidualPrecond> {
        DeflatedResidualPrecond::new(
            self.p.clone(),
            self.b.clone(),
            self.known_solutions.len(),
            self.functional.clone(),
            self.eta,
        )
    }

    pub fn inverse_basis(&self) -> Result<CsrMatrix> {
        self.colloc.matrix_inverse_basis()
    }

    pub fn adjoint(&self) -> Result<CsrMatrix> {
        self.colloc.matrix_adjoint()
    }

    pub fn matrix_full(&self) -> Result<CsrMatrix> {
        self.colloc.matrix_full()
    }
}

impl<C: Collocation> LinearOperator for DeflatedResidual<C> {
    fn shape(&self) -> (usize, usize) {
        self.m.shape()
    }

    fn matvec(&self, c: &[Complex64]) -> Result<Vec<Complex64>> {
        let mc = self.m.matvec(c)?;
        let Some(functional) = self.functional.as_ref().filter(|_| self.is_deflated()) else {
            return Ok(mc);
        };
        let deta = functional.apply(c)?;
        Ok(mc
            .into_iter()
            .zip(&self.b)
            .map(|(v, &b)| v * self.eta + b * deta)
            .collect())
    }

    fn rmatvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        if self.is_deflated() {
            return Err(TrigError::NotImplemented("adjoint action of a deflated residual"));
        }
        self.m_t.get_or_init(|| self.m.transpose()).matvec(x)
    }
}

// ============================================================================
// Preconditioner
// ============================================================================

/// Approximate inverse of [`DeflatedResidual`] from a plain preconditioner
/// `Pf ≈ M⁻¹` via the Sherman–Morrison formula.
#[derive(Debug)]
pub struct DeflatedResidualPrecond {
    pf: CsrMatrix,
    pf_t: OnceCell<CsrMatrix>,
    b: Vec<Complex64>,
    known: usize,
    functional: Option<Functional>,
    eta: f64,
    denom: Complex64,
}

impl DeflatedResidualPrecond {
    pub fn new(
        pf: CsrMatrix,
        b: Vec<Complex64>,
        known: usize,
        functional: Option<Functional>,
        eta: f64,
    ) -> Result<Self> {
        check_len(pf.shape().0, &b)?;
        let denom = match &functional {
            Some(functional) => functional.apply(&b)? + eta * eta,
            None => Complex64::new(eta * eta, 0.0),
        };
        Ok(Self {
            pf,
            pf_t: OnceCell::new(),
            b,
            known,
            functional,
            eta,
            denom,
        })
    }

    pub fn denom(&self) -> Complex64 {
        self.denom
    }

    pub fn to_matrix(&self) -> Result<CsrMatrix> {
        Ok(CsrMatrix::from_dense(&self.to_dense()?))
    }
}

impl LinearOperator for DeflatedResidualPrecond {
    fn shape(&self) -> (usize, usize) {
        self.pf.shape()
    }

    fn matvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        let term1 = self.pf.matvec(x)?;
        let functional = match &self.functional {
            Some(functional) if self.known > 0 => functional,
            _ => return Ok(term1),
        };
        let weight = functional.apply(&term1)? / self.denom;
        Ok(term1
            .into_iter()
            .zip(&self.b)
            .map(|(t, &b)| (t - b * weight) / self.eta)
            .collect())
    }

    fn rmatvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        if self.known > 0 {
            return Err(TrigError::NotImplemented(
                "adjoint action of a deflated preconditioner",
            ));
        }
        self.pf_t.get_or_init(|| self.pf.transpose()).matvec(x)
    }
}
