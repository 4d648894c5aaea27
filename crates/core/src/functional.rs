//! Linear functionals given by a Sobolev inner product against a fixed function.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::error::{Result, TrigError};
use crate::transform::wave_numbers;
use crate::trigtech::Trigtech;

/// `v -> <function, v>_{H^order}` on coefficient vectors.
///
/// The inner product is evaluated exactly in coefficient space:
/// `Σ_k w_k conj(f_k) v_k` with `w_k = 2 Σ_{j<=order} (πk)^{2j}`. An even-length
/// Nyquist row stands for two half-weight modes and gets half the weight.
#[derive(Debug, Clone)]
pub struct Functional {
    function: Trigtech,
    order: usize,
    weights: Vec<f64>,
}

impl Functional {
    pub fn new(function: Trigtech, order: usize) -> Self {
        let weights = sobolev_weights(function.len(), order);
        Self {
            function,
            order,
            weights,
        }
    }

    pub fn function(&self) -> &Trigtech {
        &self.function
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Length of the coefficient vectors this functional accepts.
    pub fn len(&self) -> usize {
        self.function.len() * self.function.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resample the underlying function to `n` modes.
    #[must_use]
    pub fn prolong(&self, n: usize) -> Self {
        Self::new(self.function.prolong(n), self.order)
    }

    /// Apply to a flattened column-major coefficient vector.
    pub fn apply(&self, coeffs: &[Complex64]) -> Result<Complex64> {
        if coeffs.len() != self.len() {
            return Err(TrigError::shape(
                format!("{} coefficients", self.len()),
                format!("{}", coeffs.len()),
            ));
        }
        let n = self.function.len();
        Ok(self
            .function
            .coeffs()
            .as_slice()
            .iter()
            .zip(coeffs)
            .enumerate()
            .map(|(i, (f, v))| f.conj() * v * self.weights[i % n])
            .sum())
    }

    /// Apply to a function, resampling it to this functional's length.
    pub fn apply_function(&self, v: &Trigtech) -> Result<Complex64> {
        if v.cols() != self.function.cols() {
            return Err(TrigError::shape(
                format!("{} columns", self.function.cols()),
                format!("{} columns", v.cols()),
            ));
        }
        let coeffs = v.prolong_coeffs(self.function.len());
        self.apply(coeffs.as_slice())
    }
}

fn sobolev_weights(n: usize, order: usize) -> Vec<f64> {
    wave_numbers(n)
        .into_iter()
        .enumerate()
        .map(|(row, k)| {
            let k2 = (PI * k as f64).powi(2);
            let w: f64 = (0..=order).map(|j| k2.powi(j as i32)).sum();
            if n % 2 == 0 && row == 0 { w } else { 2.0 * w }
        })
        .collect()
}
