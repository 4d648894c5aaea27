//! Trigonometric representation of periodic functions on [-1, 1).
//!
//! A [`Trigtech`] stores Fourier coefficients and grid values for one or
//! more functions side by side. Both arrays are kept as an exact transform
//! pair; every operation returns a new value instead of mutating in place.
//!
//! # Construction
//!
//! - [`Trigtech::from_values`] / [`Trigtech::from_coeffs`]: explicit data,
//!   always happy, never simplified.
//! - [`Trigtech::from_fn`] and friends: adaptive sampling until the
//!   coefficients pass the happiness check, followed by [`Trigtech::simplify`].
//!   Failing to resolve within `max_length` yields an unhappy result rather
//!   than an error.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::array::SpectralArray;
use crate::chop::check_happy;
use crate::config::TrigOptions;
use crate::error::{Result, TrigError};
use crate::grid::trigpts;
use crate::refine::{FunctionContainer, check_callable, populate};
use crate::resize::{prolong_coeffs, truncate_coeffs};
use crate::transform::{coeffs2vals, const_index, vals2coeffs, wave_numbers};

#[derive(Debug, Clone)]
pub struct Trigtech {
    coeffs: SpectralArray,
    values: SpectralArray,
    is_happy: bool,
    is_real: Vec<bool>,
    eps: f64,
    hscale: f64,
    vscale: f64,
    max_length: usize,
}

// ============================================================================
// Construction
// ============================================================================

impl Trigtech {
    pub fn from_values(values: SpectralArray, options: &TrigOptions) -> Self {
        let coeffs = vals2coeffs(&values);
        Self::assemble(coeffs, values, true, None, options.eps, options.max_length)
    }

    pub fn from_coeffs(coeffs: SpectralArray, options: &TrigOptions) -> Self {
        let values = coeffs2vals(&coeffs);
        Self::assemble(coeffs, values, true, None, options.eps, options.max_length)
    }

    /// Real samples of a single function on `trigpts(values.len())`.
    pub fn from_real_values(values: &[f64], options: &TrigOptions) -> Self {
        Self::from_values(SpectralArray::from_real_column(values), options)
    }

    /// Adaptively resolve a scalar complex-valued callable.
    pub fn from_fn(op: impl Fn(f64) -> Complex64, options: &TrigOptions) -> Result<Self> {
        Self::from_container(&FunctionContainer::single(op), options)
    }

    pub fn from_real_fn(op: impl Fn(f64) -> f64, options: &TrigOptions) -> Result<Self> {
        Self::from_container(
            &FunctionContainer::single(move |x| Complex64::new(op(x), 0.0)),
            options,
        )
    }

    /// Adaptively resolve one callable per column; all columns share one length.
    pub fn from_container(ops: &FunctionContainer<'_>, options: &TrigOptions) -> Result<Self> {
        check_callable(ops)?;
        let resolved = populate(ops, options)?;
        let values = coeffs2vals(&resolved.coeffs);
        let mut out = Self::assemble(
            resolved.coeffs,
            values,
            resolved.is_happy,
            None,
            options.eps,
            options.max_length,
        );
        out.vscale = out.vscale.max(resolved.vscale);
        Ok(out.simplify())
    }

    /// New representation sharing this one's tolerances.
    ///
    /// `is_real` keeps the given column flags; `None` re-detects them from
    /// the values.
    pub(crate) fn derived(
        &self,
        coeffs: SpectralArray,
        is_happy: bool,
        is_real: Option<Vec<bool>>,
    ) -> Self {
        let values = coeffs2vals(&coeffs);
        let mut out = Self::assemble(coeffs, values, is_happy, is_real, self.eps, self.max_length);
        out.hscale = self.hscale;
        out
    }

    /// Same tolerances, new coefficients, real flags re-detected.
    pub fn with_coeffs(&self, coeffs: SpectralArray) -> Self {
        self.derived(coeffs, true, None)
    }

    fn assemble(
        coeffs: SpectralArray,
        mut values: SpectralArray,
        is_happy: bool,
        is_real: Option<Vec<bool>>,
        eps: f64,
        max_length: usize,
    ) -> Self {
        let is_real = is_real.unwrap_or_else(|| detect_real(&coeffs, &values, eps, eps));
        values.force_real(&is_real);
        Self {
            coeffs,
            values,
            is_happy,
            is_real,
            eps,
            hscale: eps,
            vscale: eps,
            max_length,
        }
    }
}

/// Column k is real when max|Im v| <= 3 eps max(vscale, max|v|).
fn detect_real(coeffs: &SpectralArray, values: &SpectralArray, eps: f64, vscale: f64) -> Vec<bool> {
    let scales = column_vscale(coeffs, values);
    values
        .column_max_imag()
        .into_iter()
        .zip(scales)
        .map(|(imag, scale)| imag <= 3.0 * eps * vscale.max(scale))
        .collect()
}

fn column_vscale(coeffs: &SpectralArray, values: &SpectralArray) -> Vec<f64> {
    if coeffs.rows() == 1 {
        return coeffs.column_max_abs();
    }
    values.column_max_abs()
}

// ============================================================================
// Accessors
// ============================================================================

impl Trigtech {
    /// Number of Fourier modes.
    pub fn len(&self) -> usize {
        self.coeffs.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Number of represented functions.
    pub fn cols(&self) -> usize {
        self.coeffs.cols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.coeffs.shape()
    }

    pub fn coeffs(&self) -> &SpectralArray {
        &self.coeffs
    }

    pub fn values(&self) -> &SpectralArray {
        &self.values
    }

    pub fn is_happy(&self) -> bool {
        self.is_happy
    }

    /// True when every column is real.
    pub fn is_real(&self) -> bool {
        self.is_real.iter().all(|&r| r)
    }

    pub fn real_columns(&self) -> &[bool] {
        &self.is_real
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn hscale(&self) -> f64 {
        self.hscale
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn options(&self) -> TrigOptions {
        TrigOptions::default()
            .with_eps(self.eps)
            .with_max_length(self.max_length)
    }

    /// Vertical scale per column: max |f| on the grid.
    pub fn vscale(&self) -> Vec<f64> {
        column_vscale(&self.coeffs, &self.values)
    }

    /// Largest of the sampled scale and the current per-column scales.
    pub fn vscale_max(&self) -> f64 {
        self.vscale().into_iter().fold(self.vscale, f64::max)
    }

    pub fn const_index(&self) -> usize {
        const_index(self.len())
    }

    /// Grid points the values are sampled at.
    pub fn x(&self) -> Vec<f64> {
        trigpts(self.len())
    }

    /// Flattened column-major coefficients.
    pub fn coeff_vector(&self) -> Vec<Complex64> {
        self.coeffs.as_slice().to_vec()
    }

    /// Single column as its own representation.
    pub fn column(&self, k: usize) -> Self {
        assert!(k < self.cols(), "column {k} out of range [0, {})", self.cols());
        let coeffs = SpectralArray::from_column(self.coeffs.column(k).to_vec());
        let values = SpectralArray::from_column(self.values.column(k).to_vec());
        Self {
            coeffs,
            values,
            is_happy: self.is_happy,
            is_real: vec![self.is_real[k]],
            eps: self.eps,
            hscale: self.hscale,
            vscale: self.vscale,
            max_length: self.max_length,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = Trigtech> + '_ {
        (0..self.cols()).map(move |k| self.column(k))
    }
}

impl PartialEq for Trigtech {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.coeffs == other.coeffs && self.values == other.values
    }
}

// ============================================================================
// Evaluation
// ============================================================================

impl Trigtech {
    /// Evaluate every column at every point; result is `x.len()` x `cols()`.
    ///
    /// For even lengths the lone Nyquist coefficient is evaluated as
    /// c cos(π n/2 x), which agrees with the grid values.
    pub fn feval(&self, x: &[f64]) -> SpectralArray {
        let n = self.len();
        let ks = wave_numbers(n);
        let even = n % 2 == 0;
        SpectralArray::from_fn(x.len(), self.cols(), |row, col| {
            let xi = x[row];
            let coeffs = self.coeffs.column(col);
            let mut sum = Complex64::default();
            for (p, (&c, &k)) in coeffs.iter().zip(&ks).enumerate() {
                if even && p == 0 {
                    sum += c * (PI * k as f64 * xi).cos();
                } else {
                    sum += c * Complex64::from_polar(1.0, PI * k as f64 * xi);
                }
            }
            if self.is_real[col] {
                Complex64::new(sum.re, 0.0)
            } else {
                sum
            }
        })
    }

    /// Values of all columns at a single point.
    pub fn eval(&self, x: f64) -> Vec<Complex64> {
        self.feval(&[x]).as_slice().to_vec()
    }

    /// Value of column `col` at a single point.
    pub fn eval_column(&self, col: usize, x: f64) -> Complex64 {
        self.feval(&[x]).get(0, col)
    }
}

// ============================================================================
// Resizing
// ============================================================================

impl Trigtech {
    /// Resample to `n_out` modes: zero-padding when growing, symmetric
    /// truncation when shrinking. Real columns stay real.
    #[must_use]
    pub fn prolong(&self, n_out: usize) -> Self {
        if n_out == self.len() {
            return self.clone();
        }
        let coeffs = prolong_coeffs(&self.coeffs, n_out);
        let mut values = coeffs2vals(&coeffs);
        values.force_real(&self.is_real);
        Self {
            coeffs,
            values,
            ..self.clone()
        }
    }

    pub fn prolong_coeffs(&self, n_out: usize) -> SpectralArray {
        prolong_coeffs(&self.coeffs, n_out)
    }

    /// Coefficients of the `new_size / 2` modes on either side of zero.
    pub fn truncate(&self, new_size: usize) -> SpectralArray {
        truncate_coeffs(&self.coeffs, new_size)
    }

    /// Chop to the shortest length that still resolves every column to
    /// `eps`. Unhappy representations are returned unchanged.
    #[must_use]
    pub fn simplify(&self) -> Self {
        self.simplify_with(self.eps)
    }

    #[must_use]
    pub fn simplify_with(&self, eps: f64) -> Self {
        if !self.is_happy {
            return self.clone();
        }
        let report = check_happy(&self.coeffs, eps);
        if report.is_happy && report.cutoff < self.len() {
            self.prolong(report.cutoff)
        } else {
            self.clone()
        }
    }
}

// ============================================================================
// Pointwise Transformations
// ============================================================================

impl Trigtech {
    /// Real part; a no-op for real representations.
    #[must_use]
    pub fn real(&self) -> Self {
        if self.is_real() {
            return self.clone();
        }
        let values = self.values.map(|v| Complex64::new(v.re, 0.0));
        let all_real = vec![true; self.cols()];
        if values.as_slice().iter().all(|v| v.re.abs() < self.eps) {
            return self.zeros_like(all_real);
        }
        let coeffs = vals2coeffs(&values);
        Self {
            coeffs,
            values,
            is_real: all_real,
            ..self.clone()
        }
    }

    /// Imaginary part as a real representation.
    #[must_use]
    pub fn imag(&self) -> Self {
        let all_real = vec![true; self.cols()];
        if self.is_real() {
            return self.zeros_like(all_real);
        }
        let values = self.values.map(|v| Complex64::new(v.im, 0.0));
        let coeffs = vals2coeffs(&values);
        Self {
            coeffs,
            values,
            is_real: all_real,
            ..self.clone()
        }
    }

    /// Complex conjugate. Complex columns map c_k to conj(c_-k); for odd
    /// lengths that is a reversal of the column.
    #[must_use]
    pub fn conj(&self) -> Self {
        if self.is_real() {
            return self.clone();
        }
        let n = self.len();
        let mut coeffs = self.coeffs.clone();
        let mut values = self.values.clone();
        for col in 0..self.cols() {
            if self.is_real[col] {
                continue;
            }
            let source = self.coeffs.column(col);
            for (p, out) in coeffs.column_mut(col).iter_mut().enumerate() {
                let mirror = if n % 2 == 1 { n - 1 - p } else { (n - p) % n };
                *out = source[mirror].conj();
            }
            for value in values.column_mut(col) {
                *value = value.conj();
            }
        }
        Self {
            coeffs,
            values,
            ..self.clone()
        }
    }

    /// Index of the largest-modulus coefficient, column-major.
    pub fn argmax(&self) -> usize {
        self.coeffs
            .as_slice()
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(best, max), (i, c)| {
                let norm = c.norm();
                if norm > max { (i, norm) } else { (best, max) }
            })
            .0
    }

    /// Resolve `op(f(x))` column by column.
    pub fn compose(&self, op: impl Fn(Complex64) -> Complex64 + Copy) -> Result<Self> {
        let mut ops = FunctionContainer::new(Vec::new());
        for col in 0..self.cols() {
            ops.push(move |x| op(self.eval_column(col, x)));
        }
        Self::from_container(&ops, &self.options())
    }

    /// Resolve `op(f(x), g(x))`; `g` must have as many columns as `self`.
    pub fn compose_with(
        &self,
        g: &Trigtech,
        op: impl Fn(Complex64, Complex64) -> Complex64 + Copy,
    ) -> Result<Self> {
        if g.cols() != self.cols() {
            return Err(TrigError::shape(
                format!("{} columns", self.cols()),
                format!("{} columns", g.cols()),
            ));
        }
        let mut ops = FunctionContainer::new(Vec::new());
        for col in 0..self.cols() {
            ops.push(move |x| op(self.eval_column(col, x), g.eval_column(col, x)));
        }
        Self::from_container(&ops, &self.options())
    }

    fn zeros_like(&self, is_real: Vec<bool>) -> Self {
        let (n, m) = self.shape();
        Self {
            coeffs: SpectralArray::zeros(n, m),
            values: SpectralArray::zeros(n, m),
            is_real,
            ..self.clone()
        }
    }
}
