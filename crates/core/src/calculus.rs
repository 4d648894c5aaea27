//! Calculus in coefficient space.
//!
//! Differentiation and antidifferentiation multiply each mode by a power of
//! `iπk`; integrals and inner products use the zero mode and trapezoidal
//! quadrature, which is exact for trigonometric polynomials of sufficiently
//! low degree.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::array::SpectralArray;
use crate::backend::{SpectralBackend, cpu_backend};
use crate::error::{Result, TrigError};
use crate::grid::quadwts;
use crate::linalg::DenseMatrix;
use crate::resize::symmetrize;
use crate::transform::{coeffs2vals, const_index, wave_numbers};
use crate::trigtech::Trigtech;

const I: Complex64 = Complex64::new(0.0, 1.0);

// ============================================================================
// Derivatives and Integrals
// ============================================================================

impl Trigtech {
    /// `order`-th derivative: c_k -> (iπk)^order c_k.
    ///
    /// The result is not marked happy; call [`Trigtech::simplify`] on it if a
    /// compact representation is needed.
    #[must_use]
    pub fn diff(&self, order: u32) -> Trigtech {
        if order == 0 {
            return self.clone();
        }
        let ks = wave_numbers(self.len());
        let factors: Vec<Complex64> = ks
            .iter()
            .map(|&k| (I * PI * k as f64).powu(order))
            .collect();
        let (n, m) = self.shape();
        let coeffs = SpectralArray::from_fn(n, m, |row, col| self.coeffs().get(row, col) * factors[row]);
        self.derived(coeffs, false, Some(self.real_columns().to_vec()))
    }

    /// `order`-fold antiderivative normalized so that F(-1) = 0.
    ///
    /// Only zero-mean functions have periodic antiderivatives; any column
    /// whose mean exceeds `10 * vscale * eps` fails with
    /// [`TrigError::MeanNotZero`].
    pub fn cumsum(&self, order: u32) -> Result<Trigtech> {
        let (n, m) = self.shape();
        if order == 0 || n == 0 {
            return Ok(self.clone());
        }
        let ci = const_index(n);
        let threshold = 10.0 * self.vscale_max() * self.eps();
        for col in 0..m {
            let mean = self.coeffs().get(ci, col).norm();
            if mean > threshold {
                return Err(TrigError::MeanNotZero { column: col, mean });
            }
        }

        let even = n % 2 == 0;
        let mut c = self.coeffs().clone();
        for col in 0..m {
            *c.get_mut(ci, col) = Complex64::default();
        }
        // Even lengths: split the Nyquist mode so the modes run over
        // -h..=h symmetrically. The extra row is folded back at the end.
        let mut c = if even { symmetrize(&c) } else { c };
        let h = (c.rows() - 1) / 2;

        let factors: Vec<Complex64> = (0..c.rows())
            .map(|row| {
                let k = row as i64 - h as i64;
                if k == 0 {
                    Complex64::default()
                } else {
                    (-I / (k as f64 * PI)).powu(order)
                }
            })
            .collect();
        for col in 0..m {
            for (value, factor) in c.column_mut(col).iter_mut().zip(&factors) {
                *value *= factor;
            }
        }
        // Odd-order antiderivatives of an even-length input pick up a sine
        // Nyquist term that is invisible on the grid.
        if order % 2 == 1 && even {
            for col in 0..m {
                *c.get_mut(0, col) = Complex64::default();
                *c.get_mut(n, col) = Complex64::default();
            }
        }

        for col in 0..m {
            let at_left: Complex64 = c
                .column(col)
                .iter()
                .enumerate()
                .map(|(row, &v)| if (row + h) % 2 == 0 { v } else { -v })
                .sum();
            *c.get_mut(h, col) = -at_left;
        }

        if even {
            for col in 0..m {
                let top = c.get(n, col);
                *c.get_mut(0, col) += top;
            }
            c = c.row_range(0, n);
        }
        Ok(self.derived(c, self.is_happy(), Some(self.real_columns().to_vec())))
    }

    /// Definite integral over [-1, 1) per column: twice the mean coefficient.
    pub fn sum(&self) -> Vec<Complex64> {
        let ci = self.const_index();
        (0..self.cols())
            .map(|col| {
                let value = self.coeffs().get(ci, col) * 2.0;
                if self.real_columns()[col] {
                    Complex64::new(value.re, 0.0)
                } else {
                    value
                }
            })
            .collect()
    }
}

// ============================================================================
// Inner Products and Norms
// ============================================================================

/// Gram matrix `out[i][j] = ∫ conj(f_i) g_j dx` over all column pairs.
///
/// Both operands are resampled to `len(f) + len(g)` points, enough for the
/// trapezoidal rule to integrate the product exactly.
pub fn inner(f: &Trigtech, g: &Trigtech) -> DenseMatrix {
    let n = f.len() + g.len();
    let fvalues = values_at(f, n);
    let gvalues = values_at(g, n);
    let w = quadwts(n);
    let real = f.is_real() && g.is_real();

    DenseMatrix::from_fn(f.cols(), g.cols(), |i, j| {
        let fi = fvalues.column(i);
        let gj = gvalues.column(j);
        let value: Complex64 = fi
            .iter()
            .zip(gj)
            .zip(&w)
            .map(|((a, b), &wk)| a.conj() * b * wk)
            .sum();
        if real { Complex64::new(value.re, 0.0) } else { value }
    })
}

/// Alias of [`inner`].
pub fn dot(f: &Trigtech, g: &Trigtech) -> DenseMatrix {
    inner(f, g)
}

fn values_at(f: &Trigtech, n: usize) -> SpectralArray {
    let mut values = coeffs2vals(&f.prolong_coeffs(n));
    values.force_real(f.real_columns());
    values
}

/// L2 norm over all columns together.
pub fn norm(f: &Trigtech) -> f64 {
    let gram = inner(f, f);
    (0..f.cols())
        .map(|k| gram.get(k, k).re)
        .sum::<f64>()
        .max(0.0)
        .sqrt()
}

/// `sqrt(‖f‖² + ‖f'‖²)`.
pub fn h1norm(f: &Trigtech) -> f64 {
    let l2 = norm(f);
    let d1 = norm(&f.diff(1));
    l2.hypot(d1)
}

// ============================================================================
// Differentiation Matrices
// ============================================================================

/// `k`-th order differentiation matrix acting on values at `trigpts(n)`.
///
/// The matrix is Toeplitz (in fact circulant) and maps samples of a
/// trigonometric interpolant to samples of its derivative.
pub fn diffmat(n: usize, k: u32) -> DenseMatrix {
    if k == 0 || n <= 1 {
        return if k == 0 {
            DenseMatrix::identity(n)
        } else {
            DenseMatrix::zeros(n, n)
        };
    }
    let h = 2.0 * PI / n as f64;
    let odd = n % 2 == 1;
    let sign = |j: usize| if j % 2 == 0 { 1.0 } else { -1.0 };

    let col: Vec<f64> = match k {
        1 => (0..n)
            .map(|j| {
                if j == 0 {
                    return 0.0;
                }
                let v = j as f64 * h / 2.0;
                let t = if odd { 1.0 / v.sin() } else { 1.0 / v.tan() };
                0.5 * PI * sign(j) * t
            })
            .collect(),
        2 => (0..n)
            .map(|j| {
                if j == 0 {
                    let corner = if odd { 1.0 / 12.0 } else { -1.0 / 6.0 };
                    return PI * PI * (-PI * PI / (3.0 * h * h) + corner);
                }
                let v = j as f64 * h / 2.0;
                let t = if odd {
                    1.0 / (v.sin() * v.tan())
                } else {
                    1.0 / v.sin().powi(2)
                };
                -0.5 * PI * PI * sign(j) * t
            })
            .collect(),
        _ => spectral_column(n, k),
    };

    let col: Vec<Complex64> = col.into_iter().map(|v| Complex64::new(v, 0.0)).collect();
    let row: Vec<Complex64> = (0..n)
        .map(|j| if j == 0 { col[0] } else { col[n - j] })
        .collect();
    DenseMatrix::toeplitz(&col, &row)
}

/// First column of the k-th derivative matrix via the FFT, with the
/// Nyquist mode dropped.
fn spectral_column(n: usize, k: u32) -> Vec<f64> {
    let n1 = (n - 1) / 2;
    let mut symbol: Vec<Complex64> = (0..n)
        .map(|q| {
            let wave = if q <= n1 {
                q as f64
            } else if n % 2 == 0 && q == n / 2 {
                0.0
            } else {
                q as f64 - n as f64
            };
            (I * wave).powu(k)
        })
        .collect();
    cpu_backend().inverse_fft(&mut symbol);
    let scale = PI.powi(k as i32) / n as f64;
    let mut col: Vec<f64> = symbol.iter().map(|v| v.re * scale).collect();
    if k % 2 == 1 {
        col[0] = 0.0;
    }
    col
}
