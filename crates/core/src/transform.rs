//! Values ↔ Fourier coefficients on the equispaced periodic grid.
//!
//! A column of n coefficients represents
//!
//! ```text
//! f(x) = Σ_k c_k exp(iπkx),   x ∈ [-1, 1)
//! ```
//!
//! with k ascending: k = -(n-1)/2 ..= (n-1)/2 for odd n and k = -n/2 ..= n/2-1
//! for even n. The zero mode therefore sits at [`const_index`]. Sampling at
//! x_j = -1 + 2j/n gives f(x_j) = Σ_k (-1)^k c_k exp(2πi kj/n), so both
//! directions reduce to one unnormalized FFT plus a sign flip and a shift.

use num_complex::Complex64;

use crate::array::SpectralArray;
use crate::backend::{SpectralBackend, cpu_backend};

/// Row index of the zero-frequency coefficient.
#[inline]
pub fn const_index(n: usize) -> usize {
    if n % 2 == 1 { (n + 1) / 2 - 1 } else { n / 2 }
}

/// Wave numbers k attached to each coefficient row, ascending.
pub fn wave_numbers(n: usize) -> Vec<i64> {
    let offset = const_index(n) as i64;
    (0..n as i64).map(|p| p - offset).collect()
}

#[inline]
fn alternating(k: i64) -> f64 {
    if k.rem_euclid(2) == 0 { 1.0 } else { -1.0 }
}

pub fn vals2coeffs(values: &SpectralArray) -> SpectralArray {
    vals2coeffs_with(cpu_backend(), values)
}

pub fn coeffs2vals(coeffs: &SpectralArray) -> SpectralArray {
    coeffs2vals_with(cpu_backend(), coeffs)
}

pub fn vals2coeffs_with<B: SpectralBackend>(backend: &B, values: &SpectralArray) -> SpectralArray {
    let (n, m) = values.shape();
    let mut coeffs = SpectralArray::zeros(n, m);
    if n == 0 {
        return coeffs;
    }
    let ks = wave_numbers(n);
    let scale = 1.0 / n as f64;
    let mut buffer = vec![Complex64::default(); n];
    for col in 0..m {
        buffer.copy_from_slice(values.column(col));
        backend.forward_fft(&mut buffer);
        for (out, &k) in coeffs.column_mut(col).iter_mut().zip(&ks) {
            let q = k.rem_euclid(n as i64) as usize;
            *out = buffer[q] * (alternating(k) * scale);
        }
    }
    coeffs
}

pub fn coeffs2vals_with<B: SpectralBackend>(backend: &B, coeffs: &SpectralArray) -> SpectralArray {
    let (n, m) = coeffs.shape();
    let mut values = SpectralArray::zeros(n, m);
    if n == 0 {
        return values;
    }
    let ks = wave_numbers(n);
    let mut buffer = vec![Complex64::default(); n];
    for col in 0..m {
        for (&c, &k) in coeffs.column(col).iter().zip(&ks) {
            let q = k.rem_euclid(n as i64) as usize;
            buffer[q] = c * alternating(k);
        }
        backend.inverse_fft(&mut buffer);
        values.column_mut(col).copy_from_slice(&buffer);
    }
    values
}
