#![cfg(test)]

use std::f64::consts::PI;

use num_complex::Complex64;

use super::array::SpectralArray;
use super::backend::{CpuBackend, SpectralBackend, cpu_backend};
use super::transform::{coeffs2vals, coeffs2vals_with, vals2coeffs, vals2coeffs_with};

/// Naive O(n²) DFT used to cross-check the FFT backend.
#[derive(Clone)]
struct TestBackend;

impl TestBackend {
    fn discrete_fft(buffer: &mut [Complex64], inverse: bool) {
        let n = buffer.len();
        let sign = if inverse { 1.0 } else { -1.0 };
        let input = buffer.to_vec();
        for (q, out) in buffer.iter_mut().enumerate() {
            *out = input
                .iter()
                .enumerate()
                .map(|(j, &x)| x * Complex64::from_polar(1.0, sign * 2.0 * PI * (q * j) as f64 / n as f64))
                .sum();
        }
    }
}

impl SpectralBackend for TestBackend {
    fn forward_fft(&self, buffer: &mut [Complex64]) {
        Self::discrete_fft(buffer, false);
    }

    fn inverse_fft(&self, buffer: &mut [Complex64]) {
        Self::discrete_fft(buffer, true);
    }
}

fn deterministic_column(n: usize, seed: u64) -> Vec<Complex64> {
    (0..n)
        .map(|idx| {
            let t = (idx as f64 + 1.0) * (seed as f64 + 0.5);
            Complex64::new((0.37 * t).sin(), (0.61 * t).cos())
        })
        .collect()
}

fn assert_slices_close(a: &[Complex64], b: &[Complex64], tol: f64) {
    assert_eq!(a.len(), b.len(), "length mismatch");
    for (lhs, rhs) in a.iter().zip(b) {
        assert!((*lhs - *rhs).norm() < tol, "values differ: {lhs:?} vs {rhs:?}");
    }
}

#[test]
fn cpu_forward_matches_naive_dft() {
    let backend = CpuBackend::new();
    for n in 1..=24 {
        let input = deterministic_column(n, n as u64);
        let mut fast = input.clone();
        let mut slow = input;
        backend.forward_fft(&mut fast);
        TestBackend.forward_fft(&mut slow);
        assert_slices_close(&fast, &slow, 1e-10 * n as f64);
    }
}

#[test]
fn cpu_inverse_matches_naive_dft() {
    for n in [1, 2, 7, 16, 33] {
        let input = deterministic_column(n, 3);
        let mut fast = input.clone();
        let mut slow = input;
        cpu_backend().inverse_fft(&mut fast);
        TestBackend.inverse_fft(&mut slow);
        assert_slices_close(&fast, &slow, 1e-10 * n as f64);
    }
}

#[test]
fn transforms_agree_across_backends() {
    let values = SpectralArray::from_columns(&[deterministic_column(12, 1), deterministic_column(12, 2)]);
    let coeffs = vals2coeffs(&values);
    let naive = vals2coeffs_with(&TestBackend, &values);
    assert_slices_close(coeffs.as_slice(), naive.as_slice(), 1e-12);

    let back = coeffs2vals_with(&TestBackend, &coeffs);
    assert_slices_close(coeffs2vals(&coeffs).as_slice(), back.as_slice(), 1e-12);
}

#[test]
fn default_vector_helpers() {
    let backend = TestBackend;
    let x = vec![Complex64::new(1.0, 1.0), Complex64::new(0.0, 2.0)];
    let mut y = vec![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)];

    backend.axpy(Complex64::new(2.0, 0.0), &x, &mut y);
    assert_slices_close(&y, &[Complex64::new(3.0, 2.0), Complex64::new(1.0, 4.0)], 1e-15);

    backend.scale(Complex64::new(0.0, 1.0), &mut y);
    assert_slices_close(&y, &[Complex64::new(-2.0, 3.0), Complex64::new(-4.0, 1.0)], 1e-15);

    // ⟨x, x⟩ = |1+i|² + |2i|²
    let dot = backend.dot(&x, &x);
    assert!((dot - Complex64::new(6.0, 0.0)).norm() < 1e-15);
}
