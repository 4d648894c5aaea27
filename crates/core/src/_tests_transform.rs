#![cfg(test)]

use std::f64::consts::PI;

use num_complex::Complex64;

use super::array::SpectralArray;
use super::grid::{PeriodicGrid, quadwts, trigpts};
use super::resize::{prolong_coeffs, symmetrize, truncate_coeffs};
use super::transform::{coeffs2vals, const_index, vals2coeffs, wave_numbers};

fn deterministic_array(rows: usize, cols: usize, seed: u64) -> SpectralArray {
    SpectralArray::from_fn(rows, cols, |row, col| {
        let t = (row as f64 + 1.0) * (seed as f64 + 0.5) + 7.0 * col as f64;
        Complex64::new((0.37 * t).sin(), (0.61 * t).cos())
    })
}

fn assert_arrays_close(a: &SpectralArray, b: &SpectralArray, tol: f64) {
    assert_eq!(a.shape(), b.shape(), "shape mismatch");
    for (lhs, rhs) in a.as_slice().iter().zip(b.as_slice()) {
        assert!((*lhs - *rhs).norm() < tol, "arrays differ: {lhs:?} vs {rhs:?}");
    }
}

#[test]
fn zero_mode_index_and_wave_numbers() {
    assert_eq!(const_index(1), 0);
    assert_eq!(const_index(5), 2);
    assert_eq!(const_index(6), 3);
    assert_eq!(wave_numbers(5), vec![-2, -1, 0, 1, 2]);
    assert_eq!(wave_numbers(4), vec![-2, -1, 0, 1]);
}

#[test]
fn grid_points_and_weights() {
    let grid = PeriodicGrid::new(4);
    assert_eq!(grid.points(), vec![-1.0, -0.5, 0.0, 0.5]);
    assert_eq!(trigpts(4), grid.points());
    assert!(quadwts(8).iter().all(|&w| (w - 0.25).abs() < 1e-15));
    assert!((grid.weights().iter().sum::<f64>() - 2.0).abs() < 1e-15);
}

#[test]
fn round_trip_reconstructs_values() {
    for n in 1..=64 {
        let values = deterministic_array(n, 2, n as u64);
        let back = coeffs2vals(&vals2coeffs(&values));
        assert_arrays_close(&back, &values, 1e-10);
    }
}

#[test]
fn single_mode_lands_on_its_wave_number() {
    for n in [7, 8] {
        let x = trigpts(n);
        let values = SpectralArray::from_column(
            x.iter().map(|&xi| Complex64::from_polar(1.0, 2.0 * PI * xi)).collect(),
        );
        let coeffs = vals2coeffs(&values);
        let target = const_index(n) + 2;
        for (row, c) in coeffs.column(0).iter().enumerate() {
            let expected = if row == target { 1.0 } else { 0.0 };
            assert!((c.re - expected).abs() < 1e-12 && c.im.abs() < 1e-12, "n = {n}, row {row}: {c:?}");
        }
    }
}

#[test]
fn prolong_then_restrict_is_identity() {
    for n in [5, 6, 9, 12] {
        let coeffs = vals2coeffs(&deterministic_array(n, 1, 11));
        let long = prolong_coeffs(&coeffs, 2 * n);
        let back = prolong_coeffs(&long, n);
        assert_arrays_close(&back, &coeffs, 1e-12);
    }
}

#[test]
fn prolong_preserves_function_values() {
    let coeffs = vals2coeffs(&deterministic_array(7, 1, 5));
    let long = prolong_coeffs(&coeffs, 21);
    let fine = coeffs2vals(&long);
    let coarse = coeffs2vals(&coeffs);
    // every third fine point is a coarse point
    for j in 0..7 {
        assert!((fine.get(3 * j, 0) - coarse.get(j, 0)).norm() < 1e-12);
    }
}

#[test]
fn symmetrize_splits_nyquist_mode() {
    let coeffs = SpectralArray::from_column(vec![Complex64::new(2.0, 0.0), Complex64::new(1.0, 0.0)]);
    let sym = symmetrize(&coeffs);
    assert_eq!(sym.rows(), 3);
    assert_eq!(sym.get(0, 0), Complex64::new(1.0, 0.0));
    assert_eq!(sym.get(1, 0), Complex64::new(1.0, 0.0));
    assert_eq!(sym.get(2, 0), Complex64::new(1.0, 0.0));
}

#[test]
fn truncate_keeps_modes_around_zero() {
    let coeffs = SpectralArray::from_column((0..9).map(|v| Complex64::new(v as f64, 0.0)).collect());
    let cut = truncate_coeffs(&coeffs, 4);
    let kept: Vec<f64> = cut.column(0).iter().map(|c| c.re).collect();
    assert_eq!(kept, vec![2.0, 3.0, 4.0, 5.0]);
}
