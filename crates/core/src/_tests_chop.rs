#![cfg(test)]

use num_complex::Complex64;

use super::array::SpectralArray;
use super::chop::{MIN_CHOP_LENGTH, check_happy, fold_coefficients, standard_chop};
use super::grid::trigpts;
use super::transform::vals2coeffs;

fn geometric(n: usize, ratio: f64) -> Vec<f64> {
    (0..n).map(|j| ratio.powi(j as i32)).collect()
}

fn sampled(n: usize, f: impl Fn(f64) -> f64) -> SpectralArray {
    let values: Vec<f64> = trigpts(n).into_iter().map(f).collect();
    vals2coeffs(&SpectralArray::from_real_column(&values))
}

#[test]
fn short_sequences_are_never_chopped() {
    let coeffs = geometric(MIN_CHOP_LENGTH - 1, 1e-3);
    assert_eq!(standard_chop(&coeffs, 1e-10), coeffs.len());
}

#[test]
fn rapidly_decaying_sequence_is_chopped() {
    let mut coeffs = geometric(64, 0.1);
    for c in coeffs.iter_mut().skip(20) {
        *c = 1e-17;
    }
    let cutoff = standard_chop(&coeffs, 1e-10);
    assert!(cutoff < coeffs.len(), "cutoff = {cutoff}");
    assert!(cutoff >= 10, "kept too little: {cutoff}");
}

#[test]
fn slowly_decaying_sequence_is_kept() {
    let coeffs = geometric(32, 0.9);
    assert_eq!(standard_chop(&coeffs, 1e-10), coeffs.len());
}

#[test]
fn zero_sequence_chops_to_one() {
    assert_eq!(standard_chop(&vec![0.0; 40], 1e-10), 1);
}

#[test]
fn fold_pairs_opposite_modes() {
    let column: Vec<Complex64> = [1.0, 2.0, 3.0, 4.0, 5.0]
        .iter()
        .map(|&v| Complex64::new(v, 0.0))
        .collect();
    assert_eq!(fold_coefficients(&column), vec![3.0, 6.0, 6.0, 6.0, 6.0]);

    let even: Vec<Complex64> = [1.0, 2.0, 3.0, 4.0]
        .iter()
        .map(|&v| Complex64::new(v, 0.0))
        .collect();
    // Nyquist (row 0) has no partner
    assert_eq!(fold_coefficients(&even), vec![3.0, 6.0, 6.0, 1.0, 1.0]);
}

#[test]
fn smooth_function_is_happy_with_odd_cutoff() {
    let coeffs = sampled(64, |x| (std::f64::consts::PI * x).sin());
    let report = check_happy(&coeffs, 1e-10);
    assert!(report.is_happy);
    assert_eq!(report.cutoff % 2, 1);
    assert!(report.cutoff < 64);
}

#[test]
fn every_column_is_reported() {
    let smooth = sampled(32, |x| (std::f64::consts::PI * x).cos());
    let rough = sampled(32, |x| if x < 0.0 { 1.0 } else { -1.0 });
    let both = SpectralArray::from_columns(&[rough.column(0).to_vec(), smooth.column(0).to_vec()]);
    let report = check_happy(&both, 1e-10);

    assert!(!report.is_happy);
    assert_eq!(report.column_happy, vec![false, true]);
    assert_eq!(report.column_cutoffs.len(), 2);
    assert!(report.column_cutoffs[1] < 32);
}
