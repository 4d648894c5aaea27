//! Coefficient chopping and the happiness check.
//!
//! [`standard_chop`] finds where a decaying coefficient sequence reaches a
//! noise plateau (Aurentz & Trefethen, "Chopping a Chebyshev series", 2017).
//! It expects coefficients ordered by increasing degree, so [`check_happy`]
//! first folds each Fourier column into that order by pairing the ±k modes.

use num_complex::Complex64;
use rayon::prelude::*;

use crate::array::SpectralArray;
use crate::transform::const_index;

/// Sequences shorter than this are never considered resolved.
pub const MIN_CHOP_LENGTH: usize = 17;

/// Number of leading coefficients worth keeping.
///
/// Returns `coeffs.len()` when no plateau below `tol` is found, which callers
/// read as "not resolved".
pub fn standard_chop(coeffs: &[f64], tol: f64) -> usize {
    let n = coeffs.len();
    if tol >= 1.0 {
        return 1;
    }
    if n < MIN_CHOP_LENGTH {
        return n;
    }

    // Step 1: monotone envelope, normalized to start at 1.
    let mut envelope = vec![0.0; n];
    envelope[n - 1] = coeffs[n - 1].abs();
    for j in (0..n - 1).rev() {
        envelope[j] = coeffs[j].abs().max(envelope[j + 1]);
    }
    if envelope[0] == 0.0 {
        return 1;
    }
    let head = envelope[0];
    for value in &mut envelope {
        *value /= head;
    }

    // Step 2: scan for a plateau. Indices below are 1-based to keep the
    // published constants intact.
    let log_tol = tol.ln();
    let mut plateau_point = 0;
    let mut j2 = 0;
    for j in 2..=n {
        j2 = (1.25 * j as f64 + 5.0).round() as usize;
        if j2 > n {
            return n;
        }
        let e1 = envelope[j - 1];
        let e2 = envelope[j2 - 1];
        let r = 3.0 * (1.0 - e1.ln() / log_tol);
        if e1 == 0.0 || e2 / e1 > r {
            plateau_point = j - 1;
            break;
        }
    }
    if plateau_point == 0 {
        return n;
    }

    // Step 3: pick the cutoff just before the plateau, tilted towards longer
    // expansions so noise-level coefficients are not kept.
    if envelope[plateau_point - 1] == 0.0 {
        return plateau_point;
    }
    let floor = tol.powf(7.0 / 6.0);
    let j3 = envelope.iter().filter(|&&e| e >= floor).count();
    if j3 < j2 {
        j2 = j3 + 1;
        envelope[j2 - 1] = floor;
    }
    let tilt = -tol.log10() / 3.0;
    let mut best = f64::INFINITY;
    let mut d = 1;
    for (i, e) in envelope.iter().take(j2).enumerate() {
        let ramp = if j2 > 1 {
            tilt * i as f64 / (j2 - 1) as f64
        } else {
            0.0
        };
        let cc = e.log10() + ramp;
        if cc < best {
            best = cc;
            d = i + 1;
        }
    }
    d.saturating_sub(1).max(1)
}

/// Fold a Fourier column into increasing-|k| order:
/// `[|c_0|, s_1, s_1, s_2, s_2, ...]` with `s_j = |c_j| + |c_-j|`.
///
/// The doubling mimics a Chebyshev sequence of the same resolution so the
/// plateau detector sees comparable lengths. Odd n gives n entries, even n
/// gives n + 1 (the Nyquist mode has no partner).
pub fn fold_coefficients(column: &[Complex64]) -> Vec<f64> {
    let n = column.len();
    if n == 0 {
        return Vec::new();
    }
    let ci = const_index(n);
    let mut folded = Vec::with_capacity(n + 1);
    folded.push(column[ci].norm());
    let top = if n % 2 == 1 { (n - 1) / 2 } else { n / 2 };
    for j in 1..=top {
        let negative = column[ci - j].norm();
        let positive = if ci + j < n { column[ci + j].norm() } else { 0.0 };
        let s = negative + positive;
        folded.push(s);
        folded.push(s);
    }
    folded
}

/// Outcome of [`check_happy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HappinessReport {
    /// Every column resolved.
    pub is_happy: bool,
    /// Shared odd length `2 * max(half cutoffs) + 1`.
    pub cutoff: usize,
    pub column_happy: Vec<bool>,
    /// Raw `standard_chop` output per column, on the folded sequence.
    pub column_cutoffs: Vec<usize>,
}

/// Decide whether `coeffs` resolve their functions to `tol`, and the
/// shortest odd length that keeps every column's significant modes.
///
/// Columns are chopped independently and then reduced; every column is
/// evaluated even when an earlier one is unhappy.
pub fn check_happy(coeffs: &SpectralArray, tol: f64) -> HappinessReport {
    let n = coeffs.rows();
    let per_column: Vec<(bool, usize)> = (0..coeffs.cols())
        .into_par_iter()
        .map(|col| {
            let folded = fold_coefficients(coeffs.column(col));
            let cutoff = standard_chop(&folded, tol);
            (cutoff < n, cutoff)
        })
        .collect();

    let column_happy: Vec<bool> = per_column.iter().map(|&(happy, _)| happy).collect();
    let column_cutoffs: Vec<usize> = per_column.iter().map(|&(_, cutoff)| cutoff).collect();
    let half = column_cutoffs
        .iter()
        .map(|&c| if c % 2 == 0 { c / 2 } else { (c - 1) / 2 })
        .max()
        .unwrap_or(0);

    HappinessReport {
        is_happy: !column_happy.is_empty() && column_happy.iter().all(|&h| h),
        cutoff: 2 * half + 1,
        column_happy,
        column_cutoffs,
    }
}
