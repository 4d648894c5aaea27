//! Coefficient-space resizing.
//!
//! Even lengths carry a lone Nyquist coefficient at row 0 (k = -n/2) that
//! stands for both ±n/2. Before any resize it is split in half across the two
//! band edges, which makes the column odd and symmetric around the zero mode.
//! Padding and truncation then add or remove rows symmetrically.

use crate::array::SpectralArray;
use crate::transform::const_index;

/// Resize `coeffs` to `n_out` rows.
///
/// Growing is exact: only zero high-frequency modes are added. Shrinking
/// drops the outermost modes; when an odd column is cut to even length the
/// surviving edge coefficient is doubled so it again represents both ±n/2.
pub fn prolong_coeffs(coeffs: &SpectralArray, n_out: usize) -> SpectralArray {
    let n_in = coeffs.rows();
    if n_out == n_in {
        return coeffs.clone();
    }
    if n_in == 0 {
        return SpectralArray::zeros(n_out, coeffs.cols());
    }

    let symmetric = symmetrize(coeffs);
    let n_sym = symmetric.rows();
    if n_out == n_sym {
        return symmetric;
    }

    if n_out > n_sym {
        let grow = n_out - n_sym;
        let top = grow.div_ceil(2);
        let bottom = grow / 2;
        return symmetric.pad_rows(top, bottom);
    }

    let shrink = n_sym - n_out;
    let top = shrink / 2;
    let bottom = shrink.div_ceil(2);
    let mut out = symmetric.row_range(top, n_sym - bottom);
    if top < bottom && out.rows() > 0 {
        for col in 0..out.cols() {
            *out.get_mut(0, col) *= 2.0;
        }
    }
    out
}

/// Split the Nyquist row of an even-length array across both band edges.
/// Odd-length input is returned unchanged.
pub fn symmetrize(coeffs: &SpectralArray) -> SpectralArray {
    let n = coeffs.rows();
    if n % 2 == 1 || n == 0 {
        return coeffs.clone();
    }
    SpectralArray::from_fn(n + 1, coeffs.cols(), |row, col| {
        if row == 0 || row == n {
            coeffs.get(0, col) * 0.5
        } else {
            coeffs.get(row, col)
        }
    })
}

/// Keep `2 * (new_size / 2)` coefficients centred on the zero mode: the
/// `new_size / 2` modes below it and the zero mode plus the ones above it.
pub fn truncate_coeffs(coeffs: &SpectralArray, new_size: usize) -> SpectralArray {
    let n = coeffs.rows();
    let ci = const_index(n);
    let k = (new_size / 2).min(ci).min(n - ci);
    coeffs.row_range(ci - k, ci + k)
}
