//! Contiguous complex-valued column storage.
//!
//! A [`SpectralArray`] holds `cols` functions side by side, each represented
//! by `rows` samples or Fourier coefficients. Storage is column-major so every
//! column is a contiguous slice that can be handed to the FFT directly.

use num_complex::Complex64;

#[derive(Debug, Clone, PartialEq)]
pub struct SpectralArray {
    rows: usize,
    cols: usize,
    data: Vec<Complex64>,
}

impl SpectralArray {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Complex64::default(); rows * cols],
        }
    }

    /// Build from column-major data.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<Complex64>) -> Self {
        assert_eq!(data.len(), rows * cols, "data length must match array shape");
        Self { rows, cols, data }
    }

    /// Build from a set of equally long columns.
    pub fn from_columns(columns: &[Vec<Complex64>]) -> Self {
        let cols = columns.len();
        let rows = columns.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows * cols);
        for column in columns {
            assert_eq!(column.len(), rows, "all columns must have equal length");
            data.extend_from_slice(column);
        }
        Self { rows, cols, data }
    }

    pub fn from_column(column: Vec<Complex64>) -> Self {
        let rows = column.len();
        Self::from_vec(rows, 1, column)
    }

    /// Real samples promoted to complex storage.
    pub fn from_real_column(column: &[f64]) -> Self {
        Self::from_column(column.iter().map(|&v| Complex64::new(v, 0.0)).collect())
    }

    /// Build by evaluating `f(row, col)` at every entry.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Complex64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for col in 0..cols {
            for row in 0..rows {
                data.push(f(row, col));
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn idx(&self, row: usize, col: usize) -> usize {
        col * self.rows + row
    }

    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[self.idx(row, col)]
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut Complex64 {
        let idx = self.idx(row, col);
        &mut self.data[idx]
    }

    pub fn column(&self, col: usize) -> &[Complex64] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    pub fn column_mut(&mut self, col: usize) -> &mut [Complex64] {
        let rows = self.rows;
        &mut self.data[col * rows..(col + 1) * rows]
    }

    pub fn columns(&self) -> impl Iterator<Item = &[Complex64]> {
        // chunks_exact panics on a zero chunk size; an empty array yields nothing
        self.data.chunks_exact(self.rows.max(1))
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Complex64] {
        &mut self.data
    }

    /// Copy of a contiguous block of rows.
    pub fn row_range(&self, start: usize, end: usize) -> Self {
        assert!(start <= end && end <= self.rows, "row range out of bounds");
        Self::from_fn(end - start, self.cols, |row, col| self.get(start + row, col))
    }

    /// Stack `top` zero rows above and `bottom` zero rows below.
    pub fn pad_rows(&self, top: usize, bottom: usize) -> Self {
        let rows = self.rows + top + bottom;
        Self::from_fn(rows, self.cols, |row, col| {
            if row < top || row >= top + self.rows {
                Complex64::default()
            } else {
                self.get(row - top, col)
            }
        })
    }

    /// Apply `f` to every entry.
    pub fn map(&self, mut f: impl FnMut(Complex64) -> Complex64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Zero the imaginary part of every column flagged real.
    pub fn force_real(&mut self, is_real: &[bool]) {
        for (col, &real) in is_real.iter().enumerate().take(self.cols) {
            if real {
                for value in self.column_mut(col) {
                    value.im = 0.0;
                }
            }
        }
    }

    /// Largest modulus in each column.
    pub fn column_max_abs(&self) -> Vec<f64> {
        self.columns()
            .map(|column| column.iter().map(|v| v.norm()).fold(0.0, f64::max))
            .collect()
    }

    /// Largest |Im| in each column.
    pub fn column_max_imag(&self) -> Vec<f64> {
        self.columns()
            .map(|column| column.iter().map(|v| v.im.abs()).fold(0.0, f64::max))
            .collect()
    }
}

impl From<SpectralArray> for Vec<Complex64> {
    fn from(array: SpectralArray) -> Self {
        array.data
    }
}
