//! Small dense and sparse complex linear algebra.
//!
//! The deflation operators only need matrix-vector products, transposes,
//! Toeplitz construction and an occasional direct solve, so this module
//! keeps to those.

use num_complex::Complex64;

use crate::error::{Result, TrigError};

/// Pivots below this modulus are treated as exact zeros.
const PIVOT_TOLERANCE: f64 = 1e-300;

// ============================================================================
// Linear Operator
// ============================================================================

/// Matrix-free linear map on complex vectors.
pub trait LinearOperator {
    /// `(rows, cols)`: `matvec` maps `cols`-vectors to `rows`-vectors.
    fn shape(&self) -> (usize, usize);

    fn matvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>>;

    /// Transpose action (no conjugation).
    fn rmatvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>>;

    /// Materialize by applying the operator to every unit vector.
    fn to_dense(&self) -> Result<DenseMatrix> {
        let (rows, cols) = self.shape();
        let mut out = DenseMatrix::zeros(rows, cols);
        let mut unit = vec![Complex64::default(); cols];
        for j in 0..cols {
            unit[j] = Complex64::new(1.0, 0.0);
            let column = self.matvec(&unit)?;
            unit[j] = Complex64::default();
            for (i, value) in column.into_iter().enumerate() {
                out.set(i, j, value);
            }
        }
        Ok(out)
    }
}

pub(crate) fn check_len(expected: usize, x: &[Complex64]) -> Result<()> {
    if x.len() == expected {
        Ok(())
    } else {
        Err(TrigError::shape(
            format!("vector of length {expected}"),
            format!("length {}", x.len()),
        ))
    }
}

// ============================================================================
// Dense Matrix
// ============================================================================

/// Row-major dense complex matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Complex64>,
}

impl DenseMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Complex64::default(); rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        Self::from_diagonal(&vec![Complex64::new(1.0, 0.0); n])
    }

    pub fn from_diagonal(diagonal: &[Complex64]) -> Self {
        let n = diagonal.len();
        let mut out = Self::zeros(n, n);
        for (i, &d) in diagonal.iter().enumerate() {
            out.set(i, i, d);
        }
        out
    }

    pub fn from_rows(rows: &[Vec<Complex64>]) -> Self {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            assert_eq!(row.len(), n_cols, "all rows must have equal length");
            data.extend_from_slice(row);
        }
        Self {
            rows: n_rows,
            cols: n_cols,
            data,
        }
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Complex64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// `T[i][j] = col[i - j]` below the diagonal, `row[j - i]` above it.
    /// `row[0]` is ignored in favour of `col[0]`.
    pub fn toeplitz(col: &[Complex64], row: &[Complex64]) -> Self {
        Self::from_fn(col.len(), row.len(), |i, j| {
            if i >= j { col[i - j] } else { row[j - i] }
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, i: usize, j: usize) -> Complex64 {
        self.data[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: Complex64) {
        self.data[i * self.cols + j] = value;
    }

    pub fn row(&self, i: usize) -> &[Complex64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.get(j, i))
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.get(j, i).conj())
    }

    /// Append `column` as a new rightmost column.
    pub fn hstack_column(&self, column: &[Complex64]) -> Result<DenseMatrix> {
        check_len(self.rows, column)?;
        Ok(Self::from_fn(self.rows, self.cols + 1, |i, j| {
            if j < self.cols { self.get(i, j) } else { column[i] }
        }))
    }

    /// Append `row` as a new bottom row.
    pub fn vstack_row(&self, row: &[Complex64]) -> Result<DenseMatrix> {
        check_len(self.cols, row)?;
        let mut data = self.data.clone();
        data.extend_from_slice(row);
        Ok(Self {
            rows: self.rows + 1,
            cols: self.cols,
            data,
        })
    }

    /// Solve `A x = b` by LU factorization with partial pivoting.
    pub fn solve(&self, b: &[Complex64]) -> Result<Vec<Complex64>> {
        if self.rows != self.cols {
            return Err(TrigError::shape(
                "square matrix",
                format!("{}x{}", self.rows, self.cols),
            ));
        }
        check_len(self.rows, b)?;
        let n = self.rows;
        let mut a = self.data.clone();
        let mut x = b.to_vec();

        for k in 0..n {
            let pivot_row = (k..n)
                .max_by(|&p, &q| a[p * n + k].norm().total_cmp(&a[q * n + k].norm()))
                .unwrap_or(k);
            let pivot = a[pivot_row * n + k];
            if pivot.norm() <= PIVOT_TOLERANCE {
                return Err(TrigError::Singular { pivot: k });
            }
            if pivot_row != k {
                for j in 0..n {
                    a.swap(k * n + j, pivot_row * n + j);
                }
                x.swap(k, pivot_row);
            }
            for i in k + 1..n {
                let factor = a[i * n + k] / pivot;
                if factor == Complex64::default() {
                    continue;
                }
                for j in k..n {
                    let upper = a[k * n + j];
                    a[i * n + j] -= factor * upper;
                }
                let xk = x[k];
                x[i] -= factor * xk;
            }
        }

        for k in (0..n).rev() {
            let tail: Complex64 = (k + 1..n).map(|j| a[k * n + j] * x[j]).sum();
            x[k] = (x[k] - tail) / a[k * n + k];
        }
        Ok(x)
    }
}

impl LinearOperator for DenseMatrix {
    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn matvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        check_len(self.cols, x)?;
        Ok((0..self.rows)
            .map(|i| self.row(i).iter().zip(x).map(|(a, b)| a * b).sum())
            .collect())
    }

    fn rmatvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        check_len(self.rows, x)?;
        let mut out = vec![Complex64::default(); self.cols];
        for (i, &xi) in x.iter().enumerate() {
            for (o, &a) in out.iter_mut().zip(self.row(i)) {
                *o += a * xi;
            }
        }
        Ok(out)
    }

    fn to_dense(&self) -> Result<DenseMatrix> {
        Ok(self.clone())
    }
}

// ============================================================================
// Sparse Matrix (CSR)
// ============================================================================

/// Compressed sparse row matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<Complex64>,
}

impl CsrMatrix {
    /// Keep every entry that is not exactly zero.
    pub fn from_dense(dense: &DenseMatrix) -> Self {
        let mut indptr = Vec::with_capacity(dense.rows() + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();
        indptr.push(0);
        for i in 0..dense.rows() {
            for (j, &v) in dense.row(i).iter().enumerate() {
                if v != Complex64::default() {
                    indices.push(j);
                    values.push(v);
                }
            }
            indptr.push(indices.len());
        }
        Self {
            rows: dense.rows(),
            cols: dense.cols(),
            indptr,
            indices,
            values,
        }
    }

    pub fn from_diagonal(diagonal: &[Complex64]) -> Self {
        let n = diagonal.len();
        Self {
            rows: n,
            cols: n,
            indptr: (0..=n).collect(),
            indices: (0..n).collect(),
            values: diagonal.to_vec(),
        }
    }

    pub fn identity(n: usize) -> Self {
        Self::from_diagonal(&vec![Complex64::new(1.0, 0.0); n])
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn to_dense_matrix(&self) -> DenseMatrix {
        let mut out = DenseMatrix::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for p in self.indptr[i]..self.indptr[i + 1] {
                out.set(i, self.indices[p], self.values[p]);
            }
        }
        out
    }

    pub fn transpose(&self) -> Self {
        let mut counts = vec![0usize; self.cols + 1];
        for &j in &self.indices {
            counts[j + 1] += 1;
        }
        for j in 0..self.cols {
            counts[j + 1] += counts[j];
        }
        let mut next = counts.clone();
        let mut indices = vec![0; self.nnz()];
        let mut values = vec![Complex64::default(); self.nnz()];
        for i in 0..self.rows {
            for p in self.indptr[i]..self.indptr[i + 1] {
                let j = self.indices[p];
                let slot = next[j];
                indices[slot] = i;
                values[slot] = self.values[p];
                next[j] += 1;
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            indptr: counts,
            indices,
            values,
        }
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> Self {
        let mut out = self.transpose();
        for v in &mut out.values {
            *v = v.conj();
        }
        out
    }
}

impl LinearOperator for CsrMatrix {
    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn matvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        check_len(self.cols, x)?;
        Ok((0..self.rows)
            .map(|i| {
                (self.indptr[i]..self.indptr[i + 1])
                    .map(|p| self.values[p] * x[self.indices[p]])
                    .sum()
            })
            .collect())
    }

    fn rmatvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        check_len(self.rows, x)?;
        let mut out = vec![Complex64::default(); self.cols];
        for (i, &xi) in x.iter().enumerate() {
            for p in self.indptr[i]..self.indptr[i + 1] {
                out[self.indices[p]] += self.values[p] * xi;
            }
        }
        Ok(out)
    }

    fn to_dense(&self) -> Result<DenseMatrix> {
        Ok(self.to_dense_matrix())
    }
}
