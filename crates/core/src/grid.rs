//! Equispaced periodic grid on [-1, 1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicGrid {
    pub n: usize,
}

impl PeriodicGrid {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// x_j = -1 + 2j/n for j = 0..n; the right endpoint is excluded.
    pub fn points(&self) -> Vec<f64> {
        let h = 2.0 / self.n as f64;
        (0..self.n).map(|j| -1.0 + j as f64 * h).collect()
    }

    /// Trapezoidal weights, exact for trigonometric polynomials of degree < n.
    pub fn weights(&self) -> Vec<f64> {
        vec![2.0 / self.n as f64; self.n]
    }
}

pub fn trigpts(n: usize) -> Vec<f64> {
    PeriodicGrid::new(n).points()
}

pub fn quadwts(n: usize) -> Vec<f64> {
    PeriodicGrid::new(n).weights()
}
