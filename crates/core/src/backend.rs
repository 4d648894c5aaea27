//! Backend traits for spectral operations.
//!
//! The transform layer only needs unnormalized 1D DFTs over single columns:
//!
//! ```text
//! forward:  X_q = Σ_j x_j exp(-2πi qj/n)
//! inverse:  x_j = Σ_q X_q exp(+2πi qj/n)
//! ```
//!
//! Normalization and coefficient ordering are applied by `transform`.

use std::sync::{Arc, OnceLock};

use num_complex::Complex64;
use parking_lot::Mutex;
use rustfft::{Fft, FftPlanner};

pub trait SpectralBackend {
    fn forward_fft(&self, buffer: &mut [Complex64]);
    fn inverse_fft(&self, buffer: &mut [Complex64]);

    /// Scale buffer by a complex scalar.
    fn scale(&self, alpha: Complex64, buffer: &mut [Complex64]) {
        for value in buffer {
            *value *= alpha;
        }
    }

    /// Compute y += alpha * x (axpy operation).
    fn axpy(&self, alpha: Complex64, x: &[Complex64], y: &mut [Complex64]) {
        for (dst, src) in y.iter_mut().zip(x) {
            *dst += alpha * src;
        }
    }

    /// Compute conjugate dot product ⟨x, y⟩ = x^H · y.
    fn dot(&self, x: &[Complex64], y: &[Complex64]) -> Complex64 {
        x.iter().zip(y).map(|(a, b)| a.conj() * b).sum()
    }
}

/// CPU backend built on rustfft.
///
/// Plans are cached per length; the planner itself sits behind a mutex so a
/// single backend can be shared by every representation in the process.
pub struct CpuBackend {
    planner: Mutex<FftPlanner<f64>>,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            planner: Mutex::new(FftPlanner::new()),
        }
    }

    fn plan(&self, len: usize, inverse: bool) -> Arc<dyn Fft<f64>> {
        let mut planner = self.planner.lock();
        if inverse {
            planner.plan_fft_inverse(len)
        } else {
            planner.plan_fft_forward(len)
        }
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuBackend").finish_non_exhaustive()
    }
}

impl SpectralBackend for CpuBackend {
    fn forward_fft(&self, buffer: &mut [Complex64]) {
        if buffer.len() <= 1 {
            return;
        }
        self.plan(buffer.len(), false).process(buffer);
    }

    fn inverse_fft(&self, buffer: &mut [Complex64]) {
        if buffer.len() <= 1 {
            return;
        }
        self.plan(buffer.len(), true).process(buffer);
    }
}

/// Process-wide backend used by the free transform functions.
pub fn cpu_backend() -> &'static CpuBackend {
    static BACKEND: OnceLock<CpuBackend> = OnceLock::new();
    BACKEND.get_or_init(CpuBackend::new)
}
