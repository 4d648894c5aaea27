//! Adaptive sampling of callables.
//!
//! The engine samples on equispaced grids of growing size until the Fourier
//! coefficients pass the happiness check. Doubling keeps every previous grid
//! point (x_j on n points is x_2j on 2n points), so the nested strategy only
//! evaluates the new odd-indexed points each step.

use log::{debug, warn};
use num_complex::Complex64;

use crate::array::SpectralArray;
use crate::chop::check_happy;
use crate::config::{ResampleStrategy, TrigOptions};
use crate::error::{Result, TrigError};
use crate::grid::trigpts;
use crate::resize::prolong_coeffs;
use crate::transform::vals2coeffs;

/// Fixed point used to screen callables before sampling.
pub const PROBE_POINT: f64 = 2.0 * 0.376989633393435 - 1.0;

pub type ScalarFn<'a> = Box<dyn Fn(f64) -> Complex64 + 'a>;

// ============================================================================
// Function Container
// ============================================================================

/// One scalar callable per represented column.
pub struct FunctionContainer<'a> {
    ops: Vec<ScalarFn<'a>>,
}

impl<'a> FunctionContainer<'a> {
    pub fn new(ops: Vec<ScalarFn<'a>>) -> Self {
        Self { ops }
    }

    pub fn single(op: impl Fn(f64) -> Complex64 + 'a) -> Self {
        Self {
            ops: vec![Box::new(op)],
        }
    }

    pub fn push(&mut self, op: impl Fn(f64) -> Complex64 + 'a) {
        self.ops.push(Box::new(op));
    }

    pub fn columns(&self) -> usize {
        self.ops.len()
    }

    pub fn eval(&self, x: f64) -> Vec<Complex64> {
        self.ops.iter().map(|op| op(x)).collect()
    }

    /// Evaluate every column at every point; fails on the first NaN/Inf.
    pub fn sample(&self, x: &[f64]) -> Result<SpectralArray> {
        let mut data = Vec::with_capacity(x.len() * self.ops.len());
        for op in &self.ops {
            for &xi in x {
                let value = op(xi);
                if !value.is_finite() {
                    return Err(TrigError::NumericalDomain { x: xi });
                }
                data.push(value);
            }
        }
        Ok(SpectralArray::from_vec(x.len(), self.ops.len(), data))
    }
}

impl std::fmt::Debug for FunctionContainer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionContainer")
            .field("columns", &self.ops.len())
            .finish()
    }
}

/// Screen a callable at [`PROBE_POINT`]; returns which columns look real.
pub fn check_callable(ops: &FunctionContainer<'_>) -> Result<Vec<bool>> {
    ops.eval(PROBE_POINT)
        .into_iter()
        .map(|value| {
            if value.is_finite() {
                Ok(value.im == 0.0)
            } else {
                Err(TrigError::NumericalDomain { x: PROBE_POINT })
            }
        })
        .collect()
}

// ============================================================================
// Refinement
// ============================================================================

/// One refinement step: new samples, or the previous ones with `give_up` set
/// once the next grid would exceed `max_length`.
#[derive(Debug, Clone)]
pub struct Sampled {
    pub values: SpectralArray,
    pub give_up: bool,
}

pub struct Refine<'f, 'a> {
    ops: &'f FunctionContainer<'a>,
    strategy: ResampleStrategy,
    min_samples: usize,
    max_length: usize,
}

impl<'f, 'a> Refine<'f, 'a> {
    pub fn new(ops: &'f FunctionContainer<'a>, options: &TrigOptions) -> Self {
        Self {
            ops,
            strategy: options.resample,
            min_samples: options.min_samples.max(1),
            max_length: options.max_length,
        }
    }

    pub fn step(&self, previous: Option<&SpectralArray>) -> Result<Sampled> {
        let Some(previous) = previous else {
            let n = self.min_samples.min(self.max_length.max(1));
            return Ok(Sampled {
                values: self.ops.sample(&trigpts(n))?,
                give_up: false,
            });
        };

        let n = 2 * previous.rows();
        if n > self.max_length {
            return Ok(Sampled {
                values: previous.clone(),
                give_up: true,
            });
        }

        let values = match self.strategy {
            ResampleStrategy::Full => self.ops.sample(&trigpts(n))?,
            ResampleStrategy::Nested => {
                let x = trigpts(n);
                let odd: Vec<f64> = x.iter().skip(1).step_by(2).copied().collect();
                let fresh = self.ops.sample(&odd)?;
                SpectralArray::from_fn(n, previous.cols(), |row, col| {
                    if row % 2 == 0 {
                        previous.get(row / 2, col)
                    } else {
                        fresh.get(row / 2, col)
                    }
                })
            }
        };
        Ok(Sampled {
            values,
            give_up: false,
        })
    }
}

/// Result of driving [`Refine`] to completion.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Chopped to the happy cutoff, or the last sampled length if unhappy.
    pub coeffs: SpectralArray,
    pub is_happy: bool,
    /// Largest sampled modulus.
    pub vscale: f64,
}

/// Sample until happy or until the grid would exceed `max_length`.
///
/// Giving up is not an error: the best available coefficients come back with
/// `is_happy == false`.
pub fn populate(ops: &FunctionContainer<'_>, options: &TrigOptions) -> Result<Resolved> {
    let refine = Refine::new(ops, options);
    let mut vscale = options.eps;
    let mut previous: Option<SpectralArray> = None;

    loop {
        let Sampled { values, give_up } = refine.step(previous.as_ref())?;
        if give_up {
            warn!(
                "adaptive construction unresolved at length {} (max_length = {})",
                values.rows(),
                options.max_length
            );
            return Ok(Resolved {
                coeffs: vals2coeffs(&values),
                is_happy: false,
                vscale,
            });
        }

        vscale = values.column_max_abs().into_iter().fold(vscale, f64::max);
        let coeffs = vals2coeffs(&values);
        let report = check_happy(&coeffs, options.eps);
        debug!(
            "refine: n = {}, happy = {}, cutoff = {}",
            values.rows(),
            report.is_happy,
            report.cutoff
        );

        if report.is_happy {
            return Ok(Resolved {
                coeffs: prolong_coeffs(&coeffs, report.cutoff),
                is_happy: true,
                vscale,
            });
        }
        previous = Some(values);
    }
}
