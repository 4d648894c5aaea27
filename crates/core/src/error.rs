//! Error taxonomy shared by the function representation and the deflated
//! Newton operators.

use crate::config::ConfigError;
use crate::ops::OpTag;

pub type Result<T, E = TrigError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum TrigError {
    /// A sampled callable produced NaN or Inf.
    #[error("function evaluated to NaN or Inf at x = {x}")]
    NumericalDomain { x: f64 },

    /// Periodic antiderivatives only exist for mean-zero functions.
    #[error("indefinite integral requires a zero-mean function (column {column} has mean {mean:e})")]
    MeanNotZero { column: usize, mean: f64 },

    /// Deflation is singular at a known solution.
    #[error("state coincides with known solution {index}")]
    CoincidentSolution { index: usize },

    #[error("shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("no implementation registered for {0:?}")]
    UnsupportedOperation(OpTag),

    #[error("matrix is singular (zero pivot in column {pivot})")]
    Singular { pivot: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TrigError {
    pub(crate) fn shape(expected: impl ToString, found: impl ToString) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
