//! Solver configuration.
//!
//! All sections are optional in TOML; missing keys fall back to the defaults
//! below.
//!
//! ```toml
//! [trig]
//! eps = 1e-10
//! max_length = 4096
//!
//! [deflation]
//! shift = 1.0
//! power = 2.0
//! norm = "h1"
//!
//! [newton]
//! tolerance = 1e-10
//! max_iterations = 30
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Function Representation
// ============================================================================

/// How the adaptive engine grows its sample grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResampleStrategy {
    /// Double the grid each step, reusing every previous sample.
    #[default]
    Nested,
    /// Double the grid each step, resampling every point.
    Full,
}

/// Tolerances and limits for adaptive trigonometric construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrigOptions {
    /// Relative chopping tolerance.
    pub eps: f64,
    /// Largest grid the adaptive engine will sample before giving up.
    pub max_length: usize,
    /// Initial grid size.
    pub min_samples: usize,
    pub resample: ResampleStrategy,
}

impl Default for TrigOptions {
    fn default() -> Self {
        Self {
            eps: 1e-10,
            max_length: 4096,
            min_samples: 16,
            resample: ResampleStrategy::Nested,
        }
    }
}

impl TrigOptions {
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.eps > 0.0 && self.eps < 1.0) {
            return Err(ConfigError::InvalidTrig(format!(
                "eps must lie in (0, 1), got {}",
                self.eps
            )));
        }
        if self.min_samples == 0 {
            return Err(ConfigError::InvalidTrig(
                "min_samples must be positive".to_string(),
            ));
        }
        if self.max_length < self.min_samples {
            return Err(ConfigError::InvalidTrig(format!(
                "max_length ({}) is smaller than min_samples ({})",
                self.max_length, self.min_samples
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Deflation
// ============================================================================

/// Norm used to measure the distance to known solutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeflationNorm {
    /// ||f||² = ||f||²_L2 + ||f'||²_L2
    #[default]
    H1,
    L2,
}

impl DeflationNorm {
    /// Number of derivatives entering the associated inner product.
    pub fn order(self) -> usize {
        match self {
            DeflationNorm::H1 => 1,
            DeflationNorm::L2 => 0,
        }
    }
}

/// Parameters of the deflation factor Π_k (shift + 1/||u - u_k||^power).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeflationOptions {
    pub shift: f64,
    pub power: f64,
    pub norm: DeflationNorm,
}

impl Default for DeflationOptions {
    fn default() -> Self {
        Self {
            shift: 1.0,
            power: 2.0,
            norm: DeflationNorm::H1,
        }
    }
}

impl DeflationOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.shift >= 0.0) {
            return Err(ConfigError::InvalidDeflation(format!(
                "shift must be non-negative, got {}",
                self.shift
            )));
        }
        if !(self.power > 0.0) {
            return Err(ConfigError::InvalidDeflation(format!(
                "power must be positive, got {}",
                self.power
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Newton Iteration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonOptions {
    /// Converged once the plain residual norm drops below this.
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Step length multiplier in (0, 1].
    pub damping: f64,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 30,
            damping: 1.0,
        }
    }
}

impl NewtonOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance > 0.0) {
            return Err(ConfigError::InvalidNewton(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(ConfigError::InvalidNewton(format!(
                "damping must lie in (0, 1], got {}",
                self.damping
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Top-Level Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SolverConfig {
    pub trig: TrigOptions,
    pub deflation: DeflationOptions,
    pub newton: NewtonOptions,
}

impl SolverConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SolverConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trig.validate()?;
        self.deflation.validate()?;
        self.newton.validate()
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid trig configuration: {0}")]
    InvalidTrig(String),

    #[error("Invalid deflation configuration: {0}")]
    InvalidDeflation(String),

    #[error("Invalid Newton configuration: {0}")]
    InvalidNewton(String),
}

// ============================================================================
// Tests
// ============================================================================
