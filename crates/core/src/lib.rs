//! Adaptive Fourier representations of periodic functions and deflated
//! Newton operators built on them.

pub mod array;
pub mod backend;
pub mod calculus;
pub mod chop;
pub mod config;
pub mod deflation;
pub mod discretization;
pub mod error;
pub mod functional;
pub mod grid;
pub mod linalg;
pub mod newton;
pub mod ops;
pub mod refine;
pub mod resize;
pub mod transform;
pub mod trigtech;

pub use crate::config::{DeflationOptions, NewtonOptions, SolverConfig, TrigOptions};
pub use crate::error::{Result, TrigError};
pub use crate::trigtech::Trigtech;

#[cfg(test)]
mod _tests_backend;
#[cfg(test)]
mod _tests_chop;
#[cfg(test)]
mod _tests_newton;
#[cfg(test)]
mod _tests_transform;
#[cfg(test)]
mod _tests_trigtech;
