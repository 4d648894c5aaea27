//! Operation dispatch over [`Trigtech`].
//!
//! Operations are looked up by [`OpTag`] in a [`DispatchTable`]. Tags with a
//! registered handler run it (exact coefficient-space implementations for the
//! standard table); everything else that has a pointwise meaning falls back
//! to evaluating the operands and re-fitting adaptively.

use std::collections::HashMap;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::OnceLock;

use num_complex::Complex64;

use crate::array::SpectralArray;
use crate::calculus::{dot, inner};
use crate::error::{Result, TrigError};
use crate::linalg::DenseMatrix;
use crate::refine::FunctionContainer;
use crate::trigtech::Trigtech;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpTag {
    Add,
    Subtract,
    Multiply,
    Divide,
    Negate,
    Real,
    Imag,
    Conj,
    Abs,
    Exp,
    Sin,
    Cos,
    Square,
    Sqrt,
    Diff,
    Sum,
    Cumsum,
    Inner,
    Dot,
    Argmax,
}

#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Fun(&'a Trigtech),
    Scalar(Complex64),
    /// Derivative or antiderivative order.
    Order(u32),
}

#[derive(Debug, Clone)]
pub enum OpOutput {
    Fun(Trigtech),
    Values(Vec<Complex64>),
    Matrix(DenseMatrix),
    Index(usize),
}

impl OpOutput {
    pub fn into_fun(self) -> Option<Trigtech> {
        match self {
            OpOutput::Fun(f) => Some(f),
            _ => None,
        }
    }

    pub fn into_values(self) -> Option<Vec<Complex64>> {
        match self {
            OpOutput::Values(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_matrix(self) -> Option<DenseMatrix> {
        match self {
            OpOutput::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_index(self) -> Option<usize> {
        match self {
            OpOutput::Index(i) => Some(i),
            _ => None,
        }
    }
}

pub type Handler = fn(&[Operand<'_>]) -> Result<OpOutput>;

// ============================================================================
// Dispatch Table
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    handlers: HashMap<OpTag, Handler>,
}

impl DispatchTable {
    /// Table with no handlers: every pointwise operation re-fits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact coefficient-space handlers for the operations that have one.
    pub fn with_standard_handlers() -> Self {
        let mut table = Self::new();
        table.register(OpTag::Add, handle_add);
        table.register(OpTag::Subtract, handle_subtract);
        table.register(OpTag::Negate, handle_negate);
        table.register(OpTag::Multiply, handle_multiply);
        table.register(OpTag::Real, |args| Ok(OpOutput::Fun(fun(args, 0)?.real())));
        table.register(OpTag::Imag, |args| Ok(OpOutput::Fun(fun(args, 0)?.imag())));
        table.register(OpTag::Conj, |args| Ok(OpOutput::Fun(fun(args, 0)?.conj())));
        table.register(OpTag::Diff, |args| {
            Ok(OpOutput::Fun(fun(args, 0)?.diff(order(args, 1)?)))
        });
        table.register(OpTag::Cumsum, |args| {
            Ok(OpOutput::Fun(fun(args, 0)?.cumsum(order(args, 1)?)?))
        });
        table.register(OpTag::Sum, |args| Ok(OpOutput::Values(fun(args, 0)?.sum())));
        table.register(OpTag::Inner, |args| {
            Ok(OpOutput::Matrix(inner(fun(args, 0)?, fun(args, 1)?)))
        });
        table.register(OpTag::Dot, |args| {
            Ok(OpOutput::Matrix(dot(fun(args, 0)?, fun(args, 1)?)))
        });
        table.register(OpTag::Argmax, |args| Ok(OpOutput::Index(fun(args, 0)?.argmax())));
        table
    }

    /// Shared instance of [`DispatchTable::with_standard_handlers`].
    pub fn standard() -> &'static DispatchTable {
        static STANDARD: OnceLock<DispatchTable> = OnceLock::new();
        STANDARD.get_or_init(Self::with_standard_handlers)
    }

    /// Install `handler` for `tag`, returning the one it replaces.
    pub fn register(&mut self, tag: OpTag, handler: Handler) -> Option<Handler> {
        self.handlers.insert(tag, handler)
    }

    pub fn unregister(&mut self, tag: OpTag) -> Option<Handler> {
        self.handlers.remove(&tag)
    }

    pub fn has_handler(&self, tag: OpTag) -> bool {
        self.handlers.contains_key(&tag)
    }

    pub fn call(&self, tag: OpTag, args: &[Operand<'_>]) -> Result<OpOutput> {
        if let Some(handler) = self.handlers.get(&tag) {
            return handler(args);
        }
        pointwise_fallback(tag, args)
    }
}

fn fun<'a>(args: &[Operand<'a>], i: usize) -> Result<&'a Trigtech> {
    match args.get(i) {
        Some(Operand::Fun(f)) => Ok(*f),
        other => Err(TrigError::shape(
            format!("function operand at position {i}"),
            format!("{other:?}"),
        )),
    }
}

fn order(args: &[Operand<'_>], i: usize) -> Result<u32> {
    match args.get(i) {
        None => Ok(1),
        Some(Operand::Order(k)) => Ok(*k),
        Some(other) => Err(TrigError::shape(
            format!("order operand at position {i}"),
            format!("{other:?}"),
        )),
    }
}

fn same_columns(f: &Trigtech, g: &Trigtech) -> Result<()> {
    if f.cols() == g.cols() {
        Ok(())
    } else {
        Err(TrigError::shape(
            format!("{} columns", f.cols()),
            format!("{} columns", g.cols()),
        ))
    }
}

fn binary(args: &[Operand<'_>], tag: OpTag) -> Result<OpOutput> {
    let combined = match (args.first(), args.get(1)) {
        (Some(Operand::Fun(f)), Some(Operand::Fun(g))) => {
            same_columns(f, g)?;
            match tag {
                OpTag::Add => *f + *g,
                _ => *f - *g,
            }
        }
        (Some(Operand::Fun(f)), Some(Operand::Scalar(s))) => {
            let shift = if tag == OpTag::Add { *s } else { -*s };
            f.add_scalar(shift)
        }
        (Some(Operand::Scalar(s)), Some(Operand::Fun(f))) => match tag {
            OpTag::Add => f.add_scalar(*s),
            _ => (-*f).add_scalar(*s),
        },
        _ => return pointwise_fallback(tag, args),
    };
    Ok(OpOutput::Fun(combined))
}

fn handle_add(args: &[Operand<'_>]) -> Result<OpOutput> {
    binary(args, OpTag::Add)
}

fn handle_subtract(args: &[Operand<'_>]) -> Result<OpOutput> {
    binary(args, OpTag::Subtract)
}

fn handle_negate(args: &[Operand<'_>]) -> Result<OpOutput> {
    let f = fun(args, 0)?;
    Ok(OpOutput::Fun(-f))
}

fn handle_multiply(args: &[Operand<'_>]) -> Result<OpOutput> {
    match (args.first(), args.get(1)) {
        (Some(Operand::Fun(f)), Some(Operand::Scalar(s)))
        | (Some(Operand::Scalar(s)), Some(Operand::Fun(f))) => Ok(OpOutput::Fun(*f * *s)),
        _ => pointwise_fallback(OpTag::Multiply, args),
    }
}

// ============================================================================
// Pointwise Fallback
// ============================================================================

fn scalar_kernel(tag: OpTag) -> Option<fn(&[Complex64]) -> Complex64> {
    let kernel: fn(&[Complex64]) -> Complex64 = match tag {
        OpTag::Add => |v| v[0] + v[1],
        OpTag::Subtract => |v| v[0] - v[1],
        OpTag::Multiply => |v| v[0] * v[1],
        OpTag::Divide => |v| v[0] / v[1],
        OpTag::Negate => |v| -v[0],
        OpTag::Real => |v| Complex64::new(v[0].re, 0.0),
        OpTag::Imag => |v| Complex64::new(v[0].im, 0.0),
        OpTag::Conj => |v| v[0].conj(),
        OpTag::Abs => |v| Complex64::new(v[0].norm(), 0.0),
        OpTag::Exp => |v| v[0].exp(),
        OpTag::Sin => |v| v[0].sin(),
        OpTag::Cos => |v| v[0].cos(),
        OpTag::Square => |v| v[0] * v[0],
        OpTag::Sqrt => |v| v[0].sqrt(),
        _ => return None,
    };
    Some(kernel)
}

fn arity(tag: OpTag) -> usize {
    match tag {
        OpTag::Add | OpTag::Subtract | OpTag::Multiply | OpTag::Divide => 2,
        _ => 1,
    }
}

/// Evaluate the operands at each sample point, apply the scalar kernel and
/// resolve the result adaptively with the first function operand's options.
fn pointwise_fallback(tag: OpTag, args: &[Operand<'_>]) -> Result<OpOutput> {
    let kernel = scalar_kernel(tag).ok_or(TrigError::UnsupportedOperation(tag))?;
    let operands = args.get(..arity(tag)).ok_or_else(|| {
        TrigError::shape(format!("{} operands", arity(tag)), format!("{}", args.len()))
    })?;
    let template = operands
        .iter()
        .find_map(|op| match op {
            Operand::Fun(f) => Some(*f),
            _ => None,
        })
        .ok_or_else(|| TrigError::shape("at least one function operand", "none"))?;

    for op in operands {
        match op {
            Operand::Fun(f) => same_columns(template, f)?,
            Operand::Scalar(_) => {}
            Operand::Order(_) => {
                return Err(TrigError::shape("function or scalar operand", "order"));
            }
        }
    }

    let mut ops = FunctionContainer::new(Vec::new());
    for col in 0..template.cols() {
        ops.push(move |x| {
            let values: Vec<Complex64> = operands
                .iter()
                .map(|op| match op {
                    Operand::Fun(f) => f.eval_column(col, x),
                    Operand::Scalar(s) => *s,
                    Operand::Order(_) => Complex64::default(),
                })
                .collect();
            kernel(&values)
        });
    }
    Ok(OpOutput::Fun(Trigtech::from_container(&ops, &template.options())?))
}

// ============================================================================
// Exact Arithmetic
// ============================================================================

impl Trigtech {
    /// `f + s`: only the zero mode changes.
    #[must_use]
    pub fn add_scalar(&self, s: Complex64) -> Trigtech {
        let ci = self.const_index();
        let mut coeffs = self.coeffs().clone();
        if coeffs.rows() == 0 {
            coeffs = SpectralArray::zeros(1, self.cols());
        }
        for col in 0..coeffs.cols() {
            *coeffs.get_mut(ci.min(coeffs.rows() - 1), col) += s;
        }
        let is_real = (s.im == 0.0).then(|| self.real_columns().to_vec());
        self.derived(coeffs, self.is_happy(), is_real)
    }

    fn combine(&self, other: &Trigtech, sign: f64) -> Trigtech {
        assert_eq!(
            self.cols(),
            other.cols(),
            "operands must have the same number of columns"
        );
        let n = self.len().max(other.len());
        let a = self.prolong_coeffs(n);
        let b = other.prolong_coeffs(n);
        let coeffs = SpectralArray::from_fn(n, self.cols(), |row, col| {
            a.get(row, col) + b.get(row, col) * sign
        });
        let is_real = self
            .real_columns()
            .iter()
            .zip(other.real_columns())
            .map(|(&x, &y)| x && y)
            .collect();
        self.derived(coeffs, self.is_happy() && other.is_happy(), Some(is_real))
    }

    fn scale(&self, s: Complex64) -> Trigtech {
        let coeffs = self.coeffs().map(|c| c * s);
        let is_real = (s.im == 0.0).then(|| self.real_columns().to_vec());
        self.derived(coeffs, self.is_happy(), is_real)
    }
}

impl Add for &Trigtech {
    type Output = Trigtech;

    fn add(self, rhs: &Trigtech) -> Trigtech {
        self.combine(rhs, 1.0)
    }
}

impl Sub for &Trigtech {
    type Output = Trigtech;

    fn sub(self, rhs: &Trigtech) -> Trigtech {
        self.combine(rhs, -1.0)
    }
}

impl Neg for &Trigtech {
    type Output = Trigtech;

    fn neg(self) -> Trigtech {
        self.scale(Complex64::new(-1.0, 0.0))
    }
}

impl Mul<Complex64> for &Trigtech {
    type Output = Trigtech;

    fn mul(self, rhs: Complex64) -> Trigtech {
        self.scale(rhs)
    }
}

impl Mul<f64> for &Trigtech {
    type Output = Trigtech;

    fn mul(self, rhs: f64) -> Trigtech {
        self.scale(Complex64::new(rhs, 0.0))
    }
}
