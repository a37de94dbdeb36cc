//! Built-in operators, functions and constants.

use std::f64::consts::{E, PI};

/// Looks up a named constant.
pub(crate) fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(PI),
        "e" => Some(E),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Power,
}

impl BinaryOp {
    pub(crate) fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Subtract => lhs - rhs,
            Self::Multiply => lhs * rhs,
            Self::Divide => lhs / rhs,
            Self::Remainder => lhs % rhs,
            Self::Power => lhs.powf(rhs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryFunction {
    Abs,
    Acos,
    Asin,
    Atan,
    Ceil,
    Cos,
    Cosh,
    Exp,
    Factorial,
    Floor,
    Ln,
    Log10,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
}

impl UnaryFunction {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        let function = match name {
            "abs" => Self::Abs,
            "acos" => Self::Acos,
            "asin" => Self::Asin,
            "atan" => Self::Atan,
            "ceil" => Self::Ceil,
            "cos" => Self::Cos,
            "cosh" => Self::Cosh,
            "exp" => Self::Exp,
            "fac" => Self::Factorial,
            "floor" => Self::Floor,
            "ln" => Self::Ln,
            "log" | "log10" => Self::Log10,
            "sin" => Self::Sin,
            "sinh" => Self::Sinh,
            "sqrt" => Self::Sqrt,
            "tan" => Self::Tan,
            "tanh" => Self::Tanh,
            _ => return None,
        };
        Some(function)
    }

    pub(crate) fn apply(self, value: f64) -> f64 {
        match self {
            Self::Abs => value.abs(),
            Self::Acos => value.acos(),
            Self::Asin => value.asin(),
            Self::Atan => value.atan(),
            Self::Ceil => value.ceil(),
            Self::Cos => value.cos(),
            Self::Cosh => value.cosh(),
            Self::Exp => value.exp(),
            Self::Factorial => factorial(value),
            Self::Floor => value.floor(),
            Self::Ln => value.ln(),
            Self::Log10 => value.log10(),
            Self::Sin => value.sin(),
            Self::Sinh => value.sinh(),
            Self::Sqrt => value.sqrt(),
            Self::Tan => value.tan(),
            Self::Tanh => value.tanh(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryFunction {
    Atan2,
    Combinations,
    Permutations,
    Pow,
}

impl BinaryFunction {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        match name {
            "atan2" => Some(Self::Atan2),
            "ncr" => Some(Self::Combinations),
            "npr" => Some(Self::Permutations),
            "pow" => Some(Self::Pow),
            _ => None,
        }
    }

    pub(crate) fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Atan2 => lhs.atan2(rhs),
            Self::Combinations => combinations(lhs, rhs),
            Self::Permutations => combinations(lhs, rhs) * factorial(rhs),
            Self::Pow => lhs.powf(rhs),
        }
    }
}

/// Largest argument whose factorial is finite in `f64`.
const FACTORIAL_LIMIT: f64 = 170.0;

/// Factorial of the integer part of `value`; NaN below zero.
fn factorial(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        return f64::NAN;
    }
    let n = value.floor();
    if n > FACTORIAL_LIMIT {
        return f64::INFINITY;
    }
    let mut product = 1.0;
    let mut factor = 2.0;
    while factor <= n {
        product *= factor;
        factor += 1.0;
    }
    product
}

/// Binomial coefficient over the integer parts of `n` and `r`.
fn combinations(n: f64, r: f64) -> f64 {
    if n.is_nan() || r.is_nan() || n < 0.0 || r < 0.0 || n < r {
        return f64::NAN;
    }
    let n = n.floor();
    let r = r.floor().min(n - r.floor());
    let mut result = 1.0;
    let mut step = 1.0;
    while step <= r {
        result *= (n - r + step) / step;
        step += 1.0;
    }
    result
}
