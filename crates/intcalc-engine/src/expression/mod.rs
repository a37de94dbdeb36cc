//! Compilation and evaluation of single-variable expressions.

mod functions;
mod lexer;
mod parser;

use std::fmt;
use std::str::FromStr;

use self::functions::{BinaryFunction, BinaryOp, UnaryFunction};
use self::parser::Parser;
use crate::errors::ExpressionError;

/// Compiled expression tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Constant(f64),
    Variable,
    Negate(Box<Node>),
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Call {
        function: UnaryFunction,
        argument: Box<Node>,
    },
    CallPair {
        function: BinaryFunction,
        first: Box<Node>,
        second: Box<Node>,
    },
}

impl Node {
    fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn evaluate(&self, x: f64) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::Variable => x,
            Self::Negate(inner) => -inner.evaluate(x),
            Self::Binary { op, lhs, rhs } => op.apply(lhs.evaluate(x), rhs.evaluate(x)),
            Self::Call { function, argument } => function.apply(argument.evaluate(x)),
            Self::CallPair {
                function,
                first,
                second,
            } => function.apply(first.evaluate(x), second.evaluate(x)),
        }
    }

    fn depends_on_variable(&self) -> bool {
        match self {
            Self::Constant(_) => false,
            Self::Variable => true,
            Self::Negate(inner) | Self::Call { argument: inner, .. } => {
                inner.depends_on_variable()
            }
            Self::Binary { lhs, rhs, .. } => lhs.depends_on_variable() || rhs.depends_on_variable(),
            Self::CallPair { first, second, .. } => {
                first.depends_on_variable() || second.depends_on_variable()
            }
        }
    }

    /// Collapses every variable-free subtree into a constant.
    fn fold(self) -> Self {
        if !self.depends_on_variable() {
            return Self::Constant(self.evaluate(0.0));
        }
        match self {
            Self::Negate(inner) => Self::Negate(Box::new(inner.fold())),
            Self::Binary { op, lhs, rhs } => Self::binary(op, lhs.fold(), rhs.fold()),
            Self::Call { function, argument } => Self::Call {
                function,
                argument: Box::new(argument.fold()),
            },
            Self::CallPair {
                function,
                first,
                second,
            } => Self::CallPair {
                function,
                first: Box::new(first.fold()),
                second: Box::new(second.fold()),
            },
            leaf @ (Self::Constant(_) | Self::Variable) => leaf,
        }
    }
}

/// A compiled expression in the single variable `x`.
///
/// Compilation validates the whole source up front, so evaluation cannot
/// fail; domain errors surface as `NaN` or infinities, as with the
/// underlying `f64` operations. The tree is immutable and `Sync`, so one
/// compiled expression can be shared by every integration worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    /// Compiles `source`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExpressionError`] locating the first character, token or
    /// identifier that does not fit the grammar. Any identifier other than
    /// `x`, the constants `pi` and `e`, and the built-in functions is
    /// rejected.
    pub fn compile(source: &str) -> Result<Self, ExpressionError> {
        let tokens = lexer::tokenize(source)?;
        let root = Parser::new(&tokens, source.len()).parse()?.fold();
        Ok(Self {
            source: source.to_owned(),
            root,
        })
    }

    /// Evaluates the expression at `x`.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        self.root.evaluate(x)
    }

    /// Source text the expression was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::compile(source)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.source)
    }
}
