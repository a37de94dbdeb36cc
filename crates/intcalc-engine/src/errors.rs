//! Error types for expression compilation and integration.

use thiserror::Error;

/// Errors raised while compiling an expression.
///
/// Every variant except [`ExpressionError::Empty`] records the byte offset of
/// the offending input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// The expression text was empty.
    #[error("expression is empty")]
    Empty,
    /// A character outside the expression alphabet was found.
    #[error("unexpected character '{character}' at offset {position}")]
    UnexpectedCharacter {
        /// Offending character.
        character: char,
        /// Byte offset of the character.
        position: usize,
    },
    /// A numeric literal could not be read.
    #[error("invalid number '{text}' at offset {position}")]
    InvalidNumber {
        /// Literal text as written.
        text: String,
        /// Byte offset of the literal.
        position: usize,
    },
    /// An identifier is neither the integration variable, a constant, nor a
    /// known function.
    #[error("unknown identifier '{name}' at offset {position}")]
    UnknownIdentifier {
        /// Identifier as written.
        name: String,
        /// Byte offset of the identifier.
        position: usize,
    },
    /// A token appeared where the grammar does not allow it.
    #[error("unexpected '{found}' at offset {position}")]
    UnexpectedToken {
        /// Text of the offending token.
        found: String,
        /// Byte offset of the token.
        position: usize,
    },
    /// Brackets, calls or operator chains nest past the supported depth.
    #[error("expression nests too deeply at offset {position}")]
    TooDeep {
        /// Byte offset of the token that went one level too deep.
        position: usize,
    },
    /// The expression ended while an operand or delimiter was still expected.
    #[error("unexpected end of expression at offset {position}")]
    UnexpectedEnd {
        /// Byte offset of the end of input.
        position: usize,
    },
}

impl ExpressionError {
    /// Byte offset of the failure, when one applies.
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::UnexpectedCharacter { position, .. }
            | Self::InvalidNumber { position, .. }
            | Self::UnknownIdentifier { position, .. }
            | Self::UnexpectedToken { position, .. }
            | Self::TooDeep { position }
            | Self::UnexpectedEnd { position } => Some(*position),
        }
    }
}

/// Errors raised by [`crate::TrapezoidalIntegrator`].
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// The expression did not compile.
    #[error("expression does not compile: {0}")]
    Compile(#[from] ExpressionError),
    /// The upper bound is not strictly greater than the lower bound.
    #[error("upper bound {upper} must be greater than lower bound {lower}")]
    InvalidBounds {
        /// Lower bound as supplied.
        lower: f64,
        /// Upper bound as supplied.
        upper: f64,
    },
    /// A bound is NaN or infinite.
    #[error("bounds must be finite")]
    NonFiniteBounds,
    /// Zero segments were requested.
    #[error("segments must be at least 1")]
    ZeroSegments,
    /// Zero threads were requested.
    #[error("threads must be at least 1")]
    ZeroThreads,
    /// The thread count does not evenly divide the segment count.
    #[error("{segments} segments cannot be split evenly across {threads} threads")]
    UnevenPartition {
        /// Requested segment count.
        segments: u64,
        /// Requested thread count.
        threads: u64,
    },
    /// A worker thread could not be started.
    #[error("failed to start worker for partition {partition}: {source}")]
    Spawn {
        /// One-based partition index.
        partition: u64,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// A worker thread panicked before producing its subtotal.
    #[error("worker for partition {partition} panicked")]
    WorkerPanicked {
        /// One-based partition index.
        partition: u64,
    },
}
