//! Codec Error Types

use thiserror::Error;

/// Errors from parsing a PID formula expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Expression is empty or all whitespace
    #[error("formula expression is empty")]
    Empty,

    /// Character outside the allowed arithmetic alphabet
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedChar { position: usize, character: char },

    /// Token not valid at this point in the grammar
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken { position: usize, token: String },

    /// Expression ended where an operand or ')' was required
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// Input remains after a complete expression
    #[error("trailing input at position {position}")]
    TrailingInput { position: usize },

    /// Numeric literal failed to parse
    #[error("invalid number '{literal}' at position {position}")]
    InvalidNumber { position: usize, literal: String },
}
