use gridcalc_core::InvalidIdentifier;
use thiserror::Error;

/// Failures while turning cell text into an expression tree.
///
/// The sheet layer treats every variant the same way (the cell is
/// rejected); the variants exist so rejections can be reported precisely.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),

    #[error("unexpected character {0:?} in formula")]
    UnexpectedChar(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid number literal {0:?}")]
    InvalidNumber(String),

    #[error("invalid cell reference {0:?}")]
    InvalidReference(String),

    #[error("unexpected {0} in formula")]
    UnexpectedToken(String),

    #[error("malformed expression")]
    Malformed,
}
