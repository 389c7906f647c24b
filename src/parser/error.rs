use thiserror::Error;

use crate::lexer::LexError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Expected {expected}, got {found} at line {line}, column {column}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
    #[error("Invalid assignment target at line {line}, column {column}")]
    InvalidAssignmentTarget { line: usize, column: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;
