use num_bigint::BigInt;
use thiserror::Error;

/// Failures of value-level operators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Unsupported operand types for '{op}': {left} and {right}")]
    UnsupportedOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("Bad operand type for unary '{op}': {operand}")]
    UnsupportedOperand {
        op: &'static str,
        operand: &'static str,
    },
    #[error("Dictionary keys must be hashable, got {type_name}")]
    UnhashableKey { type_name: &'static str },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Integer too large to convert to float")]
    IntTooLarge,
    #[error("Repeated sequence would exceed {limit} elements")]
    RepeatTooLarge { limit: usize },
}

/// Underlying cause of a failed subscript.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexFault {
    #[error("key {key} not found")]
    MissingKey { key: String },
    #[error("{container} index {index} out of range for length {len}")]
    OutOfRange {
        container: &'static str,
        index: BigInt,
        len: usize,
    },
    #[error("{container} cannot be indexed by {index}")]
    InvalidIndexType {
        container: &'static str,
        index: &'static str,
    },
    #[error("'{type_name}' object is not subscriptable")]
    NotSubscriptable { type_name: &'static str },
}
