use thiserror::Error;

use crate::error::ErrorKind;
use crate::host::{ServiceError, StorageError};
use crate::runtime::error::{IndexFault, OperationError};

/// Typed errors produced while evaluating a program.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Undefined function '{name}'")]
    UndefinedFunction { name: String },
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error("Function '{name}' expected {expected} arguments, got {found}")]
    ArityMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error(
        "Invalid argument type for '{function}': '{argument}' expected {expected}, got {got}"
    )]
    InvalidArgumentType {
        function: &'static str,
        argument: &'static str,
        expected: &'static str,
        got: &'static str,
    },
    #[error("Error accessing element: {0}")]
    Index(#[source] IndexFault),
    #[error("'{function}' requires a database; call connect_db first")]
    NoDatabase { function: &'static str },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UndefinedVariable { .. } | Self::UndefinedFunction { .. } => ErrorKind::Name,
            Self::Operation(
                OperationError::UnsupportedOperands { .. }
                | OperationError::UnsupportedOperand { .. }
                | OperationError::UnhashableKey { .. },
            ) => ErrorKind::Type,
            Self::Operation(
                OperationError::DivisionByZero
                | OperationError::IntTooLarge
                | OperationError::RepeatTooLarge { .. },
            ) => ErrorKind::Runtime,
            Self::ArityMismatch { .. } | Self::InvalidArgumentType { .. } => ErrorKind::Type,
            Self::Index(_) => ErrorKind::Index,
            Self::NoDatabase { .. } | Self::Storage(_) | Self::Service(_) => ErrorKind::Runtime,
        }
    }
}

impl From<IndexFault> for EvalError {
    fn from(fault: IndexFault) -> Self {
        Self::Index(fault)
    }
}
