//! Runtime value model shared by the interpreter and the host collaborators.
//!
//! Holds the dynamically typed `Value`, its insertion-ordered `Dict`, the
//! operator semantics and the JSON coercion applied to string literals.
pub mod dict;
pub mod error;
pub mod json;
pub mod value;

pub use dict::Dict;
pub use error::{IndexFault, OperationError};
pub use value::Value;
