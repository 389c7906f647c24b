//! Mercu: a small interpreted scripting language with built-ins for SQLite
//! storage and a background HTTP service.
//!
//! Source text goes through [`lexer`], [`parser`] and the tree-walking
//! [`interpreter`]; [`run_source`] wires the three together.
pub mod ast;
pub mod builtins;
pub mod config;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod token;

pub use config::Config;
pub use error::{Error, ErrorKind};
pub use host::{CapturedConsole, Console, StdoutConsole};
pub use interpreter::{Context, EvalError, Interpreter};

/// Parses and runs `source`, returning the run context on success.
pub fn run_source(
    source: &str,
    interpreter: &Interpreter,
    console: &mut dyn Console,
) -> Result<Context, Error> {
    let program = parser::parse(source)?;
    Ok(interpreter.run(&program, console)?)
}
