use thiserror::Error;

use crate::interpreter::EvalError;
use crate::parser::ParseError;

/// Any failure of the parse-then-run pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Coarse classification of every error the language can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Type,
    Name,
    Index,
    Runtime,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(ParseError::Lex(_)) => ErrorKind::Lexical,
            Error::Parse(_) => ErrorKind::Syntax,
            Error::Eval(error) => error.kind(),
        }
    }
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Lexical => "lexical",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Type => "type",
            ErrorKind::Name => "name",
            ErrorKind::Index => "index",
            ErrorKind::Runtime => "runtime",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;
    use crate::run_source;
    use crate::host::CapturedConsole;
    use crate::interpreter::Interpreter;

    fn kind_of(source: &str) -> ErrorKind {
        run_source(source, &Interpreter::default(), &mut CapturedConsole::new())
            .expect_err("program should fail")
            .kind()
    }

    #[test]
    fn classifies_each_stage() {
        assert_eq!(kind_of("x = 1 @ 2"), ErrorKind::Lexical);
        assert_eq!(kind_of("1 = 2"), ErrorKind::Syntax);
        assert_eq!(kind_of("print(missing)"), ErrorKind::Name);
        assert_eq!(kind_of("print(1 + 'a')"), ErrorKind::Type);
        assert_eq!(kind_of("d = {'a': 1}\nprint(d['z'])"), ErrorKind::Index);
        assert_eq!(kind_of("print(5 / 0)"), ErrorKind::Runtime);
        assert_eq!(ErrorKind::Syntax.to_string(), "syntax");
    }
}
