use std::path::PathBuf;

use crate::{grammar, lexer, ll1, regex_parser};

/// Every failure that aborts an invocation. A parse rejection is not an
/// error: it is reported through [crate::ll1::Verdict::Rejected].
pub enum Error {
    CannotOpenInput {
        path: PathBuf,
        source: std::io::Error,
    },
    MalformedRegex(regex_parser::LineError),
    MalformedGrammar(grammar::parser::LineError),
    Lexical(lexer::LexicalError),
    NotLl1(ll1::Conflict),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::CannotOpenInput { path, source } => {
                write!(f, "cannot open {}: {source}", path.display())
            }
            Error::MalformedRegex(error) => write!(f, "malformed regex file: {error}"),
            Error::MalformedGrammar(error) => write!(f, "malformed grammar file: {error}"),
            Error::Lexical(error) => write!(f, "{error}"),
            Error::NotLl1(conflict) => write!(f, "{conflict}"),
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::CannotOpenInput { source, .. } => Some(source),
            Error::MalformedRegex(error) => Some(error),
            Error::MalformedGrammar(error) => Some(error),
            Error::Lexical(error) => Some(error),
            Error::NotLl1(conflict) => Some(conflict),
        }
    }
}

impl From<regex_parser::LineError> for Error {
    fn from(value: regex_parser::LineError) -> Self {
        Self::MalformedRegex(value)
    }
}

impl From<grammar::parser::LineError> for Error {
    fn from(value: grammar::parser::LineError) -> Self {
        Self::MalformedGrammar(value)
    }
}

impl From<lexer::LexicalError> for Error {
    fn from(value: lexer::LexicalError) -> Self {
        Self::Lexical(value)
    }
}

impl From<ll1::Conflict> for Error {
    fn from(value: ll1::Conflict) -> Self {
        Self::NotLl1(value)
    }
}
