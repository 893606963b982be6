use crate::grammar::{END_MARKER, EPSILON, GrammarTable};

pub enum Error {
    MissingArrow,
    EmptyLhs,
    InvalidLhs(String),
    EmptyRhs,
    EpsilonNotAlone,
    ReservedSymbol(String),
}

/// An [Error] located at a 1-based line of the grammar source.
pub struct LineError {
    pub line: usize,
    pub error: Error,
}

/// Parses a grammar source: one `LHS -> RHS | RHS | ...` per non-blank
/// line, symbols whitespace-separated, `#` denoting the empty production.
/// The first left-hand side becomes the axiom.
pub fn parse(source: &str) -> Result<GrammarTable, LineError> {
    let mut table = GrammarTable::new();
    for (line_idx, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let located = |error| LineError {
            line: line_idx + 1,
            error,
        };
        let (lhs, alternatives) = line
            .split_once("->")
            .ok_or_else(|| located(Error::MissingArrow))?;
        let lhs = lhs.trim();
        if lhs.is_empty() {
            return Err(located(Error::EmptyLhs));
        }
        if lhs.chars().any(char::is_whitespace) {
            return Err(located(Error::InvalidLhs(lhs.to_string())));
        }
        if lhs == EPSILON || lhs == END_MARKER {
            return Err(located(Error::ReservedSymbol(lhs.to_string())));
        }
        for alternative in alternatives.split('|') {
            let symbols: Vec<String> = alternative
                .split_whitespace()
                .map(str::to_string)
                .collect();
            if symbols.is_empty() {
                return Err(located(Error::EmptyRhs));
            }
            if symbols.len() > 1 && symbols.iter().any(|s| s == EPSILON) {
                return Err(located(Error::EpsilonNotAlone));
            }
            if symbols.iter().any(|s| s == END_MARKER) {
                return Err(located(Error::ReservedSymbol(END_MARKER.to_string())));
            }
            table.insert_rule(lhs, symbols);
        }
    }
    Ok(table)
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingArrow => write!(f, "missing '->' between rule sides"),
            Error::EmptyLhs => write!(f, "empty left-hand side"),
            Error::InvalidLhs(lhs) => {
                write!(f, "left-hand side is not a single symbol: {lhs}")
            }
            Error::EmptyRhs => write!(f, "empty right-hand side segment"),
            Error::EpsilonNotAlone => {
                write!(f, "'{EPSILON}' is only valid as a whole right-hand side")
            }
            Error::ReservedSymbol(symbol) => {
                write!(f, "reserved symbol used in a rule: {symbol}")
            }
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

impl std::fmt::Debug for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for LineError {}
