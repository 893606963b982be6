mod lexer;

use std::rc::Rc;

use crate::regex_parser::lexer::{Lexer, SpecialToken, Token};

/// A regular expression operator tree.
#[derive(PartialEq, Eq, Debug)]
pub enum RegexAst {
    Literal(char),
    Concat(Rc<RegexAst>, Rc<RegexAst>),
    Alt(Rc<RegexAst>, Rc<RegexAst>),
    Star(Rc<RegexAst>),
    Plus(Rc<RegexAst>),
    Optional(Rc<RegexAst>),
}

/// A named alphabet entry. `index` is the declaration order and doubles as
/// the rule's priority when two token candidates have equal length.
#[derive(Debug)]
pub struct RegexRule {
    pub name: String,
    pub index: usize,
    pub ast: Rc<RegexAst>,
}

pub enum Error {
    MissingSeparator,
    EmptyRuleName,
    InvalidRuleName(String),
    DuplicateRule(String),
    UnbalancedParenthesis,
    UnexpectedToken(String),
    BadEscape(Option<char>),
}

/// An [Error] located at a 1-based line of the rules source.
pub struct LineError {
    pub line: usize,
    pub error: Error,
}

/// Parses a whole rules source: one `NAME : EXPR` per non-blank line,
/// `//` lines are comments. Declaration order assigns rule priority.
pub fn parse_rules(source: &str) -> Result<Vec<RegexRule>, LineError> {
    let mut rules: Vec<RegexRule> = vec![];
    for (line_idx, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let located = |error| LineError {
            line: line_idx + 1,
            error,
        };
        let (name, pattern) = line
            .split_once(':')
            .ok_or_else(|| located(Error::MissingSeparator))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(located(Error::EmptyRuleName));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(located(Error::InvalidRuleName(name.to_string())));
        }
        if rules.iter().any(|r| r.name == name) {
            return Err(located(Error::DuplicateRule(name.to_string())));
        }
        let ast = parse_pattern(pattern.trim()).map_err(located)?;
        rules.push(RegexRule {
            name: name.to_string(),
            index: rules.len(),
            ast,
        });
    }
    Ok(rules)
}

/// Parses a single regular expression.
pub fn parse_pattern(pattern: &str) -> Result<Rc<RegexAst>, Error> {
    let parser = RegexParser::new(pattern);
    parser.parse()
}

struct RegexParser {
    lexer: Lexer,
}

// R1 -> R2 '|' R1 | R2           % alternation
// R2 -> R3 '.' R2 | R3           % concatenation
// R3 -> R4 ('*'|'+'|'?')* | R4   % postfix repetition
// R4 -> '(' R1 ')' | R5          % grouping
// R5 -> Char | Class             % atom

impl RegexParser {
    fn new(pattern: &str) -> Self {
        Self {
            lexer: Lexer::new(pattern),
        }
    }

    fn parse(mut self) -> Result<Rc<RegexAst>, Error> {
        let node = self.alternation()?;
        match self.lexer.next()? {
            Token::End => Ok(node),
            // The only way a well-nested expression stops early.
            Token::RightParen => Err(Error::UnbalancedParenthesis),
            token => Err(Error::UnexpectedToken(token.to_string())),
        }
    }

    fn alternation(&mut self) -> Result<Rc<RegexAst>, Error> {
        let mut node = self.concatenation()?;
        while *self.lexer.peek()? == Token::Or {
            _ = self.lexer.next()?;
            let rhs = self.concatenation()?;
            node = Self::alt(node, rhs);
        }
        Ok(node)
    }

    fn concatenation(&mut self) -> Result<Rc<RegexAst>, Error> {
        let mut node = self.repetition()?;
        while *self.lexer.peek()? == Token::Dot {
            _ = self.lexer.next()?;
            let rhs = self.repetition()?;
            node = Self::concat(node, rhs);
        }
        Ok(node)
    }

    fn repetition(&mut self) -> Result<Rc<RegexAst>, Error> {
        let mut node = self.atom()?;
        loop {
            match self.lexer.peek()? {
                Token::Star => node = Rc::new(RegexAst::Star(node)),
                Token::Plus => node = Rc::new(RegexAst::Plus(node)),
                Token::Question => node = Rc::new(RegexAst::Optional(node)),
                _ => break,
            }
            _ = self.lexer.next()?;
        }
        Ok(node)
    }

    fn atom(&mut self) -> Result<Rc<RegexAst>, Error> {
        match self.lexer.next()? {
            Token::LeftParen => {
                let node = self.alternation()?;
                if self.lexer.next()? != Token::RightParen {
                    return Err(Error::UnbalancedParenthesis);
                }
                Ok(node)
            }
            Token::Char(ch) => Ok(Rc::new(RegexAst::Literal(ch))),
            Token::Special(SpecialToken::Number) => Ok(Self::digits()),
            Token::Special(SpecialToken::Lowercase) => Ok(Self::lowercase()),
            token => Err(Error::UnexpectedToken(token.to_string())),
        }
    }

    fn digits() -> Rc<RegexAst> {
        let mut node = None;
        for i in 0..10 {
            let ch = char::from_digit(i, 10).unwrap();
            let literal = Rc::new(RegexAst::Literal(ch));
            node = match node {
                None => Some(literal),
                Some(n) => Some(Self::alt(n, literal)),
            };
        }
        node.unwrap()
    }

    fn lowercase() -> Rc<RegexAst> {
        let mut node = None;
        for ch in 'a'..='z' {
            let literal = Rc::new(RegexAst::Literal(ch));
            node = match node {
                None => Some(literal),
                Some(n) => Some(Self::alt(n, literal)),
            };
        }
        node.unwrap()
    }

    fn concat(left: Rc<RegexAst>, right: Rc<RegexAst>) -> Rc<RegexAst> {
        Rc::new(RegexAst::Concat(left, right))
    }

    fn alt(left: Rc<RegexAst>, right: Rc<RegexAst>) -> Rc<RegexAst> {
        Rc::new(RegexAst::Alt(left, right))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingSeparator => write!(f, "missing ':' between rule name and pattern"),
            Error::EmptyRuleName => write!(f, "empty rule name"),
            Error::InvalidRuleName(name) => {
                write!(f, "rule name contains whitespace: {name}")
            }
            Error::DuplicateRule(name) => write!(f, "rule {name} declared twice"),
            Error::UnbalancedParenthesis => write!(f, "unbalanced parenthesis"),
            Error::UnexpectedToken(token) => write!(f, "unexpected {token}"),
            Error::BadEscape(Some(ch)) => write!(f, "unknown escape: \\{ch}"),
            Error::BadEscape(None) => write!(f, "pattern ends with a lone backslash"),
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

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use crate::regex_parser::{Error, RegexAst, parse_pattern, parse_rules};

    #[test]
    fn main() {
        let ast = parse_pattern("a.b*").unwrap();
        let expected = Rc::new(RegexAst::Concat(
            Rc::new(RegexAst::Literal('a')),
            Rc::new(RegexAst::Star(Rc::new(RegexAst::Literal('b')))),
        ));
        assert_eq!(ast, expected);
    }

    #[test]
    fn alternation_binds_weaker_than_concatenation() {
        let ast = parse_pattern("a.b|c").unwrap();
        let expected = Rc::new(RegexAst::Alt(
            Rc::new(RegexAst::Concat(
                Rc::new(RegexAst::Literal('a')),
                Rc::new(RegexAst::Literal('b')),
            )),
            Rc::new(RegexAst::Literal('c')),
        ));
        assert_eq!(ast, expected);
    }

    #[test]
    fn postfix_operators() {
        let ast = parse_pattern("(a|b)+.c?").unwrap();
        let expected = Rc::new(RegexAst::Concat(
            Rc::new(RegexAst::Plus(Rc::new(RegexAst::Alt(
                Rc::new(RegexAst::Literal('a')),
                Rc::new(RegexAst::Literal('b')),
            )))),
            Rc::new(RegexAst::Optional(Rc::new(RegexAst::Literal('c')))),
        ));
        assert_eq!(ast, expected);
    }

    #[test]
    fn malformed_patterns() {
        assert!(matches!(
            parse_pattern("(a.b"),
            Err(Error::UnbalancedParenthesis)
        ));
        assert!(matches!(
            parse_pattern("a)"),
            Err(Error::UnbalancedParenthesis)
        ));
        assert!(matches!(parse_pattern("*a"), Err(Error::UnexpectedToken(_))));
        assert!(matches!(parse_pattern("a|"), Err(Error::UnexpectedToken(_))));
        assert!(matches!(parse_pattern(""), Err(Error::UnexpectedToken(_))));
    }

    #[test]
    fn rules_keep_declaration_order() {
        let rules = parse_rules("KW : i.f\n\n// a comment\nID : \\w.\\w*\n").unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name, "KW");
        assert_eq!(rules[0].index, 0);
        assert_eq!(rules[1].name, "ID");
        assert_eq!(rules[1].index, 1);
    }

    #[test]
    fn duplicate_rule_is_rejected() {
        let err = parse_rules("A : a\nA : b").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.error, Error::DuplicateRule(_)));
    }

    #[test]
    fn separator_is_required() {
        let err = parse_rules("JUSTANAME").unwrap_err();
        assert!(matches!(err.error, Error::MissingSeparator));
    }
}
