use std::collections::HashMap;

use crate::analysis::Analysis;
use crate::grammar::{END_MARKER, EPSILON, GrammarTable};
use crate::lexer::{LexicalAnalyzer, LexicalError, Token};

/// The predictive table `M[non-terminal, terminal] -> rule index`.
#[derive(Debug)]
pub struct ParseTable {
    entries: HashMap<String, HashMap<String, usize>>,
}

/// Two rules claim the same table cell: the grammar is not LL(1).
pub struct Conflict {
    pub non_terminal: String,
    pub terminal: String,
    pub rules: (usize, usize),
}

/// The driver rejected the input: the record of where it got stuck.
pub struct ParseError {
    pub stack_top: String,
    pub lookahead: String,
    pub position: usize,
}

/// Outcome of a parse. An accepted input carries its leftmost derivation
/// as the sequence of predicted rule indices.
#[derive(Debug)]
pub enum Verdict {
    Accepted(Vec<usize>),
    Rejected(ParseError),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

impl ParseTable {
    /// For each rule `A -> α` with index `i`: `M[A, a] = i` for every
    /// terminal `a` in `FIRST(α) \ {#}`, and if `#` is in `FIRST(α)`,
    /// `M[A, b] = i` for every `b` in `FOLLOW(A)` (end marker included).
    pub fn new(grammar: &GrammarTable, analysis: &Analysis) -> Result<Self, Conflict> {
        let mut table = Self {
            entries: HashMap::new(),
        };
        for (index, lhs, rhs) in grammar.iter_rules() {
            let first = analysis.first_of(rhs);
            for terminal in first.iter().filter(|s| *s != EPSILON) {
                table.insert(lhs, terminal, index)?;
            }
            if first.contains(EPSILON) {
                for terminal in analysis.follow(lhs) {
                    table.insert(lhs, terminal, index)?;
                }
            }
        }
        Ok(table)
    }

    pub fn get(&self, non_terminal: &str, terminal: &str) -> Option<usize> {
        self.entries.get(non_terminal)?.get(terminal).copied()
    }

    fn insert(&mut self, non_terminal: &str, terminal: &str, index: usize) -> Result<(), Conflict> {
        let row = self.entries.entry(non_terminal.to_string()).or_default();
        match row.insert(terminal.to_string(), index) {
            Some(previous) if previous != index => Err(Conflict {
                non_terminal: non_terminal.to_string(),
                terminal: terminal.to_string(),
                rules: (previous, index),
            }),
            _ => Ok(()),
        }
    }
}

/// Table-driven predictive parser. Owns its stack and derivation log;
/// pulls tokens on demand from the lexical analyzer.
pub struct Ll1<'g> {
    grammar: &'g GrammarTable,
    table: ParseTable,
}

impl<'g> Ll1<'g> {
    pub fn new(grammar: &'g GrammarTable, analysis: &Analysis) -> Result<Self, Conflict> {
        let table = ParseTable::new(grammar, analysis)?;
        Ok(Self { grammar, table })
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    /// Runs the stack machine to acceptance or the first mismatch. In
    /// verbose mode each step prints the stack, the remaining input and
    /// the action taken.
    pub fn parse(
        &self,
        lexer: &mut LexicalAnalyzer,
        verbose: bool,
    ) -> Result<Verdict, LexicalError> {
        let mut stack: Vec<String> = vec![END_MARKER.to_string()];
        if let Some(axiom) = self.grammar.axiom() {
            stack.push(axiom.to_string());
        }
        let mut derivation = vec![];

        loop {
            let token = lexer.peek_token()?.clone();
            let lookahead = self.token_symbol(lexer, &token);
            let top = stack.last().unwrap().clone();

            if top == END_MARKER && lookahead == END_MARKER {
                Self::trace(verbose, &stack, lexer, "accept");
                return Ok(Verdict::Accepted(derivation));
            }
            if self.grammar.is_non_terminal(&top) {
                match self.table.get(&top, &lookahead) {
                    Some(index) => {
                        let (_, rhs) = self.grammar.rule_from_index(index).unwrap();
                        let action = format!("predict ({index}) {top} -> {}", rhs.join(" "));
                        Self::trace(verbose, &stack, lexer, &action);
                        stack.pop();
                        derivation.push(index);
                        for symbol in rhs.iter().rev().filter(|s| *s != EPSILON) {
                            stack.push(symbol.clone());
                        }
                    }
                    None => {
                        Self::trace(verbose, &stack, lexer, "error: no rule applies");
                        return Ok(Verdict::Rejected(self.rejection(&top, &lookahead, &token)));
                    }
                }
            } else if top == lookahead {
                Self::trace(verbose, &stack, lexer, &format!("match {top}"));
                stack.pop();
                let _ = lexer.next_token()?;
            } else {
                Self::trace(verbose, &stack, lexer, "error: terminal mismatch");
                return Ok(Verdict::Rejected(self.rejection(&top, &lookahead, &token)));
            }
        }
    }

    /// The grammar symbol a token stands for: its tag when the tag is a
    /// declared terminal, its lexeme otherwise. The end token is the end
    /// marker.
    fn token_symbol(&self, lexer: &LexicalAnalyzer, token: &Token) -> String {
        match lexer.tag_name(token) {
            None => END_MARKER.to_string(),
            Some(tag) if self.grammar.is_terminal(tag) => tag.to_string(),
            Some(_) => lexer.get_lexeme(token),
        }
    }

    fn rejection(&self, top: &str, lookahead: &str, token: &Token) -> ParseError {
        ParseError {
            stack_top: top.to_string(),
            lookahead: lookahead.to_string(),
            position: token.span().start_pos(),
        }
    }

    fn trace(verbose: bool, stack: &[String], lexer: &LexicalAnalyzer, action: &str) {
        if verbose {
            println!("{:<30} | {:<20} | {action}", stack.join(" "), lexer.remaining());
        }
    }
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (first, second) = self.rules;
        write!(
            f,
            "grammar is not LL(1): rules {first} and {second} both apply for non-terminal {} on terminal {}",
            self.non_terminal, self.terminal
        )
    }
}

impl std::fmt::Debug for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for Conflict {}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "derivation failed at position {}: stack top {}, lookahead {}",
            self.position, self.stack_top, self.lookahead
        )
    }
}

impl std::fmt::Debug for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::analysis::Analysis;
    use crate::dfa::Dfa;
    use crate::grammar::parser::parse;
    use crate::lexer::LexicalAnalyzer;
    use crate::ll1::{Ll1, ParseTable, Verdict};
    use crate::nfa::Nfa;
    use crate::regex_parser::parse_rules;

    fn compile_dfa(source: &str) -> Dfa {
        let rules = parse_rules(source).unwrap();
        Dfa::from_nfa(&Nfa::from_rules(&rules)).minimize()
    }

    #[test]
    fn main() {
        let grammar = parse("S -> ( S ) S | #\n").unwrap();
        let analysis = Analysis::new(&grammar);
        let table = ParseTable::new(&grammar, &analysis).unwrap();
        assert_eq!(table.get("S", "("), Some(0));
        assert_eq!(table.get("S", ")"), Some(1));
        assert_eq!(table.get("S", "$"), Some(1));
    }

    #[test]
    fn left_factoring_conflict_is_reported() {
        let grammar = parse("S -> a S | a\n").unwrap();
        let analysis = Analysis::new(&grammar);
        let conflict = ParseTable::new(&grammar, &analysis).unwrap_err();
        assert_eq!(conflict.non_terminal, "S");
        assert_eq!(conflict.terminal, "a");
        assert_eq!(conflict.rules, (0, 1));
    }

    #[test]
    fn left_recursion_is_a_conflict() {
        let grammar = parse("E -> E + id | id\n").unwrap();
        let analysis = Analysis::new(&grammar);
        assert!(ParseTable::new(&grammar, &analysis).is_err());
    }

    #[test]
    fn balanced_parentheses() {
        let grammar = parse("S -> ( S ) S | #\n").unwrap();
        let analysis = Analysis::new(&grammar);
        let parser = Ll1::new(&grammar, &analysis).unwrap();
        let dfa = compile_dfa("LP : \\(\nRP : \\)\n");
        for (input, expected) in [("()", true), ("(())", true), ("(()", false), ("", true)] {
            let mut lexer = LexicalAnalyzer::from_source_str(&dfa, input);
            let verdict = parser.parse(&mut lexer, false).unwrap();
            assert_eq!(verdict.is_accepted(), expected, "input {input:?}");
        }
    }

    #[test]
    fn derivation_replays_to_the_input() {
        let grammar = parse("S -> ( S ) S | #\n").unwrap();
        let analysis = Analysis::new(&grammar);
        let parser = Ll1::new(&grammar, &analysis).unwrap();
        let dfa = compile_dfa("LP : \\(\nRP : \\)\n");
        let mut lexer = LexicalAnalyzer::from_source_str(&dfa, "(())");
        let derivation = match parser.parse(&mut lexer, false).unwrap() {
            Verdict::Accepted(derivation) => derivation,
            Verdict::Rejected(e) => panic!("rejected: {e}"),
        };
        // Replay the leftmost derivation against the rule table.
        let mut sentential = vec![grammar.axiom().unwrap().to_string()];
        for index in derivation {
            let (lhs, rhs) = grammar.rule_from_index(index).unwrap();
            let position = sentential
                .iter()
                .position(|s| grammar.is_non_terminal(s))
                .unwrap();
            assert_eq!(sentential[position], lhs);
            let replacement: Vec<String> = rhs
                .iter()
                .filter(|s| *s != "#")
                .cloned()
                .collect();
            sentential.splice(position..=position, replacement);
        }
        assert_eq!(sentential.join(""), "(())");
    }

    #[test]
    fn rejection_records_the_mismatch() {
        let grammar = parse("S -> ( S ) S | #\n").unwrap();
        let analysis = Analysis::new(&grammar);
        let parser = Ll1::new(&grammar, &analysis).unwrap();
        let dfa = compile_dfa("LP : \\(\nRP : \\)\n");
        let mut lexer = LexicalAnalyzer::from_source_str(&dfa, "(()");
        let error = match parser.parse(&mut lexer, false).unwrap() {
            Verdict::Rejected(error) => error,
            Verdict::Accepted(_) => panic!("accepted unbalanced input"),
        };
        assert_eq!(error.stack_top, ")");
        assert_eq!(error.lookahead, "$");
        assert_eq!(error.position, 3);
    }

    #[test]
    fn empty_grammar_accepts_only_empty_input() {
        let grammar = parse("").unwrap();
        let analysis = Analysis::new(&grammar);
        let parser = Ll1::new(&grammar, &analysis).unwrap();
        let dfa = compile_dfa("A : a\n");
        let mut lexer = LexicalAnalyzer::from_source_str(&dfa, "");
        assert!(parser.parse(&mut lexer, false).unwrap().is_accepted());
        let mut lexer = LexicalAnalyzer::from_source_str(&dfa, "a");
        assert!(!parser.parse(&mut lexer, false).unwrap().is_accepted());
    }
}
