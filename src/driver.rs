//! One-shot compilation pipeline behind the command line.

use std::fs;
use std::path::Path;

use crate::analysis::Analysis;
use crate::dfa::Dfa;
use crate::error::Error;
use crate::grammar;
use crate::lexer::LexicalAnalyzer;
use crate::ll1::{Ll1, Verdict};
use crate::nfa::Nfa;
use crate::regex_parser;

/// Name of the regex rule whose tokens the tokenizer discards before
/// delivery, when the rule is declared.
const DISCARDED_RULE: &str = "WS";

/// Compiles the regex alphabet at `regex_path` into a minimized DFA and
/// the grammar at `grammar_path` into an LL(1) table, then tokenizes and
/// parses `input`. If `input` names an existing file its contents are
/// used, otherwise `input` itself is the text to recognize.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
///
/// let verdict = plik::driver::run(
///     Path::new("expr.g"),
///     Path::new("expr.rx"),
///     "a+b*c",
///     false,
/// ).unwrap();
/// assert!(verdict.is_accepted());
/// ```
pub fn run(
    grammar_path: &Path,
    regex_path: &Path,
    input: &str,
    verbose: bool,
) -> Result<Verdict, Error> {
    let regex_source = read_source(regex_path)?;
    let rules = regex_parser::parse_rules(&regex_source)?;
    let dfa = Dfa::from_nfa(&Nfa::from_rules(&rules)).minimize();

    let grammar_source = read_source(grammar_path)?;
    let grammar = grammar::parser::parse(&grammar_source)?;
    let analysis = Analysis::new(&grammar);
    let parser = Ll1::new(&grammar, &analysis)?;

    let input_path = Path::new(input);
    let mut lexer = if input_path.is_file() {
        LexicalAnalyzer::from_file(&dfa, input_path).map_err(|source| Error::CannotOpenInput {
            path: input_path.to_path_buf(),
            source,
        })?
    } else {
        LexicalAnalyzer::from_source_str(&dfa, input)
    };
    if rules.iter().any(|rule| rule.name == DISCARDED_RULE) {
        lexer = lexer.with_discarded_tags([DISCARDED_RULE.to_string()]);
    }

    Ok(parser.parse(&mut lexer, verbose)?)
}

fn read_source(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::CannotOpenInput {
        path: path.to_path_buf(),
        source,
    })
}
