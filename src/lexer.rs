use std::collections::HashSet;
use std::{fs::File, io::Read, path::Path};

use crate::dfa::Dfa;

/// A half-open character range into the analyzer's input buffer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Span {
    start_pos: usize,
    end_pos: usize,
}

impl Span {
    fn new(start_pos: usize, end_pos: usize) -> Self {
        Self { start_pos, end_pos }
    }

    pub fn start_pos(&self) -> usize {
        self.start_pos
    }

    pub fn end_pos(&self) -> usize {
        self.end_pos
    }
}

/// A token delivered by the analyzer. `tag` is the declaration index of
/// the regex rule that matched; the end-of-input sentinel carries none.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    tag: Option<usize>,
    span: Span,
}

impl Token {
    pub fn tag(&self) -> Option<usize> {
        self.tag
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn is_end(&self) -> bool {
        self.tag.is_none()
    }
}

/// Drives a minimized [Dfa] over an input buffer, emitting longest-match
/// tokens. Ties between rules of equal match length are already folded
/// into the DFA tags (earliest declaration wins). Tokens whose rule name
/// is in the discard set are skipped before delivery.
pub struct LexicalAnalyzer<'a> {
    dfa: &'a Dfa,
    chars: Vec<char>,
    line_start_indices: Vec<usize>,
    start_pos: usize,
    current_pos: usize,
    current_token: Option<Token>,
    discarded_tags: HashSet<String>,
}

impl<'a> LexicalAnalyzer<'a> {
    pub fn from_source_str(dfa: &'a Dfa, source: &str) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let mut line_start_indices = chars
            .iter()
            .enumerate()
            .filter_map(|(i, c)| if *c == '\n' { Some(i + 1) } else { None })
            .collect::<Vec<usize>>();
        line_start_indices.insert(0, 0);
        Self {
            dfa,
            chars,
            line_start_indices,
            start_pos: 0,
            current_pos: 0,
            current_token: None,
            discarded_tags: HashSet::new(),
        }
    }

    pub fn from_file(dfa: &'a Dfa, source_file: &Path) -> Result<Self, std::io::Error> {
        let mut source_file = File::open(source_file)?;
        let mut source = String::new();
        let _ = source_file.read_to_string(&mut source)?;
        Ok(Self::from_source_str(dfa, &source))
    }

    pub fn with_discarded_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.discarded_tags = tags.into_iter().collect();
        self
    }

    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        let token = self.peek_token()?.clone();
        self.current_token = None;
        Ok(token)
    }

    pub fn peek_token(&mut self) -> Result<&Token, LexicalError> {
        if self.current_token.is_none() {
            self.current_token = Some(self.get()?);
        }
        Ok(self.current_token.as_ref().unwrap())
    }

    pub fn get_lexeme(&self, token: &Token) -> String {
        self.chars[token.span.start_pos..token.span.end_pos]
            .iter()
            .collect()
    }

    /// Rule name of the token's tag, if it carries one.
    pub fn tag_name(&self, token: &Token) -> Option<&str> {
        token.tag.map(|tag| self.dfa.rule_name(tag))
    }

    /// Input not yet consumed by a delivered token. Includes a peeked but
    /// undelivered lookahead.
    pub fn remaining(&self) -> String {
        let pos = match &self.current_token {
            Some(token) => token.span.start_pos,
            None => self.current_pos,
        };
        self.chars[pos..].iter().collect()
    }

    pub fn show_span(&self, span: &Span) -> String {
        let line_number = self
            .line_start_indices
            .partition_point(|&i| i <= span.start_pos);
        let line_start_idx = self.line_start_indices[line_number - 1];
        let line_end_idx = match self.line_start_indices.get(line_number) {
            Some(idx) => idx - 1,
            None => self.chars.len(),
        };
        let line: String = self.chars[line_start_idx..line_end_idx].iter().collect();
        let span_offset = span.start_pos - line_start_idx;
        let span_length = span.end_pos - span.start_pos;
        let span_marker = format!(
            "{}{}{}",
            " ".repeat(span_offset),
            "^",
            "-".repeat(span_length.saturating_sub(1))
        );
        format!("Line {line_number:3}|{line}\n         {span_marker}")
    }

    fn get(&mut self) -> Result<Token, LexicalError> {
        loop {
            let token = self.scan()?;
            match token.tag {
                Some(tag) if self.discarded_tags.contains(self.dfa.rule_name(tag)) => continue,
                _ => return Ok(token),
            }
        }
    }

    /// One longest-match attempt from the current position: advance while
    /// a transition exists, remember the last accepting state passed, and
    /// rewind to it once stuck.
    fn scan(&mut self) -> Result<Token, LexicalError> {
        self.move_start_pos();
        if self.peek_char().is_none() {
            let span = Span::new(self.current_pos, self.current_pos);
            return Ok(Token { tag: None, span });
        }
        let mut state = 0;
        let mut last_accept: Option<(usize, usize)> = None;
        while let Some(ch) = self.peek_char() {
            match self.dfa.next_state(state, ch) {
                Some(next) => {
                    state = next;
                    self.read_char();
                    if let Some(tag) = self.dfa.tag(state) {
                        last_accept = Some((self.current_pos, tag));
                    }
                }
                None => break,
            }
        }
        match last_accept {
            Some((end_pos, tag)) => {
                self.current_pos = end_pos;
                let span = Span::new(self.start_pos, end_pos);
                Ok(Token {
                    tag: Some(tag),
                    span,
                })
            }
            None => Err(self.report_error()),
        }
    }

    fn report_error(&self) -> LexicalError {
        let end_pos = self.current_pos.max(self.start_pos + 1);
        let span = Span::new(self.start_pos, end_pos);
        LexicalError {
            position: self.start_pos,
            found: self.peek_char(),
            detail: self.show_span(&span),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.current_pos).copied()
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.peek_char();
        if ch.is_some() {
            self.current_pos += 1;
        }
        ch
    }

    fn move_start_pos(&mut self) {
        self.start_pos = self.current_pos;
    }
}

/// No rule matches the input at `position`.
pub struct LexicalError {
    pub position: usize,
    pub found: Option<char>,
    detail: String,
}

impl std::fmt::Display for LexicalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let found = self
            .found
            .map(|c| c.to_string())
            .unwrap_or(String::from("EOF"));
        write!(
            f,
            "{}\nerror: no token matches at position {}, next character: {}",
            self.detail, self.position, found
        )
    }
}

impl std::fmt::Debug for LexicalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for LexicalError {}

#[cfg(test)]
mod test {
    use crate::dfa::Dfa;
    use crate::lexer::LexicalAnalyzer;
    use crate::nfa::Nfa;
    use crate::regex_parser::parse_rules;

    fn compile(source: &str) -> Dfa {
        let rules = parse_rules(source).unwrap();
        Dfa::from_nfa(&Nfa::from_rules(&rules)).minimize()
    }

    #[test]
    fn main() {
        let dfa = compile("NUM : \\d.\\d*\nDASH : -");
        let mut lexer = LexicalAnalyzer::from_source_str(&dfa, "125446-47390124");
        let token = lexer.next_token().unwrap();
        assert_eq!(lexer.tag_name(&token), Some("NUM"));
        assert_eq!(lexer.get_lexeme(&token), "125446");
        let token = lexer.next_token().unwrap();
        assert_eq!(lexer.tag_name(&token), Some("DASH"));
        let token = lexer.next_token().unwrap();
        assert_eq!(lexer.get_lexeme(&token), "47390124");
        let token = lexer.next_token().unwrap();
        assert!(token.is_end());
        // The end token is sticky.
        assert!(lexer.next_token().unwrap().is_end());
    }

    #[test]
    fn longest_match_beats_earlier_rule() {
        let dfa = compile("KW : i.f\nID : \\w.\\w*");
        let mut lexer = LexicalAnalyzer::from_source_str(&dfa, "ifx");
        let token = lexer.next_token().unwrap();
        assert_eq!(lexer.tag_name(&token), Some("ID"));
        assert_eq!(lexer.get_lexeme(&token), "ifx");
        assert!(lexer.next_token().unwrap().is_end());
    }

    #[test]
    fn equal_length_goes_to_the_earlier_rule() {
        let dfa = compile("KW : i.f\nID : \\w.\\w*");
        let mut lexer = LexicalAnalyzer::from_source_str(&dfa, "if");
        let token = lexer.next_token().unwrap();
        assert_eq!(lexer.tag_name(&token), Some("KW"));
    }

    #[test]
    fn rewinds_to_last_good_match() {
        // "ab" then a lone "a": the scan for the second token walks into
        // 'a' expecting 'b', fails, and must rewind to emit "a" alone.
        let dfa = compile("AB : a.b\nA : a");
        let mut lexer = LexicalAnalyzer::from_source_str(&dfa, "aba");
        let token = lexer.next_token().unwrap();
        assert_eq!(lexer.tag_name(&token), Some("AB"));
        let token = lexer.next_token().unwrap();
        assert_eq!(lexer.tag_name(&token), Some("A"));
        assert!(lexer.next_token().unwrap().is_end());
    }

    #[test]
    fn discarded_tags_are_skipped() {
        let dfa = compile("WS : ( )+\nID : \\w.\\w*");
        let mut lexer = LexicalAnalyzer::from_source_str(&dfa, "a b  c")
            .with_discarded_tags(["WS".to_string()]);
        let mut names = vec![];
        loop {
            let token = lexer.next_token().unwrap();
            if token.is_end() {
                break;
            }
            names.push(lexer.get_lexeme(&token));
        }
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn dead_end_aborts() {
        let dfa = compile("NUM : \\d.\\d*");
        let mut lexer = LexicalAnalyzer::from_source_str(&dfa, "12x3");
        assert!(lexer.next_token().is_ok());
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.position, 2);
        assert_eq!(err.found, Some('x'));
    }

    #[test]
    fn peek_does_not_consume() {
        let dfa = compile("A : a");
        let mut lexer = LexicalAnalyzer::from_source_str(&dfa, "aa");
        let peeked = lexer.peek_token().unwrap().clone();
        assert_eq!(lexer.remaining(), "aa");
        let taken = lexer.next_token().unwrap();
        assert_eq!(peeked, taken);
        assert_eq!(lexer.remaining(), "a");
    }
}
