use std::collections::{BTreeSet, HashMap};

use crate::grammar::{END_MARKER, EPSILON, GrammarTable};

/// FIRST, FOLLOW and nullability of every non-terminal, computed once by
/// outer fixed-point iteration (no recursion, so left-recursive and
/// mutually recursive grammars terminate).
pub struct Analysis<'g> {
    grammar: &'g GrammarTable,
    nullable: HashMap<String, bool>,
    first: HashMap<String, BTreeSet<String>>,
    follow: HashMap<String, BTreeSet<String>>,
}

impl<'g> Analysis<'g> {
    pub fn new(grammar: &'g GrammarTable) -> Self {
        Self {
            grammar,
            nullable: HashMap::new(),
            first: HashMap::new(),
            follow: HashMap::new(),
        }
        .compute_nullable()
        .compute_first()
        .compute_follow()
    }

    /// Whether `non_terminal` can derive the empty string; equivalently,
    /// whether `#` is in its FIRST set.
    pub fn nullable(&self, non_terminal: &str) -> bool {
        self.nullable.get(non_terminal).copied().unwrap_or(false)
    }

    pub fn first(&self, non_terminal: &str) -> &BTreeSet<String> {
        &self.first[non_terminal]
    }

    pub fn follow(&self, non_terminal: &str) -> &BTreeSet<String> {
        &self.follow[non_terminal]
    }

    /// FIRST of a symbol string: the empty string yields `{#}`; otherwise
    /// each symbol contributes its FIRST minus `#`, continuing right only
    /// while symbols are nullable, with `#` added iff all of them are.
    pub fn first_of(&self, symbols: &[String]) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        for symbol in symbols {
            let first = self.first_of_symbol(symbol);
            result.extend(first.iter().filter(|s| *s != EPSILON).cloned());
            if !first.contains(EPSILON) {
                return result;
            }
        }
        result.insert(EPSILON.to_string());
        result
    }

    fn first_of_symbol(&self, symbol: &str) -> BTreeSet<String> {
        if self.grammar.is_non_terminal(symbol) {
            self.first[symbol].clone()
        } else {
            // A terminal is its own FIRST; so is the epsilon marker.
            BTreeSet::from([symbol.to_string()])
        }
    }

    fn compute_nullable(mut self) -> Self {
        for non_terminal in self.grammar.non_terminals() {
            self.nullable.insert(non_terminal.to_string(), false);
        }
        loop {
            let mut changed = false;
            for (_, lhs, rhs) in self.grammar.iter_rules() {
                if self.nullable[lhs] {
                    continue;
                }
                if rhs.iter().all(|symbol| self.is_nullable_symbol(symbol)) {
                    self.nullable.insert(lhs.to_string(), true);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        self
    }

    fn is_nullable_symbol(&self, symbol: &str) -> bool {
        if symbol == EPSILON {
            return true;
        }
        self.nullable.get(symbol).copied().unwrap_or(false)
    }

    fn compute_first(mut self) -> Self {
        for non_terminal in self.grammar.non_terminals() {
            let mut seed = BTreeSet::new();
            if self.nullable[non_terminal] {
                seed.insert(EPSILON.to_string());
            }
            self.first.insert(non_terminal.to_string(), seed);
        }
        loop {
            let mut changed = false;
            for (_, lhs, rhs) in self.grammar.iter_rules() {
                for symbol in rhs {
                    if symbol == EPSILON {
                        break;
                    }
                    if self.grammar.is_non_terminal(symbol) {
                        let addition: Vec<String> = self.first[symbol]
                            .iter()
                            .filter(|s| *s != EPSILON)
                            .cloned()
                            .collect();
                        let target = self.first.get_mut(lhs).unwrap();
                        for terminal in addition {
                            changed |= target.insert(terminal);
                        }
                        if !self.nullable[symbol] {
                            break;
                        }
                    } else {
                        changed |= self
                            .first
                            .get_mut(lhs)
                            .unwrap()
                            .insert(symbol.clone());
                        break;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        self
    }

    fn compute_follow(mut self) -> Self {
        for non_terminal in self.grammar.non_terminals() {
            self.follow.insert(non_terminal.to_string(), BTreeSet::new());
        }
        if let Some(axiom) = self.grammar.axiom() {
            self.follow
                .get_mut(axiom)
                .unwrap()
                .insert(END_MARKER.to_string());
        }
        loop {
            let mut changed = false;
            for (_, lhs, rhs) in self.grammar.iter_rules() {
                for (position, symbol) in rhs.iter().enumerate() {
                    if !self.grammar.is_non_terminal(symbol) {
                        continue;
                    }
                    let rest = &rhs[position + 1..];
                    let first_of_rest = self.first_of(rest);
                    let mut addition: Vec<String> = first_of_rest
                        .iter()
                        .filter(|s| *s != EPSILON)
                        .cloned()
                        .collect();
                    if first_of_rest.contains(EPSILON) {
                        addition.extend(self.follow[lhs].iter().cloned());
                    }
                    let target = self.follow.get_mut(symbol).unwrap();
                    for terminal in addition {
                        changed |= target.insert(terminal);
                    }
                }
            }
            if !changed {
                break;
            }
        }
        self
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use crate::analysis::Analysis;
    use crate::grammar::{GrammarTable, parser::parse};

    fn set(symbols: &[&str]) -> BTreeSet<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    /// Z -> d | X Y Z
    /// Y -> # | c
    /// X -> Y | a
    fn mutually_nullable() -> GrammarTable {
        parse("Z -> d | X Y Z\nY -> # | c\nX -> Y | a\n").unwrap()
    }

    #[test]
    fn main() {
        let grammar = parse("S -> A B\nA -> a | #\nB -> b\n").unwrap();
        let analysis = Analysis::new(&grammar);
        assert_eq!(analysis.first("S"), &set(&["a", "b"]));
        assert_eq!(analysis.follow("A"), &set(&["b"]));
        assert_eq!(analysis.first("A"), &set(&["a", "#"]));
        assert_eq!(analysis.follow("S"), &set(&["$"]));
    }

    #[test]
    fn nullability() {
        let grammar = mutually_nullable();
        let analysis = Analysis::new(&grammar);
        assert!(!analysis.nullable("Z"));
        assert!(analysis.nullable("Y"));
        assert!(analysis.nullable("X"));
    }

    #[test]
    fn first_sets_cross_nullable_prefixes() {
        let grammar = mutually_nullable();
        let analysis = Analysis::new(&grammar);
        assert_eq!(analysis.first("Z"), &set(&["a", "c", "d"]));
        assert_eq!(analysis.first("Y"), &set(&["c", "#"]));
        assert_eq!(analysis.first("X"), &set(&["a", "c", "#"]));
    }

    #[test]
    fn follow_sets() {
        let grammar = mutually_nullable();
        let analysis = Analysis::new(&grammar);
        assert_eq!(analysis.follow("Z"), &set(&["$"]));
        assert_eq!(analysis.follow("Y"), &set(&["a", "c", "d"]));
        assert_eq!(analysis.follow("X"), &set(&["a", "c", "d"]));
    }

    #[test]
    fn first_of_the_empty_string_is_epsilon() {
        let grammar = mutually_nullable();
        let analysis = Analysis::new(&grammar);
        assert_eq!(analysis.first_of(&[]), set(&["#"]));
    }

    #[test]
    fn epsilon_in_first_iff_derives_empty() {
        let grammar = mutually_nullable();
        let analysis = Analysis::new(&grammar);
        for non_terminal in grammar.non_terminals() {
            assert_eq!(
                analysis.first(non_terminal).contains("#"),
                analysis.nullable(non_terminal),
                "non-terminal {non_terminal}"
            );
        }
    }

    #[test]
    fn left_recursion_terminates() {
        let grammar = parse("E -> E + T | T\nT -> id\n").unwrap();
        let analysis = Analysis::new(&grammar);
        assert_eq!(analysis.first("E"), &set(&["id"]));
        assert_eq!(analysis.follow("E"), &set(&["$", "+"]));
        assert_eq!(analysis.follow("T"), &set(&["$", "+"]));
    }

    #[test]
    fn arithmetic_grammar_analysis() {
        let grammar = parse(
            "E -> T E'\nE' -> + T E' | #\nT -> F T'\nT' -> * F T' | #\nF -> ( E ) | id\n",
        )
        .unwrap();
        let analysis = Analysis::new(&grammar);
        assert_eq!(analysis.first("E"), &set(&["(", "id"]));
        assert_eq!(analysis.first("E'"), &set(&["+", "#"]));
        assert_eq!(analysis.first("T'"), &set(&["*", "#"]));
        assert_eq!(analysis.follow("E"), &set(&["$", ")"]));
        assert_eq!(analysis.follow("E'"), &set(&["$", ")"]));
        assert_eq!(analysis.follow("T"), &set(&["$", ")", "+"]));
        assert_eq!(analysis.follow("F"), &set(&["$", ")", "+", "*"]));
    }
}
