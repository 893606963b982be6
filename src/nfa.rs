use std::collections::{BTreeSet, HashMap};

use crate::regex_parser::{RegexAst, RegexRule};

pub type StateId = usize;

/// A nondeterministic finite automaton with ε-transitions, built by
/// Thompson construction over an arena of densely numbered states.
pub struct Nfa {
    states: Vec<State>,
    start: StateId,
    rule_names: Vec<String>,
}

struct State {
    moves: HashMap<char, Vec<StateId>>,
    eps: Vec<StateId>,
    accept: Option<usize>,
}

/// A sub-automaton under construction: its entry state and the states an
/// accepted string may stop in.
struct Fragment {
    start: StateId,
    accepts: Vec<StateId>,
}

impl Nfa {
    /// Builds each named rule independently, then merges them under a
    /// fresh start state with an ε-edge to every rule's entry. Accepting
    /// states carry the declaration index of the rule they belong to.
    pub fn from_rules(rules: &[RegexRule]) -> Self {
        let mut nfa = Self {
            states: vec![],
            start: 0,
            rule_names: rules.iter().map(|r| r.name.clone()).collect(),
        };
        nfa.start = nfa.new_state();
        for rule in rules {
            let fragment = nfa.fragment(&rule.ast);
            nfa.add_eps(nfa.start, fragment.start);
            for state in fragment.accepts {
                nfa.states[state].accept = Some(rule.index);
            }
        }
        nfa
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn rule_names(&self) -> &[String] {
        &self.rule_names
    }

    /// Symbols appearing on some non-ε edge.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.states
            .iter()
            .flat_map(|s| s.moves.keys().copied())
            .collect()
    }

    /// States reachable from `states` over exactly one `symbol` edge.
    pub fn step(&self, states: &BTreeSet<StateId>, symbol: char) -> BTreeSet<StateId> {
        let mut result = BTreeSet::new();
        for &state in states {
            if let Some(targets) = self.states[state].moves.get(&symbol) {
                result.extend(targets.iter().copied());
            }
        }
        result
    }

    /// ε-closure of a state set, by worklist.
    pub fn e_closure(&self, states: &BTreeSet<StateId>) -> BTreeSet<StateId> {
        let mut closure: BTreeSet<StateId> = states.clone();
        let mut pending: Vec<StateId> = states.iter().copied().collect();
        while let Some(state) = pending.pop() {
            for &target in &self.states[state].eps {
                if closure.insert(target) {
                    pending.push(target);
                }
            }
        }
        closure
    }

    /// The tag of a DFA subset: the smallest declaration index among the
    /// accepting states it contains, so the earliest rule wins ties.
    pub fn accept_tag(&self, states: &BTreeSet<StateId>) -> Option<usize> {
        states.iter().filter_map(|&s| self.states[s].accept).min()
    }

    /// Runs the automaton directly over `input` by ε-closure stepping.
    pub fn accept(&self, input: &str) -> bool {
        let mut current = self.e_closure(&BTreeSet::from([self.start]));
        for ch in input.chars() {
            current = self.e_closure(&self.step(&current, ch));
            if current.is_empty() {
                return false;
            }
        }
        self.accept_tag(&current).is_some()
    }

    fn fragment(&mut self, ast: &RegexAst) -> Fragment {
        match ast {
            RegexAst::Literal(ch) => {
                let entry = self.new_state();
                let exit = self.new_state();
                self.add_move(entry, *ch, exit);
                Fragment {
                    start: entry,
                    accepts: vec![exit],
                }
            }
            RegexAst::Concat(left, right) => {
                let left = self.fragment(left);
                let right = self.fragment(right);
                for state in left.accepts {
                    self.add_eps(state, right.start);
                }
                Fragment {
                    start: left.start,
                    accepts: right.accepts,
                }
            }
            RegexAst::Alt(left, right) => {
                let left = self.fragment(left);
                let right = self.fragment(right);
                let entry = self.new_state();
                let exit = self.new_state();
                self.add_eps(entry, left.start);
                self.add_eps(entry, right.start);
                for state in left.accepts.into_iter().chain(right.accepts) {
                    self.add_eps(state, exit);
                }
                Fragment {
                    start: entry,
                    accepts: vec![exit],
                }
            }
            RegexAst::Star(inner) => self.repetition(inner, true, true),
            RegexAst::Plus(inner) => self.repetition(inner, false, true),
            RegexAst::Optional(inner) => self.repetition(inner, true, false),
        }
    }

    /// Common frame of the closure operators: a fresh entry and exit
    /// around `inner`, with an entry→exit ε-edge iff the empty string is
    /// admitted and an accepts→entry loop iff repetition is.
    fn repetition(&mut self, inner: &RegexAst, skippable: bool, looping: bool) -> Fragment {
        let inner = self.fragment(inner);
        let entry = self.new_state();
        let exit = self.new_state();
        self.add_eps(entry, inner.start);
        if skippable {
            self.add_eps(entry, exit);
        }
        for state in inner.accepts {
            if looping {
                self.add_eps(state, inner.start);
            }
            self.add_eps(state, exit);
        }
        Fragment {
            start: entry,
            accepts: vec![exit],
        }
    }

    fn new_state(&mut self) -> StateId {
        self.states.push(State {
            moves: HashMap::new(),
            eps: vec![],
            accept: None,
        });
        self.states.len() - 1
    }

    fn add_move(&mut self, from: StateId, symbol: char, to: StateId) {
        self.states[from].moves.entry(symbol).or_default().push(to);
    }

    fn add_eps(&mut self, from: StateId, to: StateId) {
        self.states[from].eps.push(to);
    }
}

#[cfg(test)]
mod test {
    use crate::nfa::Nfa;
    use crate::regex_parser::{RegexRule, parse_pattern};

    fn single(pattern: &str) -> Nfa {
        let rule = RegexRule {
            name: "T".to_string(),
            index: 0,
            ast: parse_pattern(pattern).unwrap(),
        };
        Nfa::from_rules(&[rule])
    }

    #[test]
    fn main() {
        let nfa = single("a.b*.(c|d).b+");
        assert!(nfa.accept("abbbcb"));
        assert!(!nfa.accept("abbbbbbbbd"));
        assert!(!nfa.accept("bbbbcbbb"));
        assert!(nfa.accept("acb"));
        assert!(!nfa.accept("abbbbbbbbbbbbcdbbb"));
        assert!(nfa.accept("adbbbbbbbbbbbbb"));
    }

    #[test]
    fn optional_admits_empty() {
        let nfa = single("a?.b");
        assert!(nfa.accept("ab"));
        assert!(nfa.accept("b"));
        assert!(!nfa.accept("aab"));
    }

    #[test]
    fn plus_requires_one() {
        let nfa = single("a+");
        assert!(!nfa.accept(""));
        assert!(nfa.accept("a"));
        assert!(nfa.accept("aaaa"));
    }

    #[test]
    fn union_tags_earliest_rule() {
        let rules = vec![
            RegexRule {
                name: "A".to_string(),
                index: 0,
                ast: parse_pattern("a").unwrap(),
            },
            RegexRule {
                name: "B".to_string(),
                index: 1,
                ast: parse_pattern("a|b").unwrap(),
            },
        ];
        let nfa = Nfa::from_rules(&rules);
        assert!(nfa.accept("a"));
        assert!(nfa.accept("b"));
        assert!(!nfa.accept("ab"));
        let start = nfa.e_closure(&std::collections::BTreeSet::from([nfa.start()]));
        let on_a = nfa.e_closure(&nfa.step(&start, 'a'));
        assert_eq!(nfa.accept_tag(&on_a), Some(0));
        let on_b = nfa.e_closure(&nfa.step(&start, 'b'));
        assert_eq!(nfa.accept_tag(&on_b), Some(1));
    }

    #[test]
    fn alphabet_collects_edge_symbols() {
        let nfa = single("(0|1).-.(0|1)");
        let alphabet = nfa.alphabet();
        assert_eq!(
            alphabet.into_iter().collect::<Vec<char>>(),
            vec!['-', '0', '1']
        );
    }
}
