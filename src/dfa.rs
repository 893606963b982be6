use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::nfa::Nfa;

/// A deterministic recognizer. State 0 is the start state; the transition
/// function is partial (a missing entry is the dead state).
pub struct Dfa {
    states: Vec<DfaState>,
    rule_names: Vec<String>,
}

struct DfaState {
    accept: Option<usize>,
    next: HashMap<char, usize>,
}

impl Dfa {
    /// Subset construction with ε-closure. Each DFA state is the ε-closure
    /// of a set of NFA states; its tag is the earliest-declared rule among
    /// the accepting NFA states it contains.
    pub fn from_nfa(nfa: &Nfa) -> Self {
        let alphabet = nfa.alphabet();
        let start = nfa.e_closure(&BTreeSet::from([nfa.start()]));
        let mut states = vec![DfaState {
            accept: nfa.accept_tag(&start),
            next: HashMap::new(),
        }];
        let mut subsets = vec![start];
        let mut visited = 0;

        while visited < subsets.len() {
            for &symbol in &alphabet {
                let target = nfa.e_closure(&nfa.step(&subsets[visited], symbol));
                if target.is_empty() {
                    continue;
                }
                let index = match subsets.iter().position(|s| *s == target) {
                    Some(index) => index,
                    None => {
                        states.push(DfaState {
                            accept: nfa.accept_tag(&target),
                            next: HashMap::new(),
                        });
                        subsets.push(target);
                        subsets.len() - 1
                    }
                };
                states[visited].next.insert(symbol, index);
            }
            visited += 1;
        }

        Self {
            states,
            rule_names: nfa.rule_names().to_vec(),
        }
    }

    /// Partition refinement. The initial partition separates states by
    /// tag, so distinct token categories are never merged; refinement
    /// splits blocks by the block each symbol leads to (missing
    /// transitions all map to the same dead block) until stable.
    pub fn minimize(&self) -> Dfa {
        let alphabet: BTreeSet<char> = self
            .states
            .iter()
            .flat_map(|s| s.next.keys().copied())
            .collect();

        let mut block_of: Vec<usize> = {
            let mut tag_blocks: BTreeMap<Option<usize>, usize> = BTreeMap::new();
            self.states
                .iter()
                .map(|state| {
                    let next = tag_blocks.len();
                    *tag_blocks.entry(state.accept).or_insert(next)
                })
                .collect()
        };
        let mut block_count = block_of.iter().max().map_or(0, |&b| b + 1);

        loop {
            let mut keys: BTreeMap<(usize, Vec<Option<usize>>), usize> = BTreeMap::new();
            let mut refined = Vec::with_capacity(self.states.len());
            for (index, state) in self.states.iter().enumerate() {
                let signature: Vec<Option<usize>> = alphabet
                    .iter()
                    .map(|symbol| state.next.get(symbol).map(|&t| block_of[t]))
                    .collect();
                let key = (block_of[index], signature);
                let block = match keys.get(&key) {
                    Some(&block) => block,
                    None => {
                        let block = keys.len();
                        keys.insert(key, block);
                        block
                    }
                };
                refined.push(block);
            }
            let stable = keys.len() == block_count;
            block_count = keys.len();
            block_of = refined;
            if stable {
                break;
            }
        }

        // Renumber so the start state's block becomes state 0.
        let start_block = block_of[0];
        let renumber = |block: usize| -> usize {
            if block == start_block {
                0
            } else if block == 0 {
                start_block
            } else {
                block
            }
        };

        let mut states: Vec<Option<DfaState>> = (0..block_count).map(|_| None).collect();
        for (index, state) in self.states.iter().enumerate() {
            let slot = &mut states[renumber(block_of[index])];
            if slot.is_none() {
                *slot = Some(DfaState {
                    accept: state.accept,
                    next: state
                        .next
                        .iter()
                        .map(|(&symbol, &target)| (symbol, renumber(block_of[target])))
                        .collect(),
                });
            }
        }

        Dfa {
            states: states.into_iter().map(Option::unwrap).collect(),
            rule_names: self.rule_names.clone(),
        }
    }

    pub fn next_state(&self, state: usize, symbol: char) -> Option<usize> {
        self.states[state].next.get(&symbol).copied()
    }

    /// Declaration index of the rule this state accepts, if any.
    pub fn tag(&self, state: usize) -> Option<usize> {
        self.states[state].accept
    }

    pub fn rule_name(&self, tag: usize) -> &str {
        &self.rule_names[tag]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Whether the whole of `input` is in the recognizer's language.
    pub fn accepts(&self, input: &str) -> bool {
        let mut state = 0;
        for symbol in input.chars() {
            state = match self.next_state(state, symbol) {
                Some(next) => next,
                None => return false,
            };
        }
        self.tag(state).is_some()
    }
}
