pub mod parser;

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

/// The empty-production marker. Never a terminal or non-terminal; only
/// valid as the sole symbol of a right-hand side.
pub const EPSILON: &str = "#";

/// The synthetic end-of-input terminal.
pub const END_MARKER: &str = "$";

/// A context-free grammar: the axiom, the rules grouped by left-hand
/// side, the derived terminal set, and a dense rule index preserving
/// insertion order (the LL(1) driver reports derivations as sequences of
/// these indices).
#[derive(Clone, Debug)]
pub struct GrammarTable {
    axiom: Option<String>,
    rules: IndexMap<String, IndexSet<Vec<String>>>,
    terminals: IndexSet<String>,
    index_to_rule: Vec<(String, Vec<String>)>,
    rule_to_index: HashMap<(String, Vec<String>), usize>,
}

impl GrammarTable {
    pub fn new() -> Self {
        Self {
            axiom: None,
            rules: IndexMap::new(),
            terminals: IndexSet::new(),
            index_to_rule: vec![],
            rule_to_index: HashMap::new(),
        }
    }

    /// Inserts `lhs -> rhs`. The first inserted left-hand side becomes
    /// the axiom. Re-inserting an existing rule is a no-op, keeping the
    /// rule index a bijection.
    pub fn insert_rule(&mut self, lhs: &str, rhs: Vec<String>) {
        if self.axiom.is_none() {
            self.axiom = Some(lhs.to_string());
        }
        let inserted = self
            .rules
            .entry(lhs.to_string())
            .or_default()
            .insert(rhs.clone());
        if inserted {
            let key = (lhs.to_string(), rhs);
            self.rule_to_index.insert(key.clone(), self.index_to_rule.len());
            self.index_to_rule.push(key);
        }
        self.update_terminals();
    }

    pub fn axiom(&self) -> Option<&str> {
        self.axiom.as_deref()
    }

    pub fn set_axiom(&mut self, axiom: &str) {
        self.axiom = Some(axiom.to_string());
    }

    pub fn is_non_terminal(&self, symbol: &str) -> bool {
        self.rules.contains_key(symbol)
    }

    pub fn is_terminal(&self, symbol: &str) -> bool {
        self.terminals.contains(symbol)
    }

    pub fn non_terminals(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn terminals(&self) -> &IndexSet<String> {
        &self.terminals
    }

    pub fn rules_of(&self, lhs: &str) -> Option<&IndexSet<Vec<String>>> {
        self.rules.get(lhs)
    }

    /// All rules in insertion order, with their dense indices.
    pub fn iter_rules(&self) -> impl Iterator<Item = (usize, &str, &[String])> {
        self.index_to_rule
            .iter()
            .enumerate()
            .map(|(index, (lhs, rhs))| (index, lhs.as_str(), rhs.as_slice()))
    }

    pub fn rule_index(&self, lhs: &str, rhs: &[String]) -> Option<usize> {
        self.rule_to_index
            .get(&(lhs.to_string(), rhs.to_vec()))
            .copied()
    }

    pub fn rule_from_index(&self, index: usize) -> Option<(&str, &[String])> {
        self.index_to_rule
            .get(index)
            .map(|(lhs, rhs)| (lhs.as_str(), rhs.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.index_to_rule.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_rule.is_empty()
    }

    /// Converts the grammar in place into its augmented form: one fresh
    /// rule `S' -> S` with `S'` the new axiom. `new_axiom` defaults to
    /// `<axiom>_P`; either way `_` is appended until the name collides
    /// with no terminal or non-terminal.
    pub fn to_augmented(&mut self, new_axiom: Option<&str>) {
        let old_axiom = match &self.axiom {
            Some(axiom) => axiom.clone(),
            None => return,
        };
        let mut fresh = match new_axiom {
            Some(name) => name.to_string(),
            None => format!("{old_axiom}_P"),
        };
        while self.terminals.contains(&fresh) || self.rules.contains_key(&fresh) {
            fresh.push('_');
        }
        self.insert_rule(&fresh, vec![old_axiom]);
        self.axiom = Some(fresh);
    }

    /// Augmentation without mutating the receiver.
    pub fn augmented(&self, new_axiom: Option<&str>) -> GrammarTable {
        let mut augmented = self.clone();
        augmented.to_augmented(new_axiom);
        augmented
    }

    /// Terminals are every right-hand-side symbol that is neither a
    /// left-hand side nor the epsilon marker. A later rule can turn a
    /// symbol from terminal into non-terminal, so the set is rebuilt on
    /// each insertion.
    fn update_terminals(&mut self) {
        self.terminals = self
            .rules
            .values()
            .flatten()
            .flatten()
            .filter(|symbol| *symbol != EPSILON && !self.rules.contains_key(*symbol))
            .cloned()
            .collect();
    }
}

impl Default for GrammarTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GrammarTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (lhs, alternatives) in &self.rules {
            let alternatives: Vec<String> =
                alternatives.iter().map(|rhs| rhs.join(" ")).collect();
            writeln!(f, "{lhs} -> {}", alternatives.join(" | "))?;
        }
        Ok(())
    }
}
