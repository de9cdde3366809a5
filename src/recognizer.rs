//! Recognizers: acceptors over a symbolic alphabet, deterministic or not,
//! with optional ε-transitions.

pub mod subset;

pub use subset::determinize;

use itertools::Itertools;

use crate::error::{FsmError, Result};
use crate::machine::{MealyMachine, MooreMachine, StateId, StateMachine, Symbol};
use crate::math::{OrderedMap, OrderedSet, Partition};
use crate::minimization::MinimizationOracle;

/// State table of a recognizer. Transitions form a multimap keyed by
/// `(state, Option<symbol>)`, where `None` is an ε-edge. A table marked
/// `deterministic` promises that there are no ε-edges and at most one target
/// per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizerTable {
    /// All state ids of the machine.
    pub states: OrderedSet<StateId>,
    /// The designated initial state.
    pub initial: StateId,
    /// The state the machine is currently in.
    pub current: StateId,
    /// The accepting states.
    pub finals: OrderedSet<StateId>,
    /// `(state, input or ε) → set of successor states`.
    pub transitions: OrderedMap<(StateId, Option<Symbol>), OrderedSet<StateId>>,
    /// Whether the transition relation is a function over non-ε keys.
    pub deterministic: bool,
}

impl RecognizerTable {
    /// Creates a table containing only the given initial state.
    pub fn new(initial: impl Into<StateId>) -> Self {
        let initial = initial.into();
        Self {
            states: OrderedSet::from([initial.clone()]),
            current: initial.clone(),
            initial,
            ..Self::default()
        }
    }

    /// Adds a transition `(from, on) → to`, creating the involved states as
    /// needed. Consumes and returns `self` so tables can be built in a chain.
    pub fn with_transition(
        mut self,
        from: impl Into<StateId>,
        on: impl Into<Symbol>,
        to: impl Into<StateId>,
    ) -> Self {
        self.insert_transition(from.into(), Some(on.into()), to.into());
        self
    }

    /// Adds an ε-transition `from → to`.
    pub fn with_epsilon(mut self, from: impl Into<StateId>, to: impl Into<StateId>) -> Self {
        self.insert_transition(from.into(), None, to.into());
        self
    }

    /// Marks a single state as accepting, creating it as needed.
    pub fn with_final(mut self, id: impl Into<StateId>) -> Self {
        let id = id.into();
        self.states.insert(id.clone());
        self.finals.insert(id);
        self
    }

    /// Marks a collection of states as accepting.
    pub fn with_finals<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<StateId>,
    {
        for id in ids {
            self = self.with_final(id);
        }
        self
    }

    /// Flags the table as deterministic.
    pub fn deterministic(mut self) -> Self {
        self.deterministic = true;
        self
    }

    /// In-place transition insertion; `None` adds an ε-edge.
    pub fn insert_transition(&mut self, from: StateId, on: Option<Symbol>, to: StateId) {
        self.states.insert(from.clone());
        self.states.insert(to.clone());
        self.transitions.entry((from, on)).or_default().insert(to);
    }

    /// The distinct non-ε symbols appearing in the transition map, sorted.
    pub fn alphabet(&self) -> Vec<Symbol> {
        self.transitions
            .keys()
            .filter_map(|(_, input)| input.clone())
            .unique()
            .sorted()
            .collect()
    }
}

/// An acceptor. Deterministic recognizers can be executed through
/// [`StateMachine`]; nondeterministic ones are meant to be passed through
/// [`determinize`] first (the execution path resolves a nondeterministic
/// choice by always taking the least successor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognizer {
    table: RecognizerTable,
}

impl Recognizer {
    /// Creates a recognizer that takes ownership of the given table.
    pub fn new(table: RecognizerTable) -> Self {
        Self { table }
    }

    /// Builds a recognizer over the states and transitions of a Mealy
    /// machine, dropping the outputs. The accepting set is supplied by the
    /// caller.
    pub fn from_mealy<I>(mealy: &MealyMachine, finals: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<StateId>,
    {
        let source = mealy.table();
        let mut table = RecognizerTable {
            states: source.states.clone(),
            initial: source.initial.clone(),
            current: source.current.clone(),
            finals: finals.into_iter().map(Into::into).collect(),
            transitions: OrderedMap::new(),
            deterministic: true,
        };
        for ((from, on), (to, _output)) in &source.transitions {
            table.insert_transition(from.clone(), Some(on.clone()), to.clone());
        }
        Self::new(table)
    }

    /// Builds a recognizer over the states and transitions of a Moore
    /// machine. The accepting set is supplied by the caller.
    pub fn from_moore<I>(moore: &MooreMachine, finals: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<StateId>,
    {
        let source = moore.table();
        let mut table = RecognizerTable {
            states: source.states.clone(),
            initial: source.initial.clone(),
            current: source.current.clone(),
            finals: finals.into_iter().map(Into::into).collect(),
            transitions: OrderedMap::new(),
            deterministic: true,
        };
        for ((from, on), to) in &source.transitions {
            table.insert_transition(from.clone(), Some(on.clone()), to.clone());
        }
        Self::new(table)
    }

    /// The machine's state table.
    pub fn table(&self) -> &RecognizerTable {
        &self.table
    }

    /// Consumes the machine, handing its table back.
    pub fn into_table(self) -> RecognizerTable {
        self.table
    }

    /// Puts the machine back into its initial state.
    pub fn reset(&mut self) {
        self.table.current = self.table.initial.clone();
    }

    /// Whether the transition relation is a function over non-ε keys.
    pub fn is_deterministic(&self) -> bool {
        self.table.deterministic
    }

    /// Whether `id` is an accepting state.
    pub fn is_final(&self, id: &str) -> bool {
        self.table.finals.contains(id)
    }

    /// Side-effect-free single step: the successor of `from` on `input`, or
    /// `None` if no transition exists. On a deterministic machine this is
    /// the unique successor; otherwise the least one is returned. The lexer
    /// drives its per-rule simulations through this, so a dead end is an
    /// ordinary `None` rather than an error.
    pub fn step(&self, from: &str, input: &str) -> Option<&StateId> {
        self.table
            .transitions
            .get(&(from.to_string(), Some(input.to_string())))
            .and_then(|targets| targets.first())
    }

    /// Feeds every symbol of `word` in order, advancing the machine, and
    /// reports whether the state reached at the end is accepting. The empty
    /// word reports acceptance of the unchanged `current`.
    pub fn run_word<I>(&mut self, word: I) -> Result<bool>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for symbol in word {
            self.handle_input(symbol.as_ref())?;
        }
        Ok(self.is_final(&self.table.current))
    }

    /// Runs the machine over `word` without observable state change: the
    /// pre-call `current` is restored on every path. Returns whether the run
    /// consumed the entire word and ended in an accepting state; any
    /// execution error yields `false`.
    pub fn recognize<I>(&mut self, word: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let saved = self.table.current.clone();
        let accepted = self.run_word(word).unwrap_or(false);
        self.table.current = saved;
        accepted
    }
}

impl StateMachine for Recognizer {
    type Output = bool;
    type Translation = StateId;

    fn translate(&self, input: &str) -> Result<Self::Translation> {
        self.table
            .transitions
            .get(&(self.table.current.clone(), Some(input.to_string())))
            .and_then(|targets| targets.first())
            .cloned()
            .ok_or_else(|| FsmError::UndefinedTransition {
                state: self.table.current.clone(),
                input: input.to_string(),
            })
    }

    fn output_from(&self, next: &Self::Translation) -> Result<bool> {
        Ok(self.is_final(next))
    }

    fn advance(&mut self, next: Self::Translation) {
        self.table.current = next;
    }
}

impl MinimizationOracle for Recognizer {
    type Input = Symbol;

    fn state_ids(&self) -> Vec<StateId> {
        self.table.states.iter().cloned().collect()
    }

    fn inputs(&self) -> Vec<Symbol> {
        self.table.alphabet()
    }

    fn successor(&self, id: &StateId, input: &Symbol) -> Option<StateId> {
        self.table
            .transitions
            .get(&(id.clone(), Some(input.clone())))
            .and_then(|targets| targets.first())
            .cloned()
    }

    fn zero_equivalent(&self, left: &StateId, right: &StateId) -> bool {
        self.is_final(left) == self.is_final(right)
    }

    fn from_partition(&self, partition: &Partition<StateId>) -> Self {
        let mut rename = OrderedMap::new();
        let mut minimal = RecognizerTable {
            deterministic: true,
            ..RecognizerTable::default()
        };

        for (index, block) in partition.iter().enumerate() {
            let new_id = format!("s{index}");
            minimal.states.insert(new_id.clone());
            for old_id in block {
                rename.insert(old_id.clone(), new_id.clone());
            }
        }

        minimal.initial = rename[&self.table.initial].clone();
        minimal.current = minimal.initial.clone();

        let inputs = self.inputs();
        for (index, block) in partition.iter().enumerate() {
            let new_id = format!("s{index}");
            let representative = block.first().expect("partition blocks are never empty");

            if self.is_final(representative) {
                minimal.finals.insert(new_id.clone());
            }

            for input in &inputs {
                if let Some(next) = self.successor(representative, input) {
                    minimal.insert_transition(
                        new_id.clone(),
                        Some(input.clone()),
                        rename[&next].clone(),
                    );
                }
            }
        }

        Self::new(minimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{MealyTable, MooreTable};

    fn toggle() -> Recognizer {
        Recognizer::new(
            RecognizerTable::new("q0")
                .with_transition("q0", "a", "q1")
                .with_transition("q1", "b", "q0")
                .with_final("q1")
                .deterministic(),
        )
    }

    #[test]
    fn acceptance_follows_final_states() {
        let mut machine = toggle();
        assert!(machine.handle_input("a").unwrap());
        assert!(!machine.handle_input("b").unwrap());
    }

    #[test]
    fn recognize_restores_current_on_every_path() {
        let mut machine = toggle();
        assert!(machine.recognize(["a"]));
        assert_eq!(machine.table().current, "q0");

        // dead end mid-word: swallowed, reported as rejection
        assert!(!machine.recognize(["a", "a"]));
        assert_eq!(machine.table().current, "q0");

        // empty word: acceptance of the unchanged current state
        assert!(!machine.recognize(Vec::<&str>::new()));
    }

    #[test]
    fn step_is_side_effect_free() {
        let machine = toggle();
        assert_eq!(machine.step("q0", "a").map(String::as_str), Some("q1"));
        assert_eq!(machine.step("q0", "b"), None);
        assert_eq!(machine.table().current, "q0");
    }

    #[test]
    fn conversion_from_mealy_drops_outputs() {
        let mealy = MealyMachine::new(
            MealyTable::new("q0")
                .with_transition("q0", "a", "q1", "out")
                .with_transition("q1", "b", "q0", "out"),
        );
        let mut recognizer = Recognizer::from_mealy(&mealy, ["q1"]);

        assert!(recognizer.is_deterministic());
        assert!(recognizer.recognize(["a"]));
        assert!(!recognizer.recognize(["a", "b"]));
    }

    #[test]
    fn conversion_from_moore_keeps_structure() {
        let moore = MooreMachine::new(
            MooreTable::new("q0")
                .with_output("q0", "A")
                .with_output("q1", "B")
                .with_transition("q0", "a", "q1")
                .with_transition("q1", "b", "q0"),
        );
        let mut recognizer = Recognizer::from_moore(&moore, ["q1"]);

        assert!(recognizer.recognize(["a"]));
        assert!(recognizer.recognize(["a", "b", "a"]));
        assert!(!recognizer.recognize(["b"]));
    }
}
