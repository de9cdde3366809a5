use itertools::Itertools;

use crate::error::{FsmError, Result};
use crate::machine::{Output, StateId, StateMachine, Symbol};
use crate::math::{OrderedMap, OrderedSet, Partition};
use crate::minimization::MinimizationOracle;

/// State table of a Mealy machine: outputs are attached to transitions, so
/// the transition map carries `(next state, output)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MealyTable {
    /// All state ids of the machine.
    pub states: OrderedSet<StateId>,
    /// The designated initial state.
    pub initial: StateId,
    /// The state the machine is currently in.
    pub current: StateId,
    /// `(state, input) → (next state, output)`.
    pub transitions: OrderedMap<(StateId, Symbol), (StateId, Output)>,
}

impl MealyTable {
    /// Creates a table containing only the given initial state.
    pub fn new(initial: impl Into<StateId>) -> Self {
        let initial = initial.into();
        Self {
            states: OrderedSet::from([initial.clone()]),
            current: initial.clone(),
            initial,
            transitions: OrderedMap::new(),
        }
    }

    /// Adds a transition `(from, on) → (to, output)`, creating the involved
    /// states as needed. Consumes and returns `self` so tables can be built
    /// up in a chain.
    pub fn with_transition(
        mut self,
        from: impl Into<StateId>,
        on: impl Into<Symbol>,
        to: impl Into<StateId>,
        output: impl Into<Output>,
    ) -> Self {
        self.insert_transition(from, on, to, output);
        self
    }

    /// In-place variant of [`Self::with_transition`].
    pub fn insert_transition(
        &mut self,
        from: impl Into<StateId>,
        on: impl Into<Symbol>,
        to: impl Into<StateId>,
        output: impl Into<Output>,
    ) {
        let (from, to) = (from.into(), to.into());
        self.states.insert(from.clone());
        self.states.insert(to.clone());
        self.transitions
            .insert((from, on.into()), (to, output.into()));
    }

    /// All distinct input symbols appearing in the transition map, sorted.
    pub fn inputs(&self) -> Vec<Symbol> {
        self.transitions
            .keys()
            .map(|(_, input)| input.clone())
            .unique()
            .sorted()
            .collect()
    }
}

/// A Mealy machine produces one output per processed input, read off the
/// transition that is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealyMachine {
    table: MealyTable,
}

impl MealyMachine {
    /// Creates a machine that takes ownership of the given table.
    pub fn new(table: MealyTable) -> Self {
        Self { table }
    }

    /// The machine's state table.
    pub fn table(&self) -> &MealyTable {
        &self.table
    }

    /// Consumes the machine, handing its table back.
    pub fn into_table(self) -> MealyTable {
        self.table
    }

    /// Puts the machine back into its initial state.
    pub fn reset(&mut self) {
        self.table.current = self.table.initial.clone();
    }
}

impl StateMachine for MealyMachine {
    type Output = Output;
    type Translation = (StateId, Output);

    fn translate(&self, input: &str) -> Result<Self::Translation> {
        self.table
            .transitions
            .get(&(self.table.current.clone(), input.to_string()))
            .cloned()
            .ok_or_else(|| FsmError::UndefinedTransition {
                state: self.table.current.clone(),
                input: input.to_string(),
            })
    }

    fn output_from(&self, (_, output): &Self::Translation) -> Result<Output> {
        Ok(output.clone())
    }

    fn advance(&mut self, (next, _): Self::Translation) {
        self.table.current = next;
    }
}

impl MinimizationOracle for MealyMachine {
    type Input = Symbol;

    fn state_ids(&self) -> Vec<StateId> {
        self.table.states.iter().cloned().collect()
    }

    fn inputs(&self) -> Vec<Symbol> {
        self.table.inputs()
    }

    fn successor(&self, id: &StateId, input: &Symbol) -> Option<StateId> {
        self.table
            .transitions
            .get(&(id.clone(), input.clone()))
            .map(|(to, _)| to.clone())
    }

    fn zero_equivalent(&self, left: &StateId, right: &StateId) -> bool {
        // Two states are 0-equivalent iff they emit the same output for every
        // input; a transition missing on both sides counts as agreement.
        self.inputs().iter().all(|input| {
            let emitted = |id: &StateId| {
                self.table
                    .transitions
                    .get(&(id.clone(), input.clone()))
                    .map(|(_, output)| output)
            };
            emitted(left) == emitted(right)
        })
    }

    fn from_partition(&self, partition: &Partition<StateId>) -> Self {
        let mut rename = OrderedMap::new();
        let mut minimal = MealyTable::default();

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

            for input in &inputs {
                if let Some((to, output)) = self
                    .table
                    .transitions
                    .get(&(representative.clone(), input.clone()))
                {
                    minimal.transitions.insert(
                        (new_id.clone(), input.clone()),
                        (rename[to].clone(), output.clone()),
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
    use crate::minimization::minimize;

    fn two_state_machine() -> MealyMachine {
        MealyMachine::new(
            MealyTable::new("s0")
                .with_transition("s0", "x1", "s1", "a")
                .with_transition("s1", "x2", "s0", "b"),
        )
    }

    #[test]
    fn outputs_follow_transitions() {
        let mut machine = two_state_machine();
        assert_eq!(machine.handle_input("x1").unwrap(), "a");
        assert_eq!(machine.handle_input("x2").unwrap(), "b");

        let error = machine.handle_input("x2").unwrap_err();
        assert!(matches!(
            error,
            FsmError::UndefinedTransition { state, input } if state == "s0" && input == "x2"
        ));
    }

    #[test]
    fn failed_lookup_leaves_current_untouched() {
        let mut machine = two_state_machine();
        assert!(machine.handle_input("nope").is_err());
        assert_eq!(machine.table().current, "s0");
    }

    #[test]
    fn handle_word_collects_outputs() {
        let mut machine = two_state_machine();
        assert_eq!(
            machine.handle_word(["x1", "x2", "x1"]).unwrap(),
            vec!["a", "b", "a"]
        );
    }

    #[test]
    fn minimization_merges_equivalent_states() {
        // s1 and s2 behave identically, s0 is only distinguished by being
        // the target of nothing relevant; everything collapses to one state.
        let machine = MealyMachine::new(
            MealyTable::new("s0")
                .with_transition("s0", "a", "s1", "0")
                .with_transition("s0", "b", "s0", "1")
                .with_transition("s1", "a", "s2", "0")
                .with_transition("s1", "b", "s0", "1")
                .with_transition("s2", "a", "s1", "0")
                .with_transition("s2", "b", "s0", "1"),
        );

        let minimal = minimize(&machine);
        assert_eq!(minimal.table().states.len(), 1);

        let mut original = machine.clone();
        let mut minimized = minimal;
        assert_eq!(
            original.handle_word(["a", "a", "b", "a"]).unwrap(),
            minimized.handle_word(["a", "a", "b", "a"]).unwrap()
        );
    }
}
