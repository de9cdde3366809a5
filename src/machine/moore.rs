use itertools::Itertools;

use crate::error::{FsmError, Result};
use crate::machine::{Output, StateId, StateMachine, Symbol};
use crate::math::{OrderedMap, OrderedSet, Partition};
use crate::minimization::MinimizationOracle;

/// State table of a Moore machine: outputs are attached to states through a
/// separate output map, which is consulted lazily during execution. A table
/// whose output map does not cover every reachable state is representable;
/// the gap only surfaces once execution traverses the uncovered state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MooreTable {
    /// All state ids of the machine.
    pub states: OrderedSet<StateId>,
    /// The designated initial state.
    pub initial: StateId,
    /// The state the machine is currently in.
    pub current: StateId,
    /// `(state, input) → next state`.
    pub transitions: OrderedMap<(StateId, Symbol), StateId>,
    /// `state → output`.
    pub outputs: OrderedMap<StateId, Output>,
}

impl MooreTable {
    /// Creates a table containing only the given initial state.
    pub fn new(initial: impl Into<StateId>) -> Self {
        let initial = initial.into();
        Self {
            states: OrderedSet::from([initial.clone()]),
            current: initial.clone(),
            initial,
            transitions: OrderedMap::new(),
            outputs: OrderedMap::new(),
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
        self.insert_transition(from, on, to);
        self
    }

    /// Records `output` for `state`, creating the state as needed.
    pub fn with_output(mut self, state: impl Into<StateId>, output: impl Into<Output>) -> Self {
        let state = state.into();
        self.states.insert(state.clone());
        self.outputs.insert(state, output.into());
        self
    }

    /// In-place variant of [`Self::with_transition`].
    pub fn insert_transition(
        &mut self,
        from: impl Into<StateId>,
        on: impl Into<Symbol>,
        to: impl Into<StateId>,
    ) {
        let (from, to) = (from.into(), to.into());
        self.states.insert(from.clone());
        self.states.insert(to.clone());
        self.transitions.insert((from, on.into()), to);
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

/// A Moore machine produces the output attached to the state a transition
/// leads into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MooreMachine {
    table: MooreTable,
}

impl MooreMachine {
    /// Creates a machine that takes ownership of the given table.
    pub fn new(table: MooreTable) -> Self {
        Self { table }
    }

    /// The machine's state table.
    pub fn table(&self) -> &MooreTable {
        &self.table
    }

    /// Consumes the machine, handing its table back.
    pub fn into_table(self) -> MooreTable {
        self.table
    }

    /// Puts the machine back into its initial state.
    pub fn reset(&mut self) {
        self.table.current = self.table.initial.clone();
    }

    /// The output of the state the machine currently sits in, if defined.
    pub fn current_output(&self) -> Option<&Output> {
        self.table.outputs.get(&self.table.current)
    }
}

impl StateMachine for MooreMachine {
    type Output = Output;
    type Translation = StateId;

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

    fn output_from(&self, next: &Self::Translation) -> Result<Output> {
        self.table
            .outputs
            .get(next)
            .cloned()
            .ok_or_else(|| FsmError::UndefinedOutput {
                state: next.clone(),
            })
    }

    fn advance(&mut self, next: Self::Translation) {
        self.table.current = next;
    }
}

impl MinimizationOracle for MooreMachine {
    type Input = Symbol;

    fn state_ids(&self) -> Vec<StateId> {
        self.table.states.iter().cloned().collect()
    }

    fn inputs(&self) -> Vec<Symbol> {
        self.table.inputs()
    }

    fn successor(&self, id: &StateId, input: &Symbol) -> Option<StateId> {
        self.table.transitions.get(&(id.clone(), input.clone())).cloned()
    }

    fn zero_equivalent(&self, left: &StateId, right: &StateId) -> bool {
        self.table.outputs.get(left) == self.table.outputs.get(right)
    }

    fn from_partition(&self, partition: &Partition<StateId>) -> Self {
        let mut rename = OrderedMap::new();
        let mut minimal = MooreTable::default();

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

            if let Some(output) = self.table.outputs.get(representative) {
                minimal.outputs.insert(new_id.clone(), output.clone());
            }

            for input in &inputs {
                if let Some(to) = self
                    .table
                    .transitions
                    .get(&(representative.clone(), input.clone()))
                {
                    minimal
                        .transitions
                        .insert((new_id.clone(), input.clone()), rename[to].clone());
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

    fn two_state_machine() -> MooreMachine {
        MooreMachine::new(
            MooreTable::new("s0")
                .with_output("s0", "A")
                .with_output("s1", "B")
                .with_transition("s0", "1", "s1")
                .with_transition("s1", "2", "s0"),
        )
    }

    #[test]
    fn outputs_read_off_target_states() {
        let mut machine = two_state_machine();
        assert_eq!(machine.handle_input("1").unwrap(), "B");
        assert_eq!(machine.handle_input("2").unwrap(), "A");
        assert!(machine.handle_input("2").is_err());
    }

    #[test]
    fn missing_output_surfaces_on_first_traversal() {
        let mut machine = MooreMachine::new(
            MooreTable::new("s0")
                .with_output("s0", "A")
                .with_transition("s0", "x", "s1")
                .with_transition("s1", "x", "s0"),
        );

        let error = machine.handle_input("x").unwrap_err();
        assert!(matches!(error, FsmError::UndefinedOutput { state } if state == "s1"));
        // the failed step must not have advanced the machine
        assert_eq!(machine.table().current, "s0");
    }

    #[test]
    fn minimization_groups_by_output_first() {
        let machine = MooreMachine::new(
            MooreTable::new("a")
                .with_output("a", "0")
                .with_output("b", "0")
                .with_output("c", "1")
                .with_transition("a", "x", "c")
                .with_transition("b", "x", "c")
                .with_transition("c", "x", "a"),
        );

        let minimal = minimize(&machine);
        assert_eq!(minimal.table().states.len(), 2);
        assert_eq!(minimal.table().initial, "s0");

        let mut original = machine.clone();
        let mut minimized = minimal;
        assert_eq!(
            original.handle_word(["x", "x", "x"]).unwrap(),
            minimized.handle_word(["x", "x", "x"]).unwrap()
        );
    }
}
