//! Conversions between the Mealy and Moore flavors.
//!
//! Both directions are functional: they build a fresh table and never touch
//! their input. Converting to a recognizer lives on
//! [`Recognizer::from_mealy`](crate::recognizer::Recognizer::from_mealy) and
//! [`from_moore`](crate::recognizer::Recognizer::from_moore); the
//! grammar-to-recognizer construction lives in [`crate::grammar`].

use crate::error::{FsmError, Result};
use crate::machine::{MealyMachine, MealyTable, MooreMachine, MooreTable, Output, StateId};
use crate::math::OrderedSet;

/// Output assigned to the synthetic initial state of a converted Moore
/// machine. It is emitted before the first real output, so for any word the
/// Moore output sequence is this marker followed by the Mealy outputs.
pub const INITIAL_OUTPUT: &str = "INITIAL";

fn paired_state_name(state: &StateId, output: &Output) -> StateId {
    format!("{state} | {output}")
}

/// Converts a Mealy machine into a Moore machine with identical I/O behavior
/// modulo the leading [`INITIAL_OUTPUT`].
///
/// Every `(next state, output)` pair appearing as a transition target becomes
/// one Moore state carrying that output; a fresh `"<initial>_start"` state
/// fronts the machine.
pub fn mealy_to_moore(mealy: &MealyMachine) -> MooreMachine {
    let source = mealy.table();

    let target_pairs: OrderedSet<&(StateId, Output)> = source.transitions.values().collect();

    let start_name = format!("{}_start", source.initial);
    let mut moore = MooreTable::new(start_name.clone()).with_output(&start_name, INITIAL_OUTPUT);

    for (state, output) in &target_pairs {
        let name = paired_state_name(state, output);
        moore.states.insert(name.clone());
        moore.outputs.insert(name, output.clone());
    }

    // transitions leaving the Mealy initial state depart from the fresh
    // start state instead
    for ((from, input), (to, output)) in &source.transitions {
        if *from == source.initial {
            moore.insert_transition(
                start_name.clone(),
                input.clone(),
                paired_state_name(to, output),
            );
        }
    }

    // every created pair state inherits the transitions of its Mealy state
    for (pair_state, pair_output) in &target_pairs {
        let moore_from = paired_state_name(pair_state, pair_output);
        for ((from, input), (to, output)) in &source.transitions {
            if from == pair_state {
                moore.insert_transition(
                    moore_from.clone(),
                    input.clone(),
                    paired_state_name(to, output),
                );
            }
        }
    }

    MooreMachine::new(moore)
}

/// Converts a Moore machine into a Mealy machine with identical I/O behavior.
///
/// Every Moore transition `(s, a) → s'` becomes the Mealy transition
/// `(s, a) → (s', λ(s'))`. Fails with
/// [`FsmError::InconsistentMachine`] if a target state has no output.
pub fn moore_to_mealy(moore: &MooreMachine) -> Result<MealyMachine> {
    let source = moore.table();

    let mut mealy = MealyTable {
        states: source.states.clone(),
        initial: source.initial.clone(),
        current: source.initial.clone(),
        transitions: Default::default(),
    };

    for ((from, input), to) in &source.transitions {
        let output = source
            .outputs
            .get(to)
            .ok_or_else(|| FsmError::InconsistentMachine {
                reason: format!("no output defined for target state `{to}`"),
            })?;
        mealy.transitions.insert(
            (from.clone(), input.clone()),
            (to.clone(), output.clone()),
        );
    }

    Ok(MealyMachine::new(mealy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::StateMachine;

    fn sample_mealy() -> MealyMachine {
        MealyMachine::new(
            MealyTable::new("s0")
                .with_transition("s0", "x", "s1", "a")
                .with_transition("s0", "y", "s0", "b")
                .with_transition("s1", "x", "s0", "c")
                .with_transition("s1", "y", "s1", "a"),
        )
    }

    #[test]
    fn moore_prepends_the_initial_marker() {
        let mealy = sample_mealy();
        let moore = mealy_to_moore(&mealy);

        assert_eq!(
            moore.table().outputs[&moore.table().initial],
            INITIAL_OUTPUT
        );

        let word = ["x", "y", "x", "x"];
        let mut mealy_run = mealy.clone();
        let mut moore_run = moore;
        assert_eq!(
            mealy_run.handle_word(word).unwrap(),
            moore_run.handle_word(word).unwrap()
        );
    }

    #[test]
    fn round_trip_preserves_io_behavior() {
        let mealy = sample_mealy();
        let round_tripped = moore_to_mealy(&mealy_to_moore(&mealy)).unwrap();

        for word in [
            vec!["x"],
            vec!["x", "x"],
            vec!["x", "y", "y", "x"],
            vec!["y", "y", "x", "x", "y"],
        ] {
            let mut left = mealy.clone();
            let mut right = round_tripped.clone();
            assert_eq!(
                left.handle_word(word.clone()).unwrap(),
                right.handle_word(word.clone()).unwrap(),
                "word {word:?}"
            );
        }
    }

    #[test]
    fn missing_output_fails_the_conversion() {
        let moore = MooreMachine::new(
            MooreTable::new("s0")
                .with_output("s0", "A")
                .with_transition("s0", "x", "s1")
                .with_transition("s1", "x", "s0"),
        );

        assert!(matches!(
            moore_to_mealy(&moore),
            Err(FsmError::InconsistentMachine { .. })
        ));
    }
}
